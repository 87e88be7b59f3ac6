pub mod channel;
pub mod core;
pub mod correlator;
pub mod parser;
pub mod registry;
pub mod tap;


// Re-export commonly used types for convenience
#[allow(unused_imports)]
pub use channel::{CdpChannel, DebugChannel};
#[allow(unused_imports)]
pub use self::core::{DecodedPayload, NetworkEvent, TapConfig};
#[allow(unused_imports)]
pub use correlator::RequestCorrelator;
#[allow(unused_imports)]
pub use registry::{ApiEvent, HandlerRegistry};
#[allow(unused_imports)]
pub use tap::GameTap;
