pub mod config;
pub mod error;
pub mod events;
pub mod streaming;

pub use config::*;
pub use error::*;
pub use events::*;
pub use streaming::*;
