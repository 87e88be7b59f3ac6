use async_trait::async_trait;

use crate::framework::core::{ChannelError, NetworkEventStream, ResponseBody};

pub mod cdp;

pub use cdp::CdpChannel;

/// Method names used on the debugging channel.
pub mod methods {
    pub const REQUEST_WILL_BE_SENT: &str = "Network.requestWillBeSent";
    pub const RESPONSE_RECEIVED: &str = "Network.responseReceived";
    pub const LOADING_FINISHED: &str = "Network.loadingFinished";
    pub const ENABLE: &str = "Network.enable";
    pub const DISABLE: &str = "Network.disable";
    pub const GET_RESPONSE_BODY: &str = "Network.getResponseBody";
}

/// Host-provided interface for observing network activity of a browser view.
///
/// The channel owns the wire protocol; consumers only see decoded lifecycle
/// notifications and the body-fetch operation.
#[async_trait]
pub trait DebugChannel: Send + Sync {
    /// Start delivery of network lifecycle notifications.
    async fn enable(&self) -> Result<(), ChannelError>;

    /// Stop delivery of network lifecycle notifications.
    async fn disable(&self) -> Result<(), ChannelError>;

    /// Hand over the stream of lifecycle notifications. Callable once per
    /// channel; a second call fails with `AlreadySubscribed`.
    fn subscribe(&mut self) -> Result<NetworkEventStream, ChannelError>;

    /// Fetch the full response body for a finished request.
    async fn fetch_response_body(&self, request_id: &str) -> Result<ResponseBody, ChannelError>;
}
