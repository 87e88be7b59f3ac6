use futures::stream::Stream;
use std::pin::Pin;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

use super::events::NetworkEvent;

/// Type alias for streams of network lifecycle notifications.
pub type NetworkEventStream = Pin<Box<dyn Stream<Item = NetworkEvent> + Send>>;
pub type NetworkEventSender = mpsc::UnboundedSender<NetworkEvent>;
pub type NetworkEventReceiver = mpsc::UnboundedReceiver<NetworkEvent>;

pub fn create_event_channel() -> (NetworkEventSender, NetworkEventReceiver) {
    mpsc::unbounded_channel()
}

pub fn receiver_to_stream(receiver: NetworkEventReceiver) -> NetworkEventStream {
    Box::pin(UnboundedReceiverStream::new(receiver))
}
