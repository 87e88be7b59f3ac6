use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use futures::{SinkExt, StreamExt};
use log::{debug, warn};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use uuid::Uuid;

use super::{methods, DebugChannel};
use crate::framework::core::{
    create_event_channel, receiver_to_stream, ChannelError, NetworkEvent, NetworkEventReceiver,
    NetworkEventSender, NetworkEventStream, ResponseBody,
};

type PendingCommands = Arc<Mutex<HashMap<u64, oneshot::Sender<Value>>>>;

/// Debugging channel over a Chrome DevTools Protocol WebSocket endpoint.
///
/// Outgoing commands carry a monotonically increasing ID; replies are matched
/// back to their callers through a pending-command map. Incoming frames
/// without an ID are protocol notifications; the three network lifecycle
/// methods are decoded and forwarded, everything else is dropped.
pub struct CdpChannel {
    id: String,
    next_command_id: AtomicU64,
    commands: mpsc::UnboundedSender<Message>,
    pending: PendingCommands,
    events: Option<NetworkEventReceiver>,
}

impl CdpChannel {
    /// Connect to a DevTools WebSocket endpoint and start the I/O loops.
    /// A failed connect is the attach failure of this channel; callers log it
    /// and degrade, there is no retry here.
    pub async fn connect(endpoint: &str) -> Result<Self, ChannelError> {
        let (socket, _) = connect_async(endpoint)
            .await
            .map_err(|e| ChannelError::ConnectFailed(format!("{}: {}", endpoint, e)))?;
        let (mut writer, mut reader) = socket.split();

        let (command_tx, mut command_rx) = mpsc::unbounded_channel::<Message>();
        let (event_tx, event_rx) = create_event_channel();
        let pending: PendingCommands = Arc::new(Mutex::new(HashMap::new()));
        let channel_id = Uuid::new_v4().to_string();

        let writer_pending = Arc::clone(&pending);
        tokio::spawn(async move {
            while let Some(message) = command_rx.recv().await {
                if let Err(e) = writer.send(message).await {
                    warn!("cdp write failed: {}", e);
                    break;
                }
            }
            // A command written into a dead socket gets no reply; dropping
            // its sender resolves the waiter with ChannelClosed.
            writer_pending.lock().await.clear();
        });

        let reader_pending = Arc::clone(&pending);
        let reader_id = channel_id.clone();
        tokio::spawn(async move {
            while let Some(message) = reader.next().await {
                match message {
                    Ok(Message::Text(text)) => {
                        Self::dispatch_frame(&reader_id, &text, &reader_pending, &event_tx).await;
                    }
                    Ok(Message::Close(_)) => {
                        debug!("[{}] cdp endpoint closed the connection", reader_id);
                        break;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!("[{}] cdp read failed: {}", reader_id, e);
                        break;
                    }
                }
            }
            // Dropping event_tx ends the subscriber's stream, and draining
            // the pending map fails every command still waiting for a reply.
            reader_pending.lock().await.clear();
        });

        Ok(Self {
            id: channel_id,
            next_command_id: AtomicU64::new(1),
            commands: command_tx,
            pending,
            events: Some(event_rx),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Route one incoming frame: command replies to their waiting callers,
    /// lifecycle notifications into the event channel.
    async fn dispatch_frame(
        channel_id: &str,
        text: &str,
        pending: &PendingCommands,
        events: &NetworkEventSender,
    ) {
        let frame: Value = match serde_json::from_str(text) {
            Ok(frame) => frame,
            Err(e) => {
                debug!("[{}] unparseable cdp frame: {}", channel_id, e);
                return;
            }
        };

        if let Some(id) = frame.get("id").and_then(Value::as_u64) {
            match pending.lock().await.remove(&id) {
                Some(reply_tx) => {
                    let _ = reply_tx.send(frame);
                }
                None => debug!("[{}] reply for unknown command id {}", channel_id, id),
            }
            return;
        }

        let method = frame.get("method").and_then(Value::as_str).unwrap_or_default();
        let params = frame.get("params").cloned().unwrap_or(Value::Null);
        if let Some(event) = NetworkEvent::from_wire(method, &params) {
            let _ = events.send(event);
        }
    }

    async fn send_command(&self, method: &str, params: Value) -> Result<Value, ChannelError> {
        let id = self.next_command_id.fetch_add(1, Ordering::Relaxed);
        let (reply_tx, reply_rx) = oneshot::channel();
        self.pending.lock().await.insert(id, reply_tx);

        let frame = json!({ "id": id, "method": method, "params": params });
        if self.commands.send(Message::Text(frame.to_string())).is_err() {
            self.pending.lock().await.remove(&id);
            return Err(ChannelError::ChannelClosed);
        }

        let reply = reply_rx.await.map_err(|_| ChannelError::ChannelClosed)?;
        if let Some(error) = reply.get("error") {
            let message = error
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown error")
                .to_string();
            return Err(ChannelError::CommandFailed {
                method: method.to_string(),
                message,
            });
        }
        Ok(reply.get("result").cloned().unwrap_or(Value::Null))
    }

    /// Decode a `Network.getResponseBody` result into a `ResponseBody`.
    fn decode_body_result(result: &Value) -> Result<ResponseBody, ChannelError> {
        let base64_encoded = result
            .get("base64Encoded")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let body = match result.get("body").and_then(Value::as_str) {
            Some(text) if base64_encoded => match STANDARD.decode(text) {
                Ok(bytes) => Some(String::from_utf8_lossy(&bytes).into_owned()),
                Err(e) => {
                    return Err(ChannelError::Protocol(format!("invalid base64 body: {}", e)))
                }
            },
            Some(text) => Some(text.to_string()),
            None => None,
        };
        let post_data = result
            .get("postData")
            .and_then(Value::as_str)
            .map(str::to_string);
        Ok(ResponseBody { body, post_data })
    }
}

#[async_trait]
impl DebugChannel for CdpChannel {
    async fn enable(&self) -> Result<(), ChannelError> {
        self.send_command(methods::ENABLE, json!({})).await.map(|_| ())
    }

    async fn disable(&self) -> Result<(), ChannelError> {
        self.send_command(methods::DISABLE, json!({})).await.map(|_| ())
    }

    fn subscribe(&mut self) -> Result<NetworkEventStream, ChannelError> {
        self.events
            .take()
            .map(receiver_to_stream)
            .ok_or(ChannelError::AlreadySubscribed)
    }

    async fn fetch_response_body(&self, request_id: &str) -> Result<ResponseBody, ChannelError> {
        let result = self
            .send_command(methods::GET_RESPONSE_BODY, json!({ "requestId": request_id }))
            .await?;
        Self::decode_body_result(&result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_dispatch_frame_routes_command_replies() {
        let pending: PendingCommands = Arc::new(Mutex::new(HashMap::new()));
        let (event_tx, mut event_rx) = create_event_channel();
        let (reply_tx, reply_rx) = oneshot::channel();
        pending.lock().await.insert(7, reply_tx);

        CdpChannel::dispatch_frame(
            "test",
            r#"{"id":7,"result":{"body":"svdata={}","base64Encoded":false}}"#,
            &pending,
            &event_tx,
        )
        .await;

        let reply = reply_rx.await.unwrap();
        assert_eq!(
            reply.get("result").and_then(|r| r.get("body")),
            Some(&json!("svdata={}"))
        );
        assert!(pending.lock().await.is_empty());
        assert!(event_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_dispatch_frame_routes_lifecycle_notifications() {
        let pending: PendingCommands = Arc::new(Mutex::new(HashMap::new()));
        let (event_tx, mut event_rx) = create_event_channel();

        CdpChannel::dispatch_frame(
            "test",
            r#"{"method":"Network.loadingFinished","params":{"requestId":"9.1"}}"#,
            &pending,
            &event_tx,
        )
        .await;

        let event = event_rx.try_recv().unwrap();
        assert_eq!(event.request_id(), "9.1");
    }

    #[tokio::test]
    async fn test_dispatch_frame_drops_unknown_methods() {
        let pending: PendingCommands = Arc::new(Mutex::new(HashMap::new()));
        let (event_tx, mut event_rx) = create_event_channel();

        CdpChannel::dispatch_frame(
            "test",
            r#"{"method":"Page.loadEventFired","params":{"timestamp":1.0}}"#,
            &pending,
            &event_tx,
        )
        .await;
        CdpChannel::dispatch_frame("test", "not json at all", &pending, &event_tx).await;

        assert!(event_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_in_flight_command_fails_when_endpoint_disconnects() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        // Accept the handshake, swallow one command, then drop the
        // connection without ever replying.
        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut socket = tokio_tungstenite::accept_async(stream).await.unwrap();
            let _ = socket.next().await;
        });

        let channel = CdpChannel::connect(&format!("ws://{}", addr))
            .await
            .unwrap();
        let result = tokio::time::timeout(
            std::time::Duration::from_secs(5),
            channel.fetch_response_body("id1"),
        )
        .await
        .expect("fetch must resolve once the endpoint disconnects");

        assert!(matches!(result, Err(ChannelError::ChannelClosed)));
        server.await.unwrap();
    }

    #[test]
    fn test_decode_body_result_plain_text() {
        let result = json!({ "body": "svdata={\"api_result\":1}", "base64Encoded": false });
        let body = CdpChannel::decode_body_result(&result).unwrap();
        assert_eq!(body.body.as_deref(), Some("svdata={\"api_result\":1}"));
        assert_eq!(body.post_data, None);
    }

    #[test]
    fn test_decode_body_result_base64() {
        let encoded = STANDARD.encode("svdata={\"api_result\":1}");
        let result = json!({ "body": encoded, "base64Encoded": true });
        let body = CdpChannel::decode_body_result(&result).unwrap();
        assert_eq!(body.body.as_deref(), Some("svdata={\"api_result\":1}"));
    }

    #[test]
    fn test_decode_body_result_invalid_base64() {
        let result = json!({ "body": "%%%not-base64%%%", "base64Encoded": true });
        assert!(CdpChannel::decode_body_result(&result).is_err());
    }
}
