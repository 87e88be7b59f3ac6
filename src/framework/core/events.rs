use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::HashMap;

use super::error::ParseError;
use crate::framework::channel::methods;

/// One of the three network lifecycle notifications delivered by the
/// debugging channel for a single request, keyed by its opaque request ID.
#[derive(Debug, Clone, PartialEq)]
pub enum NetworkEvent {
    RequestWillBeSent {
        request_id: String,
        url: String,
        request: Value,
    },
    ResponseReceived {
        request_id: String,
        url: String,
        response: Value,
    },
    LoadingFinished {
        request_id: String,
    },
}

impl NetworkEvent {
    /// Decode a raw `(method, params)` notification from the channel.
    /// Methods other than the three lifecycle notifications map to `None`.
    pub fn from_wire(method: &str, params: &Value) -> Option<Self> {
        let request_id = params.get("requestId")?.as_str()?.to_string();
        match method {
            methods::REQUEST_WILL_BE_SENT => {
                let request = params.get("request").cloned().unwrap_or(Value::Null);
                let url = request
                    .get("url")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                Some(NetworkEvent::RequestWillBeSent {
                    request_id,
                    url,
                    request,
                })
            }
            methods::RESPONSE_RECEIVED => {
                let response = params.get("response").cloned().unwrap_or(Value::Null);
                let url = response
                    .get("url")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                Some(NetworkEvent::ResponseReceived {
                    request_id,
                    url,
                    response,
                })
            }
            methods::LOADING_FINISHED => Some(NetworkEvent::LoadingFinished { request_id }),
            _ => None,
        }
    }

    /// The opaque request ID this notification belongs to.
    #[allow(dead_code)]
    pub fn request_id(&self) -> &str {
        match self {
            NetworkEvent::RequestWillBeSent { request_id, .. }
            | NetworkEvent::ResponseReceived { request_id, .. }
            | NetworkEvent::LoadingFinished { request_id } => request_id,
        }
    }
}

/// A fully correlated request, removed from the pending table and ready for
/// its body fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletedRequest {
    pub request_id: String,
    /// Request path with the configured URL prefix stripped.
    pub path: String,
    pub request: Value,
    pub response: Value,
    /// When the requestWillBeSent notification for this ID arrived.
    pub first_seen: DateTime<Utc>,
}

impl CompletedRequest {
    /// Milliseconds between first sighting and now.
    pub fn age_ms(&self) -> i64 {
        (Utc::now() - self.first_seen).num_milliseconds()
    }
}

/// Result of the channel's body-fetch operation for a finished request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponseBody {
    pub body: Option<String>,
    pub post_data: Option<String>,
}

/// What a registered handler receives. Both parse results are captured as
/// values so a malformed body still reaches the handler.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedPayload {
    pub body: Result<Value, ParseError>,
    pub post_body: Result<HashMap<String, String>, ParseError>,
    pub request: Value,
    pub response: Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_will_be_sent_from_wire() {
        let params = json!({
            "requestId": "123.4",
            "request": { "url": "http://example.net/kcsapi/api_start2", "method": "POST" }
        });
        let event = NetworkEvent::from_wire(methods::REQUEST_WILL_BE_SENT, &params).unwrap();
        match event {
            NetworkEvent::RequestWillBeSent {
                request_id,
                url,
                request,
            } => {
                assert_eq!(request_id, "123.4");
                assert_eq!(url, "http://example.net/kcsapi/api_start2");
                assert_eq!(request.get("method"), Some(&json!("POST")));
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_response_received_from_wire() {
        let params = json!({
            "requestId": "123.4",
            "response": { "url": "http://example.net/kcsapi/api_start2", "status": 200 }
        });
        let event = NetworkEvent::from_wire(methods::RESPONSE_RECEIVED, &params).unwrap();
        match event {
            NetworkEvent::ResponseReceived { url, response, .. } => {
                assert_eq!(url, "http://example.net/kcsapi/api_start2");
                assert_eq!(response.get("status"), Some(&json!(200)));
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_loading_finished_from_wire() {
        let params = json!({ "requestId": "123.4" });
        let event = NetworkEvent::from_wire(methods::LOADING_FINISHED, &params).unwrap();
        assert_eq!(event.request_id(), "123.4");
    }

    #[test]
    fn test_unknown_method_is_ignored() {
        let params = json!({ "requestId": "123.4" });
        assert!(NetworkEvent::from_wire("Network.dataReceived", &params).is_none());
    }

    #[test]
    fn test_missing_request_id_is_ignored() {
        let params = json!({ "request": { "url": "http://example.net/" } });
        assert!(NetworkEvent::from_wire(methods::REQUEST_WILL_BE_SENT, &params).is_none());
    }
}
