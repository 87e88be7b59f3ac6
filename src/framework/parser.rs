use serde_json::Value;
use std::collections::HashMap;
use url::form_urlencoded;

use crate::framework::core::{DecodedPayload, ParseError, ResponseBody};

/// Strip the configured data prefix and parse the remainder as JSON.
/// A body without the prefix is parsed as-is.
pub fn parse_api_body(data_prefix: &str, raw: &str) -> Result<Value, ParseError> {
    let trimmed = raw.strip_prefix(data_prefix).unwrap_or(raw);
    serde_json::from_str(trimmed).map_err(|e| ParseError::Json(e.to_string()))
}

/// Decode a form-encoded POST body into key/value pairs. Repeated keys keep
/// the last value.
pub fn parse_post_body(raw: &str) -> Result<HashMap<String, String>, ParseError> {
    Ok(form_urlencoded::parse(raw.as_bytes()).into_owned().collect())
}

/// Decode a fetched body into a handler payload. Each side is captured as
/// success-or-failure; an absent input is a `MissingBody` failure value.
pub fn decode(
    data_prefix: &str,
    fetched: ResponseBody,
    request: Value,
    response: Value,
) -> DecodedPayload {
    let body = match fetched.body.as_deref() {
        Some(raw) => parse_api_body(data_prefix, raw),
        None => Err(ParseError::MissingBody),
    };
    let post_body = match fetched.post_data.as_deref() {
        Some(raw) => parse_post_body(raw),
        None => Err(ParseError::MissingBody),
    };
    DecodedPayload {
        body,
        post_body,
        request,
        response,
    }
}
