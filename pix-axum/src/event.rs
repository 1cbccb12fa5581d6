use std::collections::HashMap;

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use pix_core::errors::PixError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::payload::RequestPayload;

/// Gateway proxy event, as delivered to a function invocation.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyEvent {
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub is_base64_encoded: Option<bool>,
    #[serde(default)]
    pub headers: Option<HashMap<String, String>>,
}

impl ProxyEvent {
    /// Header map with lowercase names.
    pub fn normalized_headers(&self) -> HashMap<String, String> {
        self.headers
            .iter()
            .flatten()
            .map(|(k, v)| (k.to_ascii_lowercase(), v.clone()))
            .collect()
    }

    pub fn into_payload(self) -> RequestPayload {
        let headers = self.normalized_headers();
        RequestPayload::new(
            self.body.map(Bytes::from),
            self.is_base64_encoded.unwrap_or(false),
        )
        .with_headers(&headers)
    }
}

/// Response envelope: a status code and a JSON text body.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyResponse {
    pub status_code: u16,
    pub body: String,
}

impl ProxyResponse {
    pub fn json(status_code: u16, body: &Value) -> Self {
        Self {
            status_code,
            body: body.to_string(),
        }
    }

    pub fn from_error(err: &PixError) -> Self {
        Self::json(err.code(), &err.to_json())
    }

    /// Parse `body` back into JSON.
    pub fn body_json(&self) -> serde_json::Result<Value> {
        serde_json::from_str(&self.body)
    }

    /// Direct HTTP rendering: envelope status as the HTTP status, envelope body as the HTTP body.
    pub fn into_http(self) -> Response {
        let status = StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let mut res = (status, self.body).into_response();
        res.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        res
    }
}

/// 200 body for an accepted upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadReceipt {
    pub message: String,
    pub file_name: String,
    pub file_size: String,
}

impl UploadReceipt {
    pub const MESSAGE: &'static str = "File received successfully.";

    pub fn new<S: Into<String>>(file_name: S, size_bytes: usize) -> Self {
        Self {
            message: Self::MESSAGE.to_string(),
            file_name: file_name.into(),
            file_size: format!("{size_bytes} bytes"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn event_accepts_gateway_shape() {
        let event: ProxyEvent = serde_json::from_value(json!({
            "body": "aGk=",
            "isBase64Encoded": true,
            "headers": { "X-Filename": "pic.png", "Content-Type": "image/png" }
        }))
        .unwrap();

        let payload = event.into_payload();
        assert!(payload.is_base64_encoded);
        assert_eq!(payload.file_name.as_deref(), Some("pic.png"));
        assert_eq!(&payload.decode().unwrap()[..], b"hi");
    }

    #[test]
    fn event_fields_are_optional() {
        let event: ProxyEvent = serde_json::from_value(json!({ "headers": null })).unwrap();
        let payload = event.into_payload();

        assert!(payload.body.is_none());
        assert!(!payload.is_base64_encoded);
        assert!(payload.file_name.is_none());
    }

    #[test]
    fn receipt_serializes_camel_case() {
        let value = serde_json::to_value(UploadReceipt::new("a.png", 10)).unwrap();
        assert_eq!(
            value,
            json!({
                "message": "File received successfully.",
                "fileName": "a.png",
                "fileSize": "10 bytes"
            })
        );
    }

    #[test]
    fn response_envelope_uses_status_code_key() {
        let res = ProxyResponse::json(400, &json!({ "message": "x" }));
        let value = serde_json::to_value(&res).unwrap();
        assert_eq!(value["statusCode"], 400);
        assert_eq!(res.body_json().unwrap(), json!({ "message": "x" }));
    }
}
