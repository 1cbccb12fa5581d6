use std::collections::HashMap;

use axum::{
    extract::{
        rejection::{BytesRejection, JsonRejection},
        DefaultBodyLimit, State,
    },
    http::{header, HeaderMap},
    response::Response,
    routing::{get, post},
    Json, Router,
};
use bytes::Bytes;
use pix_core::errors::PixError;
use serde_json::{json, Value};
use tokio::net::{TcpListener, ToSocketAddrs};
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::event::{ProxyEvent, ProxyResponse};
use crate::handler::UploadHandler;
use crate::payload::RequestPayload;
use crate::{PixAxumError, PixAxumState};

/// Header flagging a base64 body on the direct upload route.
pub const BASE64_HEADER: &str = "x-base64-encoded";

/// Largest request body buffered by either upload route. Covers a
/// gateway-sized image after base64 expansion.
pub const DEFAULT_MAX_BODY_BYTES: usize = 25 * 1024 * 1024;

pub struct AxumApp {
    pub state: PixAxumState,
    pub router: Router<()>,
}

impl Clone for AxumApp {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
            router: self.router.clone(),
        }
    }
}

impl AxumApp {
    pub fn new(handler: UploadHandler) -> Self {
        Self::with_body_limit(handler, DEFAULT_MAX_BODY_BYTES)
    }

    /// Same as [`new`](Self::new) with an explicit request body limit.
    pub fn with_body_limit(handler: UploadHandler, max_body_bytes: usize) -> Self {
        let state = PixAxumState::new(handler);
        let routes = Router::new()
            .route("/invoke", post(invoke))
            .route("/upload", post(upload))
            .route("/health", get(health))
            .with_state(state.clone());

        let router = routes.layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(DefaultBodyLimit::max(max_body_bytes)),
        );

        Self { state, router }
    }

    pub async fn listen<A>(self, addr: A) -> anyhow::Result<()>
    where
        A: ToSocketAddrs,
    {
        let listener = TcpListener::bind(addr).await?;
        info!(addr = %listener.local_addr()?, "listening");
        axum::serve(listener, self.router).await?;
        Ok(())
    }
}

pub fn axum(handler: UploadHandler) -> AxumApp {
    AxumApp::new(handler)
}

fn map_json_rejection(rejection: JsonRejection) -> PixAxumError {
    PixError::unhandled(format!("failed to parse the invocation event: {rejection}")).into()
}

/// Function-style invocation: the event goes in, the envelope comes back as JSON.
async fn invoke(
    State(state): State<PixAxumState>,
    event: Result<Json<ProxyEvent>, JsonRejection>,
) -> Result<Json<ProxyResponse>, PixAxumError> {
    let Json(event) = event.map_err(map_json_rejection)?;
    Ok(Json(state.handler.handle_event(event).await))
}

/// Direct upload: raw body in, envelope rendered as a plain HTTP response.
async fn upload(
    State(state): State<PixAxumState>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    match body {
        Ok(body) => state.handler.handle(payload_from_http(&headers, body)).await.into_http(),
        Err(rejection) => {
            let err = PixError::unhandled(format!("failed to read the request body: {rejection}"));
            error!(error = %err.message, "error processing the file");
            ProxyResponse::from_error(&err).into_http()
        }
    }
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Build a payload from a plain HTTP request.
///
/// A request without `content-length` or `transfer-encoding` carries no body
/// at all, which is different from an empty one.
pub fn payload_from_http(headers: &HeaderMap, body: Bytes) -> RequestPayload {
    let has_body = headers.contains_key(header::CONTENT_LENGTH)
        || headers.contains_key(header::TRANSFER_ENCODING);

    let is_base64 = header_is(headers, BASE64_HEADER, "true")
        || header_is(headers, "content-transfer-encoding", "base64");

    let names: HashMap<String, String> = headers
        .iter()
        .filter_map(|(k, v)| Some((k.as_str().to_string(), v.to_str().ok()?.to_string())))
        .collect();

    RequestPayload::new(has_body.then_some(body), is_base64).with_headers(&names)
}

fn header_is(headers: &HeaderMap, name: &str, expected: &str) -> bool {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.trim().eq_ignore_ascii_case(expected))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn no_length_headers_means_no_body() {
        let payload = payload_from_http(&HeaderMap::new(), Bytes::new());
        assert!(payload.body.is_none());
    }

    #[test]
    fn zero_content_length_is_an_empty_body() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from_static("0"));

        let payload = payload_from_http(&headers, Bytes::new());
        assert_eq!(payload.body.as_deref(), Some(&b""[..]));
    }

    #[test]
    fn base64_flags_and_file_name_are_read() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from_static("4"));
        headers.insert("content-transfer-encoding", HeaderValue::from_static("BASE64"));
        headers.insert("x-filename", HeaderValue::from_static("scan.png"));

        let payload = payload_from_http(&headers, Bytes::from("aGk="));
        assert!(payload.is_base64_encoded);
        assert_eq!(payload.file_name_or_default(), "scan.png");
        assert_eq!(&payload.decode().unwrap()[..], b"hi");
    }
}
