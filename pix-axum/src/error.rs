use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use pix_core::errors::PixError;

#[derive(Debug)]
pub struct PixAxumError(pub anyhow::Error);

impl From<anyhow::Error> for PixAxumError {
    fn from(e: anyhow::Error) -> Self {
        Self(e)
    }
}

impl From<PixError> for PixAxumError {
    fn from(e: PixError) -> Self {
        Self(e.into_anyhow())
    }
}

impl IntoResponse for PixAxumError {
    fn into_response(self) -> Response {
        // A PixError anywhere in the chain keeps its own status and shape
        if let Some(pix) = PixError::from_anyhow(&self.0) {
            let status = StatusCode::from_u16(pix.code())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            return (status, Json(pix.to_json())).into_response();
        }

        // Anything else is reported as an unhandled exception
        let pix = PixError::unhandled(self.0.to_string());
        let status = StatusCode::from_u16(pix.code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(pix.to_json())).into_response()
    }
}
