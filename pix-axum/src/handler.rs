use pix_core::bail_pix;
use pix_core::errors::{PixError, PixResult};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::diagnostics::{Diagnostics, DiagnosticsReport};
use crate::event::{ProxyEvent, ProxyResponse, UploadReceipt};
use crate::payload::{PayloadError, RequestPayload};

/// Serves one upload: diagnostics first, then the primary decode path.
///
/// Diagnostics are awaited in sequence but their outcome is only logged;
/// the response depends on the payload alone.
pub struct UploadHandler {
    diagnostics: Diagnostics,
}

impl UploadHandler {
    pub fn new(diagnostics: Diagnostics) -> Self {
        Self { diagnostics }
    }

    /// Handler without any storage or environment checks.
    pub fn without_diagnostics() -> Self {
        Self::new(Diagnostics::disabled())
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub async fn handle_event(&self, event: ProxyEvent) -> ProxyResponse {
        self.handle(event.into_payload()).await
    }

    pub async fn handle(&self, payload: RequestPayload) -> ProxyResponse {
        let cancel = CancellationToken::new();
        let report = self.run_diagnostics(&cancel).await;
        if report.failures() > 0 {
            info!(failures = report.failures(), "diagnostics finished with failures");
        }

        self.respond(&payload)
    }

    /// Run the diagnostic checks on their own.
    pub async fn run_diagnostics(&self, cancel: &CancellationToken) -> DiagnosticsReport {
        self.diagnostics.run(cancel).await
    }

    /// Primary path only: validate, decode and build the envelope.
    pub fn respond(&self, payload: &RequestPayload) -> ProxyResponse {
        match accept_upload(payload) {
            Ok(receipt) => ProxyResponse::json(200, &json!(receipt)),
            Err(err) => {
                let err = PixError::normalize(err);
                if err.code() >= 500 {
                    error!(error = %err.message, "error processing the file");
                }
                ProxyResponse::from_error(&err)
            }
        }
    }
}

fn accept_upload(payload: &RequestPayload) -> PixResult<UploadReceipt> {
    let buffer = match payload.decode() {
        Ok(buffer) => buffer,
        Err(PayloadError::MissingBody) => {
            bail_pix!(missing_body);
        }
        Err(other) => return Err(other.into()),
    };

    let file_name = payload.file_name_or_default();
    info!("File size: {} bytes", buffer.len());
    info!("File name: {:?}", file_name);

    Ok(UploadReceipt::new(file_name, buffer.len()))
}
