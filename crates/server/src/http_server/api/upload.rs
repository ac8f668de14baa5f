use axum::extract::{Multipart, State};
use axum::response::{IntoResponse, Response};
use http::StatusCode;
use tokio::task::JoinError;

use common::protocol::{RECIPIENT_LIST_FIELD, UPLOAD_FILE_FIELD};

use crate::http_server::auth::Authenticated;
use crate::store::StoreError;
use crate::ServiceState;

/// `POST /upload/`: fan a sealed envelope out to the listed recipients.
pub async fn handler(
    State(state): State<ServiceState>,
    Authenticated(sender): Authenticated,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, UploadError> {
    let mut recipients: Option<Vec<String>> = None;
    let mut data: Option<Vec<u8>> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| UploadError::Multipart(e.to_string()))?
    {
        let field_name = field.name().unwrap_or("").to_string();
        let is_file = field.file_name().is_some();

        match field_name.as_str() {
            RECIPIENT_LIST_FIELD => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| UploadError::Multipart(e.to_string()))?;
                recipients = Some(
                    text.lines()
                        .map(str::trim)
                        .filter(|l| !l.is_empty())
                        .map(str::to_string)
                        .collect(),
                );
            }
            name if name == UPLOAD_FILE_FIELD || is_file => {
                data = Some(
                    field
                        .bytes()
                        .await
                        .map_err(|e| UploadError::Multipart(e.to_string()))?
                        .to_vec(),
                );
            }
            _ => {}
        }
    }

    let recipients =
        recipients.ok_or_else(|| UploadError::InvalidRequest("recipientList is required".into()))?;
    let data = data.ok_or_else(|| UploadError::InvalidRequest("file is required".into()))?;

    tracing::info!(
        sender = %sender,
        recipients = recipients.len(),
        size = data.len(),
        "upload"
    );

    let deposit = state
        .blocking(move |s| s.store().upload(s.directory(), &recipients, &data))
        .await??;

    Ok((StatusCode::OK, deposit.blob_id))
}

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Multipart error: {0}")]
    Multipart(String),
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    #[error("storage task failed: {0}")]
    Join(#[from] JoinError),
}

impl IntoResponse for UploadError {
    fn into_response(self) -> Response {
        match self {
            UploadError::InvalidRequest(msg) | UploadError::Multipart(msg) => {
                (StatusCode::BAD_REQUEST, format!("Bad request: {}", msg)).into_response()
            }
            UploadError::Store(StoreError::NoRecipients) => (
                StatusCode::BAD_REQUEST,
                "Bad request: no known recipients".to_string(),
            )
                .into_response(),
            e @ (UploadError::Store(_) | UploadError::Join(_)) => {
                tracing::error!(error = %e, "upload failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Unexpected error".to_string(),
                )
                    .into_response()
            }
        }
    }
}
