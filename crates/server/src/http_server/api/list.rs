use axum::extract::State;
use axum::response::{IntoResponse, Response};
use http::StatusCode;
use tokio::task::JoinError;

use common::protocol::human_size;

use crate::http_server::auth::Authenticated;
use crate::store::{BlobInfo, StoreError};
use crate::ServiceState;

const LIST_TIME_FORMAT: &str = "%d.%m.%Y %H:%M:%S UTC";

pub fn format_line(blob: &BlobInfo) -> String {
    format!(
        "'{}'  {}, {}\n",
        blob.blob_id,
        human_size(blob.size),
        blob.modified.format(LIST_TIME_FORMAT)
    )
}

/// `GET /list/`: what is waiting in the caller's own inbox.
pub async fn handler(
    State(state): State<ServiceState>,
    Authenticated(name): Authenticated,
) -> Result<impl IntoResponse, ListError> {
    let blobs = state.blocking(move |s| s.store().list(&name)).await??;
    let body: String = blobs.iter().map(format_line).collect();
    Ok((StatusCode::OK, body))
}

#[derive(Debug, thiserror::Error)]
pub enum ListError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    #[error("storage task failed: {0}")]
    Join(#[from] JoinError),
}

impl IntoResponse for ListError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, "list failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Error: {}", self),
        )
            .into_response()
    }
}
