use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use http::{header, StatusCode};
use tokio::task::JoinError;

use crate::http_server::auth::Authenticated;
use crate::store::StoreError;
use crate::ServiceState;

/// `GET /:name/:blob_id`: deliver a blob to its owner and erase it.
pub async fn handler(
    State(state): State<ServiceState>,
    Authenticated(requester): Authenticated,
    Path((name, blob_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, DownloadError> {
    let id = blob_id.clone();
    let data = state
        .blocking(move |s| s.store().download(&name, &id, &requester))
        .await??;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", blob_id),
            ),
        ],
        data,
    ))
}

#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    #[error("storage task failed: {0}")]
    Join(#[from] JoinError),
}

impl IntoResponse for DownloadError {
    fn into_response(self) -> Response {
        match self {
            DownloadError::Store(StoreError::Unauthorized { .. }) => {
                (StatusCode::UNAUTHORIZED, "unauthorized").into_response()
            }
            DownloadError::Store(StoreError::NotFound)
            | DownloadError::Store(StoreError::InvalidPath(_)) => {
                (StatusCode::NOT_FOUND, "not found").into_response()
            }
            e @ (DownloadError::Store(_) | DownloadError::Join(_)) => {
                tracing::error!(error = %e, "download failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Unexpected error").into_response()
            }
        }
    }
}
