use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use http::{header, StatusCode};
use tokio::task::JoinError;

use crate::http_server::auth::Authenticated;
use crate::vault::VaultError;
use crate::ServiceState;

/// `GET /config/:name`
pub async fn pull(
    State(state): State<ServiceState>,
    Authenticated(requester): Authenticated,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, ConfigVaultError> {
    if requester != name {
        return Err(ConfigVaultError::Forbidden);
    }
    let data = state
        .blocking(move |s| s.vault().get(s.directory(), &name))
        .await??;
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/octet-stream")],
        data,
    ))
}

/// `POST /config/:name` with the raw sealed config as body.
pub async fn push(
    State(state): State<ServiceState>,
    Authenticated(requester): Authenticated,
    Path(name): Path<String>,
    body: Bytes,
) -> Result<impl IntoResponse, ConfigVaultError> {
    if requester != name {
        return Err(ConfigVaultError::Forbidden);
    }
    if body.is_empty() {
        return Err(ConfigVaultError::EmptyBody);
    }
    state
        .blocking(move |s| s.vault().put(s.directory(), &name, &body))
        .await??;
    Ok((StatusCode::OK, "ok"))
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigVaultError {
    #[error("config belongs to another account")]
    Forbidden,
    #[error("empty config")]
    EmptyBody,
    #[error(transparent)]
    Vault(#[from] VaultError),
    #[error("storage task failed: {0}")]
    Join(#[from] JoinError),
}

impl IntoResponse for ConfigVaultError {
    fn into_response(self) -> Response {
        match self {
            ConfigVaultError::Forbidden => {
                (StatusCode::UNAUTHORIZED, "unauthorized").into_response()
            }
            ConfigVaultError::EmptyBody => {
                (StatusCode::BAD_REQUEST, "Bad request: empty config").into_response()
            }
            ConfigVaultError::Vault(VaultError::UnknownAccount(_))
            | ConfigVaultError::Vault(VaultError::Empty(_)) => {
                (StatusCode::NOT_FOUND, "not found").into_response()
            }
            e @ (ConfigVaultError::Vault(_) | ConfigVaultError::Join(_)) => {
                tracing::error!(error = %e, "config vault failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Unexpected error").into_response()
            }
        }
    }
}
