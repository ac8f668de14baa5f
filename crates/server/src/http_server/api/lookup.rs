use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use http::StatusCode;
use serde::Deserialize;
use tokio::task::JoinError;

use common::crypto::PublicKey;

use crate::directory::DirectoryError;
use crate::ServiceState;

#[derive(Debug, Deserialize)]
pub struct LookupKeyParams {
    pub username: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReverseLookupParams {
    #[serde(rename = "pubID")]
    pub pub_id: Option<String>,
}

/// `GET /lookupKey?username=..`: the public key on file for a name.
pub async fn lookup_key(
    State(state): State<ServiceState>,
    Query(params): Query<LookupKeyParams>,
) -> Result<impl IntoResponse, LookupError> {
    let name = params
        .username
        .filter(|n| !n.is_empty())
        .ok_or(LookupError::MissingParam("username"))?;

    let key = state
        .blocking(move |s| s.directory().public_key(&name))
        .await??
        .ok_or(LookupError::NotFound)?;
    Ok((StatusCode::OK, key))
}

/// `GET /usernameFromPubID?pubID=..`: the name registered for a key.
pub async fn username_from_pub_id(
    State(state): State<ServiceState>,
    Query(params): Query<ReverseLookupParams>,
) -> Result<impl IntoResponse, LookupError> {
    let pub_id = params
        .pub_id
        .filter(|k| !k.is_empty())
        .ok_or(LookupError::MissingParam("pubID"))?;

    // a key that does not parse cannot be on file either
    let key = PublicKey::from_hex(&pub_id).map_err(|_| LookupError::NotFound)?;
    let name = state
        .blocking(move |s| s.directory().lookup_by_public_key(&key))
        .await??
        .ok_or(LookupError::NotFound)?;
    Ok((StatusCode::OK, name))
}

#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("missing query parameter: {0}")]
    MissingParam(&'static str),
    #[error("not found")]
    NotFound,
    #[error("directory error: {0}")]
    Directory(#[from] DirectoryError),
    #[error("storage task failed: {0}")]
    Join(#[from] JoinError),
}

impl IntoResponse for LookupError {
    fn into_response(self) -> Response {
        match self {
            LookupError::MissingParam(_) => {
                (StatusCode::BAD_REQUEST, format!("Bad request: {}", self)).into_response()
            }
            LookupError::NotFound => (StatusCode::NOT_FOUND, "not found").into_response(),
            e @ (LookupError::Directory(_) | LookupError::Join(_)) => {
                tracing::error!(error = %e, "lookup failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Unexpected error").into_response()
            }
        }
    }
}
