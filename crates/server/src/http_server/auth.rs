use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::response::{IntoResponse, Response};
use http::request::Parts;
use http::StatusCode;
use tokio::task::JoinError;

use common::protocol::{APIKEY_HEADER, APIUSERNAME_HEADER};

use crate::directory::DirectoryError;
use crate::ServiceState;

/// The account name of a request that presented a valid name/token pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authenticated(pub String);

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("missing credentials")]
    MissingCredentials,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("directory error: {0}")]
    Directory(#[from] DirectoryError),
    #[error("storage task failed: {0}")]
    Join(#[from] JoinError),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match self {
            AuthError::MissingCredentials | AuthError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, "unauthorized").into_response()
            }
            e @ (AuthError::Directory(_) | AuthError::Join(_)) => {
                tracing::error!(error = %e, "failed to read user directory");
                (StatusCode::INTERNAL_SERVER_ERROR, "Unexpected error").into_response()
            }
        }
    }
}

fn header<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

#[async_trait]
impl FromRequestParts<ServiceState> for Authenticated {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ServiceState,
    ) -> Result<Self, Self::Rejection> {
        let name = header(parts, APIUSERNAME_HEADER).ok_or(AuthError::MissingCredentials)?;
        let token = header(parts, APIKEY_HEADER).ok_or(AuthError::MissingCredentials)?;

        let name = name.to_string();
        let token = token.to_string();
        let (name, valid) = state
            .blocking(move |s| {
                let valid = s.directory().authenticate(&name, &token);
                (name, valid)
            })
            .await?;
        if !valid? {
            tracing::warn!(name = %name, "rejected credentials");
            return Err(AuthError::InvalidCredentials);
        }
        Ok(Authenticated(name))
    }
}
