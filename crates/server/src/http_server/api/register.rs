use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use http::{header, StatusCode};
use serde::Deserialize;
use tokio::task::JoinError;

use crate::directory::DirectoryError;
use crate::registration::{self, RegisterRequest, RegistrationError};
use crate::ServiceState;

#[derive(Debug, Deserialize)]
pub struct RegisterParams {
    #[serde(rename = "pubID")]
    pub pub_id: Option<String>,
    #[serde(rename = "MachineID")]
    pub machine_id: Option<String>,
}

/// `GET /register/?pubID=..&MachineID=..`
pub async fn handler(
    State(state): State<ServiceState>,
    Query(params): Query<RegisterParams>,
) -> Result<impl IntoResponse, RegisterError> {
    let public_key = params
        .pub_id
        .filter(|k| !k.trim().is_empty())
        .ok_or(RegisterError::MissingKey)?;

    let request = RegisterRequest {
        public_key,
        machine_id: params.machine_id,
    };
    let sealed = state
        .blocking(move |s| registration::register(s.directory(), s.identity(), &request))
        .await??;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/octet-stream")],
        sealed,
    ))
}

#[derive(Debug, thiserror::Error)]
pub enum RegisterError {
    #[error("pubID is required")]
    MissingKey,
    #[error(transparent)]
    Registration(#[from] RegistrationError),
    #[error("storage task failed: {0}")]
    Join(#[from] JoinError),
}

impl IntoResponse for RegisterError {
    fn into_response(self) -> Response {
        match self {
            RegisterError::MissingKey
            | RegisterError::Registration(RegistrationError::InvalidKey(_)) => {
                (StatusCode::BAD_REQUEST, format!("Bad request: {}", self)).into_response()
            }
            RegisterError::Registration(RegistrationError::AlreadyRegistered) => {
                (StatusCode::CONFLICT, "public key already registered").into_response()
            }
            RegisterError::Registration(RegistrationError::Directory(
                DirectoryError::NameTaken(name),
            )) => {
                tracing::warn!(name = %name, "generated name collided");
                (StatusCode::CONFLICT, "account name already taken").into_response()
            }
            e @ (RegisterError::Registration(_) | RegisterError::Join(_)) => {
                tracing::error!(error = %e, "registration failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Unexpected error").into_response()
            }
        }
    }
}
