use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;
use http::StatusCode;

use common::protocol::IdentityResponse;

use crate::ServiceState;

#[tracing::instrument(skip(state))]
pub async fn handler(State(state): State<ServiceState>) -> Response {
    let public_key = state.public_key().to_hex();
    (StatusCode::OK, Json(IdentityResponse { public_key })).into_response()
}
