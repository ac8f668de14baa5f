use axum::extract::State;
use axum::response::{IntoResponse, Response};
use http::{header, StatusCode};

use crate::ServiceState;

/// `GET /` sends browsers to the project homepage.
pub async fn handler(State(state): State<ServiceState>) -> Response {
    (
        StatusCode::MOVED_PERMANENTLY,
        [(header::LOCATION, state.homepage().to_string())],
    )
        .into_response()
}

pub async fn ping() -> &'static str {
    "pong"
}
