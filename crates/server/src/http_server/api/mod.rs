use axum::routing::get;
use axum::routing::post;
use axum::Router;

pub mod download;
pub mod list;
pub mod lookup;
pub mod register;
pub mod upload;
pub mod vault;

use crate::ServiceState;

/// Relay routes. Static first segments win over `/:name/:blob_id`.
pub fn router(state: ServiceState) -> Router<ServiceState> {
    Router::new()
        .route("/upload/", post(upload::handler))
        .route("/list/", get(list::handler))
        .route("/register/", get(register::handler))
        .route("/lookupKey", get(lookup::lookup_key))
        .route("/usernameFromPubID", get(lookup::username_from_pub_id))
        .route("/config/:name", get(vault::pull).post(vault::push))
        .route("/:name/:blob_id", get(download::handler))
        .with_state(state)
}
