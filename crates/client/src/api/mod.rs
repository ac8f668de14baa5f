#[allow(clippy::module_inception)]
mod client;
mod error;
mod relay;
pub mod requests;

pub use client::ApiClient;
pub use error::ApiError;
pub use relay::Relay;

use reqwest::{Client, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;

/// One relay endpoint: how to build the request and what comes back.
pub trait ApiRequest {
    type Response: FromResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, ApiError>;
}

/// Decode a successful response body.
#[async_trait::async_trait]
pub trait FromResponse: Sized {
    async fn from_response(response: Response) -> Result<Self, ApiError>;
}

#[async_trait::async_trait]
impl FromResponse for String {
    async fn from_response(response: Response) -> Result<Self, ApiError> {
        Ok(response.text().await?)
    }
}

#[async_trait::async_trait]
impl FromResponse for Vec<u8> {
    async fn from_response(response: Response) -> Result<Self, ApiError> {
        Ok(response.bytes().await?.to_vec())
    }
}

/// JSON response body.
#[derive(Debug, Clone)]
pub struct Json<T>(pub T);

#[async_trait::async_trait]
impl<T: DeserializeOwned + Send> FromResponse for Json<T> {
    async fn from_response(response: Response) -> Result<Self, ApiError> {
        Ok(Json(response.json::<T>().await?))
    }
}
