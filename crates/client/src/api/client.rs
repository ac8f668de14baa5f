use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Proxy};
use url::Url;

use common::protocol::{APIKEY_HEADER, APIUSERNAME_HEADER};

use super::error::ApiError;
use super::{ApiRequest, FromResponse};
use crate::state::ClientConfig;

/// HTTP handle on one relay.
///
/// When the config carries credentials they ride along on every request
/// as the `Apiusername` / `Apikey` headers.
#[derive(Debug, Clone)]
pub struct ApiClient {
    pub remote: Url,
    client: Client,
}

impl ApiClient {
    /// Unauthenticated client with default settings.
    pub fn new(remote: &Url) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(crate::state::DEFAULT_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            remote: remote.clone(),
            client,
        })
    }

    /// Client for an account: credentials, proxy, TLS and timeout from `config`.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ApiError> {
        let mut default_headers = HeaderMap::new();
        if !config.name.is_empty() {
            default_headers.insert(
                HeaderName::try_from(APIUSERNAME_HEADER)?,
                HeaderValue::from_str(&config.name)?,
            );
            let mut token = HeaderValue::from_str(&config.api_token)?;
            token.set_sensitive(true);
            default_headers.insert(HeaderName::try_from(APIKEY_HEADER)?, token);
        }

        let mut builder = Client::builder()
            .default_headers(default_headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .danger_accept_invalid_certs(config.insecure_skip_verify);
        if let Some(proxy) = &config.proxy {
            builder = builder.proxy(Proxy::all(proxy.as_str())?);
        }

        Ok(Self {
            remote: config.url.clone(),
            client: builder.build()?,
        })
    }

    pub async fn call<T: ApiRequest>(&self, request: T) -> Result<T::Response, ApiError> {
        let request_builder = request.build_request(&self.remote, &self.client)?;
        let response = request_builder.send().await?;

        if response.status().is_success() {
            T::Response::from_response(response).await
        } else {
            Err(ApiError::HttpStatus(
                response.status(),
                response.text().await?,
            ))
        }
    }

    /// Get the base URL for API requests
    pub fn base_url(&self) -> &Url {
        &self.remote
    }

    /// Get the underlying HTTP client for custom requests
    pub fn http_client(&self) -> &Client {
        &self.client
    }
}
