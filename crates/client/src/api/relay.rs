use common::protocol::IdentityResponse;

use super::requests::{
    DownloadRequest, IdentityRequest, ListRequest, LookupKeyRequest, PingRequest,
    PullConfigRequest, PushConfigRequest, RegisterRequest, UploadRequest,
    UsernameFromPubIdRequest,
};
use super::{ApiClient, ApiError};

/// Everything a client session asks of a relay.
///
/// [`ApiClient`] speaks it over HTTP; tests swap in an in-memory relay.
#[async_trait::async_trait]
pub trait Relay: Send + Sync {
    async fn ping(&self) -> Result<String, ApiError>;
    async fn identity(&self) -> Result<IdentityResponse, ApiError>;
    async fn register(
        &self,
        public_key: &str,
        machine_id: Option<&str>,
    ) -> Result<Vec<u8>, ApiError>;
    async fn lookup_key(&self, name: &str) -> Result<String, ApiError>;
    async fn username_from_pub_id(&self, public_key: &str) -> Result<String, ApiError>;
    /// Returns the blob id the relay assigned.
    async fn upload(&self, recipients: &[String], data: Vec<u8>) -> Result<String, ApiError>;
    async fn download(&self, name: &str, blob_id: &str) -> Result<Vec<u8>, ApiError>;
    async fn list(&self) -> Result<String, ApiError>;
    async fn push_config(&self, name: &str, data: Vec<u8>) -> Result<(), ApiError>;
    async fn pull_config(&self, name: &str) -> Result<Vec<u8>, ApiError>;
}

#[async_trait::async_trait]
impl Relay for ApiClient {
    async fn ping(&self) -> Result<String, ApiError> {
        self.call(PingRequest).await
    }

    async fn identity(&self) -> Result<IdentityResponse, ApiError> {
        Ok(self.call(IdentityRequest).await?.0)
    }

    async fn register(
        &self,
        public_key: &str,
        machine_id: Option<&str>,
    ) -> Result<Vec<u8>, ApiError> {
        self.call(RegisterRequest {
            public_key: public_key.to_string(),
            machine_id: machine_id.map(str::to_string),
        })
        .await
    }

    async fn lookup_key(&self, name: &str) -> Result<String, ApiError> {
        let key = self
            .call(LookupKeyRequest {
                name: name.to_string(),
            })
            .await?;
        Ok(key.trim().to_string())
    }

    async fn username_from_pub_id(&self, public_key: &str) -> Result<String, ApiError> {
        let name = self
            .call(UsernameFromPubIdRequest {
                public_key: public_key.to_string(),
            })
            .await?;
        Ok(name.trim().to_string())
    }

    async fn upload(&self, recipients: &[String], data: Vec<u8>) -> Result<String, ApiError> {
        let blob_id = self
            .call(UploadRequest {
                recipients: recipients.to_vec(),
                data,
            })
            .await?;
        Ok(blob_id.trim().to_string())
    }

    async fn download(&self, name: &str, blob_id: &str) -> Result<Vec<u8>, ApiError> {
        self.call(DownloadRequest {
            name: name.to_string(),
            blob_id: blob_id.to_string(),
        })
        .await
    }

    async fn list(&self) -> Result<String, ApiError> {
        self.call(ListRequest).await
    }

    async fn push_config(&self, name: &str, data: Vec<u8>) -> Result<(), ApiError> {
        self.call(PushConfigRequest {
            name: name.to_string(),
            data,
        })
        .await?;
        Ok(())
    }

    async fn pull_config(&self, name: &str) -> Result<Vec<u8>, ApiError> {
        self.call(PullConfigRequest {
            name: name.to_string(),
        })
        .await
    }
}
