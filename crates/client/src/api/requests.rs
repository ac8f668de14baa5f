//! One request type per relay endpoint.

use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Url};

use common::protocol::{
    IdentityResponse, MACHINE_ID_PARAM, PUB_ID_PARAM, RECIPIENT_LIST_FIELD, UPLOAD_FILE_FIELD,
    USERNAME_PARAM,
};

use super::{ApiError, ApiRequest, Json};

/// `base_url` with its path replaced by `segments`, each percent-encoded.
fn segments_url(base_url: &Url, segments: &[&str]) -> Result<Url, ApiError> {
    let mut url = base_url.clone();
    url.path_segments_mut()
        .map_err(|_| ApiError::UrlParse(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
        .clear()
        .extend(segments);
    Ok(url)
}

#[derive(Debug, Clone, Default)]
pub struct PingRequest;

impl ApiRequest for PingRequest {
    type Response = String;

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, ApiError> {
        let full_url = base_url.join("/ping")?;
        Ok(client.get(full_url))
    }
}

#[derive(Debug, Clone, Default)]
pub struct IdentityRequest;

impl ApiRequest for IdentityRequest {
    type Response = Json<IdentityResponse>;

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, ApiError> {
        let full_url = base_url.join("/_status/identity")?;
        Ok(client.get(full_url))
    }
}

/// Ask the relay for an account. The response is an envelope sealed to `public_key`.
#[derive(Debug, Clone)]
pub struct RegisterRequest {
    pub public_key: String,
    pub machine_id: Option<String>,
}

impl ApiRequest for RegisterRequest {
    type Response = Vec<u8>;

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, ApiError> {
        let full_url = base_url.join("/register/")?;
        let mut query = vec![(PUB_ID_PARAM, self.public_key)];
        if let Some(machine_id) = self.machine_id {
            query.push((MACHINE_ID_PARAM, machine_id));
        }
        Ok(client.get(full_url).query(&query))
    }
}

#[derive(Debug, Clone)]
pub struct LookupKeyRequest {
    pub name: String,
}

impl ApiRequest for LookupKeyRequest {
    type Response = String;

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, ApiError> {
        let full_url = base_url.join("/lookupKey")?;
        Ok(client.get(full_url).query(&[(USERNAME_PARAM, self.name)]))
    }
}

#[derive(Debug, Clone)]
pub struct UsernameFromPubIdRequest {
    pub public_key: String,
}

impl ApiRequest for UsernameFromPubIdRequest {
    type Response = String;

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, ApiError> {
        let full_url = base_url.join("/usernameFromPubID")?;
        Ok(client
            .get(full_url)
            .query(&[(PUB_ID_PARAM, self.public_key)]))
    }
}

/// Deposit one sealed envelope for every name in `recipients`.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub recipients: Vec<String>,
    pub data: Vec<u8>,
}

impl ApiRequest for UploadRequest {
    type Response = String;

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, ApiError> {
        let full_url = base_url.join("/upload/")?;
        let form = Form::new()
            .text(RECIPIENT_LIST_FIELD, self.recipients.join("\n"))
            .part(
                UPLOAD_FILE_FIELD,
                Part::bytes(self.data).file_name("sealed"),
            );
        Ok(client.post(full_url).multipart(form))
    }
}

#[derive(Debug, Clone)]
pub struct DownloadRequest {
    pub name: String,
    pub blob_id: String,
}

impl ApiRequest for DownloadRequest {
    type Response = Vec<u8>;

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, ApiError> {
        let full_url = segments_url(base_url, &[&self.name, &self.blob_id])?;
        Ok(client.get(full_url))
    }
}

#[derive(Debug, Clone, Default)]
pub struct ListRequest;

impl ApiRequest for ListRequest {
    type Response = String;

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, ApiError> {
        let full_url = base_url.join("/list/")?;
        Ok(client.get(full_url))
    }
}

#[derive(Debug, Clone)]
pub struct PushConfigRequest {
    pub name: String,
    pub data: Vec<u8>,
}

impl ApiRequest for PushConfigRequest {
    type Response = String;

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, ApiError> {
        let full_url = segments_url(base_url, &["config", &self.name])?;
        Ok(client.post(full_url).body(self.data))
    }
}

#[derive(Debug, Clone)]
pub struct PullConfigRequest {
    pub name: String,
}

impl ApiRequest for PullConfigRequest {
    type Response = Vec<u8>;

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, ApiError> {
        let full_url = segments_url(base_url, &["config", &self.name])?;
        Ok(client.get(full_url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("http://relay.test:8080").unwrap()
    }

    #[test]
    fn register_query_carries_machine_id() {
        let client = Client::new();
        let request = RegisterRequest {
            public_key: "ab".repeat(32),
            machine_id: Some("laptop".into()),
        }
        .build_request(&base(), &client)
        .unwrap()
        .build()
        .unwrap();

        assert_eq!(request.url().path(), "/register/");
        let query = request.url().query().unwrap();
        assert!(query.contains(&format!("pubID={}", "ab".repeat(32))));
        assert!(query.contains("MachineID=laptop"));
    }

    #[test]
    fn download_path_is_namespace_then_id() {
        let client = Client::new();
        let request = DownloadRequest {
            name: "3yZe7d".into(),
            blob_id: "0a1b2c3d".into(),
        }
        .build_request(&base(), &client)
        .unwrap()
        .build()
        .unwrap();

        assert_eq!(request.url().as_str(), "http://relay.test:8080/3yZe7d/0a1b2c3d");
    }

    #[test]
    fn path_segments_are_escaped() {
        let client = Client::new();
        let request = PullConfigRequest {
            name: "../etc".into(),
        }
        .build_request(&base(), &client)
        .unwrap()
        .build()
        .unwrap();

        assert_eq!(request.url().path(), "/config/..%2Fetc");
    }
}
