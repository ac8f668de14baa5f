#![allow(dead_code)]

use axum::body::Body;
use axum::Router;
use http::{Request, Response};
use tempfile::TempDir;
use tower::ServiceExt;

use common::blob_id::BlobIdScheme;
use common::crypto::SecretKey;
use common::protocol::{
    RegisterResponse, APIKEY_HEADER, APIUSERNAME_HEADER, RECIPIENT_LIST_FIELD, UPLOAD_FILE_FIELD,
};
use sealdrop_server::{http_server, ServiceConfig, ServiceState};

pub const BOUNDARY: &str = "sealdrop-test-boundary";

pub struct TestRelay {
    pub dir: TempDir,
    pub state: ServiceState,
    pub identity: SecretKey,
}

pub struct Account {
    pub key: SecretKey,
    pub name: String,
    pub token: String,
}

impl TestRelay {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let identity = SecretKey::generate();
        let config = ServiceConfig {
            listen_addr: "127.0.0.1:0".parse().unwrap(),
            homepage: "https://example.org/sealdrop".into(),
            users_path: dir.path().join("users.json"),
            data_path: dir.path().join("data"),
            vault_path: dir.path().join("vault"),
            blob_id: BlobIdScheme::Short,
            identity: identity.clone(),
            log_level: tracing::Level::INFO,
            log_dir: None,
        };
        let state = ServiceState::from_config(&config).unwrap();
        Self {
            dir,
            state,
            identity,
        }
    }

    pub fn router(&self) -> Router {
        http_server::router(self.state.clone())
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router().oneshot(request).await.unwrap()
    }

    pub async fn register(&self) -> Account {
        let key = SecretKey::generate();
        let request = Request::get(format!("/register/?pubID={}", key.public().to_hex()))
            .body(Body::empty())
            .unwrap();
        let response = self.send(request).await;
        assert_eq!(response.status(), 200);

        let sealed = body_bytes(response).await;
        let opened = common::crypto::Envelope::open(&key, &sealed).unwrap();
        assert_eq!(opened.sender, self.identity.public());
        let creds: RegisterResponse = serde_json::from_slice(&opened.contents).unwrap();
        Account {
            key,
            name: creds.name,
            token: creds.api_token,
        }
    }
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

pub async fn body_text(response: Response<Body>) -> String {
    String::from_utf8(body_bytes(response).await).unwrap()
}

pub fn authed(builder: http::request::Builder, account: &Account) -> http::request::Builder {
    builder
        .header(APIUSERNAME_HEADER, &account.name)
        .header(APIKEY_HEADER, &account.token)
}

pub fn upload_body(recipients: &[&str], data: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{RECIPIENT_LIST_FIELD}\"\r\n\r\n{}\r\n",
            recipients.join("\n")
        )
        .as_bytes(),
    );
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{UPLOAD_FILE_FIELD}\"; filename=\"blob\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub fn upload_request(sender: &Account, recipients: &[&str], data: &[u8]) -> Request<Body> {
    authed(Request::post("/upload/"), sender)
        .header(
            http::header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(upload_body(recipients, data)))
        .unwrap()
}
