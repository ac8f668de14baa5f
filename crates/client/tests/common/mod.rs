#![allow(dead_code)]

use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::sync::watch;
use url::Url;

use common::blob_id::BlobIdScheme;
use common::crypto::{Envelope, PublicKey, SecretKey};
use common::protocol::RegisterResponse;
use sealdrop_client::addressbook::AddressBook;
use sealdrop_client::api::{ApiClient, Relay};
use sealdrop_client::state::ClientConfig;
use sealdrop_client::transfer::TransferClient;
use sealdrop_server::{http_server, ServiceConfig, ServiceState};

/// A real relay on an ephemeral localhost port.
pub struct LiveRelay {
    _dir: TempDir,
    pub url: Url,
    pub identity: PublicKey,
    shutdown: watch::Sender<()>,
}

/// A registered account and its HTTP client.
pub struct Member {
    pub key: SecretKey,
    pub config: ClientConfig,
    pub client: ApiClient,
}

impl Member {
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// A transfer session with an empty address book.
    pub fn session(&self) -> TransferClient<ApiClient> {
        let book = AddressBook::new(&self.config.name, self.config.url.as_str());
        TransferClient::new(self.client.clone(), book, self.key.clone()).unwrap()
    }
}

impl LiveRelay {
    pub async fn start() -> Self {
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
            log_level: tracing::Level::DEBUG,
            log_dir: None,
        };
        let state = ServiceState::from_config(&config).unwrap();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (shutdown, shutdown_rx) = watch::channel(());
        tokio::spawn(async move {
            http_server::serve(listener, state, tracing::Level::DEBUG, shutdown_rx)
                .await
                .unwrap();
        });

        Self {
            _dir: dir,
            url: Url::parse(&format!("http://{}", addr)).unwrap(),
            identity: identity.public(),
            shutdown,
        }
    }

    pub fn anonymous(&self) -> ApiClient {
        ApiClient::new(&self.url).unwrap()
    }

    /// Register a fresh key the way `sealdrop register` does.
    pub async fn join(&self) -> Member {
        let key = SecretKey::generate();
        let sealed = self
            .anonymous()
            .register(&key.public().to_hex(), Some("test-machine"))
            .await
            .unwrap();
        let opened = Envelope::open(&key, &sealed).unwrap();
        assert_eq!(opened.sender, self.identity);
        let creds: RegisterResponse = serde_json::from_slice(&opened.contents).unwrap();

        let config = ClientConfig {
            name: creds.name,
            api_token: creds.api_token,
            machine_id: creds.machine_id,
            machine_token: creds.machine_token,
            server_key: Some(self.identity.to_hex()),
            ..ClientConfig::new(self.url.clone())
        };
        config.validate().unwrap();
        let client = ApiClient::from_config(&config).unwrap();
        Member {
            key,
            config,
            client,
        }
    }
}

impl Drop for LiveRelay {
    fn drop(&mut self) {
        let _ = self.shutdown.send(());
    }
}
