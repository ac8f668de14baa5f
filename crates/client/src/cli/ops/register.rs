use clap::Args;
use url::Url;

use common::crypto::{Envelope, EnvelopeError, PublicKey, SecretKey};
use common::protocol::RegisterResponse;
use sealdrop_client::addressbook::AddressBook;
use sealdrop_client::api::{ApiClient, ApiError, Relay};
use sealdrop_client::state::{ClientConfig, ConfigError, StateError, DEFAULT_TIMEOUT_SECS};

/// Create an account on the relay and make it the current one.
#[derive(Args, Debug, Clone)]
pub struct Register {
    /// Label for this machine (a random one is generated if omitted)
    #[arg(long)]
    pub machine_id: Option<String>,

    /// Hex public key the relay must sign with (fetched from the relay if omitted)
    #[arg(long)]
    pub server_key: Option<String>,

    /// Proxy for all relay traffic, e.g. socks5h://127.0.0.1:9050
    #[arg(long)]
    pub proxy: Option<Url>,

    /// Accept invalid TLS certificates
    #[arg(long)]
    pub insecure: bool,

    /// Request timeout in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum RegisterError {
    #[error("invalid settings: {0}")]
    Config(#[from] ConfigError),
    #[error("relay error: {0}")]
    Api(#[from] ApiError),
    #[error("relay served an invalid identity key")]
    BadServerKey,
    #[error("registration response was not signed by the expected relay key {0}")]
    UntrustedRelay(String),
    #[error("could not open registration response: {0}")]
    Envelope(#[from] EnvelopeError),
    #[error("malformed registration response: {0}")]
    Response(#[from] serde_json::Error),
    #[error(transparent)]
    State(#[from] StateError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Register {
    type Error = RegisterError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let state = ctx.state()?;

        let mut config = ClientConfig::new(ctx.client.base_url().clone());
        config.server_key = self.server_key.clone();
        config.proxy = self.proxy.clone();
        config.insecure_skip_verify = self.insecure;
        config.timeout_secs = self.timeout;
        config.validate()?;

        // no credentials yet, so this client is anonymous
        let relay = ApiClient::from_config(&config)?;
        let server_key = match config.server_key()? {
            Some(key) => key,
            None => PublicKey::from_hex(&relay.identity().await?.public_key)
                .map_err(|_| RegisterError::BadServerKey)?,
        };

        let key = SecretKey::generate();
        let machine_id = self
            .machine_id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let sealed = relay
            .register(&key.public().to_hex(), Some(&machine_id))
            .await?;

        let opened = Envelope::open(&key, &sealed)?;
        if opened.sender != server_key {
            return Err(RegisterError::UntrustedRelay(server_key.to_hex()));
        }
        let response: RegisterResponse = serde_json::from_slice(&opened.contents)?;
        tracing::debug!(name = %response.name, "relay assigned account");

        config.name = response.name;
        config.api_token = response.api_token;
        config.machine_id = response.machine_id;
        config.machine_token = response.machine_token;
        config.server_key = Some(server_key.to_hex());

        let book = AddressBook::new(&config.name, config.url.as_str());
        let account = state.create_account(config, &key, &book)?;

        Ok(format!(
            "registered as {}\npublic key: {}\nstate: {}",
            account.config.name,
            key.public(),
            account.dir.display()
        ))
    }
}
