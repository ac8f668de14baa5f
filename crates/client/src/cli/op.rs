use std::error::Error;
use std::path::PathBuf;

use url::Url;

use sealdrop_client::api::{ApiClient, ApiError};
use sealdrop_client::state::{AccountState, ClientState, StateError, DEFAULT_RELAY_URL};
use sealdrop_client::transfer::{TransferClient, TransferError};

/// Resolve the relay URL for the API client.
///
/// Priority: explicit `--remote` flag > current account's relay > localhost default.
pub fn resolve_remote(explicit: Option<Url>, account: Option<&AccountState>) -> Url {
    if let Some(url) = explicit {
        return url;
    }
    if let Some(account) = account {
        return account.config.url.clone();
    }
    Url::parse(DEFAULT_RELAY_URL).expect("hardcoded URL must parse")
}

#[derive(Clone)]
pub struct OpContext {
    /// API client, authenticated when an account is set up
    pub client: ApiClient,
    /// Optional custom state path (defaults to ~/.config/sealdrop/client)
    pub config_path: Option<PathBuf>,
    /// The current account, if one is set up and loads cleanly
    pub account: Option<AccountState>,
}

impl OpContext {
    pub fn new(remote: Option<Url>, config_path: Option<PathBuf>) -> Result<Self, ApiError> {
        let account = ClientState::open(config_path.clone())
            .and_then(|state| state.load_current())
            .ok();
        let remote = resolve_remote(remote, account.as_ref());

        let client = match &account {
            Some(account) => {
                let mut config = account.config.clone();
                config.url = remote;
                ApiClient::from_config(&config)?
            }
            None => ApiClient::new(&remote)?,
        };

        Ok(Self {
            client,
            config_path,
            account,
        })
    }

    pub fn state(&self) -> Result<ClientState, StateError> {
        ClientState::open(self.config_path.clone())
    }

    /// The current account, or an error telling the user to register.
    pub fn account(&self) -> Result<&AccountState, StateError> {
        self.account.as_ref().ok_or(StateError::NotInitialized)
    }

    /// A transfer session for the current account.
    pub fn session(&self) -> Result<(&AccountState, TransferClient<ApiClient>), SessionError> {
        let account = self.account()?;
        let key = account.load_key()?;
        let book = account.load_addressbook()?;
        let session = TransferClient::new(self.client.clone(), book, key)?;
        Ok((account, session))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    State(#[from] StateError),
    #[error(transparent)]
    Transfer(#[from] TransferError),
}

#[async_trait::async_trait]
pub trait Op: Send + Sync {
    type Error: Error + Send + Sync + 'static;
    type Output;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error>;
}

#[macro_export]
macro_rules! command_enum {
    ($(($variant:ident, $type:ty)),* $(,)?) => {
        #[derive(Subcommand, Debug, Clone)]
        pub enum Command {
            $($variant($type),)*
        }

        #[derive(Debug)]
        pub enum OpOutput {
            $($variant(<$type as $crate::cli::op::Op>::Output),)*
        }

        #[derive(Debug, thiserror::Error)]
        pub enum OpError {
            $(
                #[error(transparent)]
                $variant(<$type as $crate::cli::op::Op>::Error),
            )*
        }

        #[async_trait::async_trait]
        impl $crate::cli::op::Op for Command {
            type Output = OpOutput;
            type Error = OpError;

            async fn execute(&self, ctx: &$crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
                match self {
                    $(
                        Command::$variant(op) => {
                            op.execute(ctx).await
                                .map(OpOutput::$variant)
                                .map_err(OpError::$variant)
                        },
                    )*
                }
            }
        }

        impl std::fmt::Display for OpOutput {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(
                        OpOutput::$variant(output) => write!(f, "{}", output),
                    )*
                }
            }
        }
    };
}
