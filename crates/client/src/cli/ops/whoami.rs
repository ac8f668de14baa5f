use clap::Args;

use sealdrop_client::api::{ApiError, Relay};
use sealdrop_client::state::{ClientState, StateError};

/// Show the current account.
#[derive(Args, Debug, Clone)]
pub struct Whoami {
    /// Ask the relay which name it has on file for our key
    #[arg(long)]
    pub check: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum WhoamiError {
    #[error(transparent)]
    State(#[from] StateError),
    #[error("relay error: {0}")]
    Api(#[from] ApiError),
    #[error("relay knows this key as {remote}, local config says {local}")]
    Mismatch { local: String, remote: String },
}

/// Accounts under the state root besides `current`.
fn other_accounts(state: &ClientState, current: &str) -> Result<Vec<String>, StateError> {
    Ok(state
        .accounts()?
        .into_iter()
        .filter(|name| name != current)
        .collect())
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Whoami {
    type Error = WhoamiError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let account = ctx.account()?;
        let public_key = account.load_key()?.public();

        let mut lines = vec![
            format!("name:       {}", account.config.name),
            format!("public key: {}", public_key),
            format!("relay:      {}", account.config.url),
        ];
        let others = other_accounts(&ctx.state()?, &account.config.name)?;
        if !others.is_empty() {
            lines.push(format!("others:     {}", others.join(", ")));
        }

        if self.check {
            let remote = ctx.client.username_from_pub_id(&public_key.to_hex()).await?;
            if remote != account.config.name {
                return Err(WhoamiError::Mismatch {
                    local: account.config.name.clone(),
                    remote,
                });
            }
            lines.push("relay check: OK".to_string());
        }

        Ok(lines.join("\n"))
    }
}
