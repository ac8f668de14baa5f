use clap::Args;

use sealdrop_client::state::{ClientConfig, StateError};
use sealdrop_client::transfer::TransferError;

use crate::cli::op::SessionError;

/// Restore the backup. Local credentials are kept; contacts and
/// connection settings come from the backup.
#[derive(Args, Debug, Clone)]
pub struct Pull;

#[derive(Debug, thiserror::Error)]
pub enum PullError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Transfer(#[from] TransferError),
    #[error(transparent)]
    State(#[from] StateError),
    #[error("backup belongs to account {0}")]
    WrongAccount(String),
}

/// Connection settings from the backup over the local url and credentials.
fn merge_restored(local: &ClientConfig, restored: ClientConfig) -> ClientConfig {
    ClientConfig {
        proxy: restored.proxy,
        insecure_skip_verify: restored.insecure_skip_verify,
        timeout_secs: restored.timeout_secs,
        server_key: local.server_key.clone().or(restored.server_key),
        ..local.clone()
    }
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Pull {
    type Error = PullError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let (account, mut session) = ctx.session()?;
        let restored = session.pull_config().await?;
        if restored.name != account.config.name {
            return Err(PullError::WrongAccount(restored.name));
        }

        let mut account = account.clone();
        account.config = merge_restored(&account.config, restored);
        account.config.validate().map_err(StateError::from)?;
        account.save_config()?;
        account.save_addressbook(session.book())?;

        Ok(format!(
            "restored {} contacts for {}",
            session.book().entries.len(),
            account.config.name
        ))
    }
}

#[cfg(test)]
mod tests {
    use url::Url;

    use super::*;

    #[test]
    fn restore_keeps_local_url_and_credentials() {
        let local = ClientConfig {
            name: "4kXvQ2p".into(),
            api_token: "00ff".into(),
            machine_token: Some("aa".into()),
            server_key: Some("11".repeat(32)),
            ..ClientConfig::new(Url::parse("http://relay.local:8080").unwrap())
        };
        let backup = ClientConfig {
            name: "4kXvQ2p".into(),
            api_token: "stale".into(),
            proxy: Some(Url::parse("socks5h://127.0.0.1:9050").unwrap()),
            insecure_skip_verify: true,
            timeout_secs: 90,
            server_key: Some("22".repeat(32)),
            ..ClientConfig::new(Url::parse("http://old-relay.test").unwrap())
        };

        let merged = merge_restored(&local, backup.clone());
        assert_eq!(merged.url, local.url);
        assert_eq!(merged.api_token, "00ff");
        assert_eq!(merged.machine_token.as_deref(), Some("aa"));
        assert_eq!(merged.server_key, local.server_key);
        assert_eq!(merged.proxy, backup.proxy);
        assert!(merged.insecure_skip_verify);
        assert_eq!(merged.timeout_secs, 90);

        let unpinned = ClientConfig {
            server_key: None,
            ..local
        };
        assert_eq!(merge_restored(&unpinned, backup.clone()).server_key, backup.server_key);
    }
}
