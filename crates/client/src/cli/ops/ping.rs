use clap::Args;

use sealdrop_client::api::{ApiError, Relay};

/// Check the relay is reachable.
#[derive(Args, Debug, Clone)]
pub struct Ping;

#[derive(Debug, thiserror::Error)]
pub enum PingError {
    #[error("relay unreachable: {0}")]
    Api(#[from] ApiError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Ping {
    type Error = PingError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let reply = ctx.client.ping().await?;
        Ok(format!("{}: {}", ctx.client.base_url(), reply.trim()))
    }
}
