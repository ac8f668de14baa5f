use clap::{Args, Subcommand};

pub mod pull;
pub mod push;

use crate::cli::op::Op;

crate::command_enum! {
    (Push, push::Push),
    (Pull, pull::Pull),
}

pub type ConfigCommand = Command;

/// Back up or restore account settings and contacts through the relay.
#[derive(Args, Debug, Clone)]
pub struct Config {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[async_trait::async_trait]
impl Op for Config {
    type Error = OpError;
    type Output = OpOutput;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        self.command.execute(ctx).await
    }
}
