use clap::{Args, Subcommand};

pub mod add;
pub mod delete;
pub mod list;

use crate::cli::op::Op;

crate::command_enum! {
    (List, list::List),
    (Add, add::Add),
    (Delete, delete::Delete),
}

pub type ContactsCommand = Command;

/// Manage the address book of the current account.
#[derive(Args, Debug, Clone)]
pub struct Contacts {
    #[command(subcommand)]
    pub command: ContactsCommand,
}

#[async_trait::async_trait]
impl Op for Contacts {
    type Error = OpError;
    type Output = OpOutput;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        self.command.execute(ctx).await
    }
}
