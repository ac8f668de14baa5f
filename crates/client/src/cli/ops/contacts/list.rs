use clap::Args;

use sealdrop_client::state::StateError;

#[derive(Args, Debug, Clone)]
pub struct List;

#[async_trait::async_trait]
impl crate::cli::op::Op for List {
    type Error = StateError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let book = ctx.account()?.load_addressbook()?;
        if book.entries.is_empty() {
            return Ok("no contacts".to_string());
        }

        let lines: Vec<String> = book
            .entries
            .iter()
            .map(|entry| {
                let key = if entry.public_key.is_empty() {
                    "-"
                } else {
                    entry.public_key.as_str()
                };
                format!("{:<16} {:<10} {}", entry.alias, entry.name, key)
            })
            .collect();
        Ok(lines.join("\n"))
    }
}
