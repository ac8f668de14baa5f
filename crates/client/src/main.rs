// CLI modules
mod cli;

use clap::{Parser, Subcommand};
use cli::{args::Args, op::Op};
use cli::{Config, Contacts, Ls, Ping, Receive, Register, SendFile, Version, Whoami};
use tracing_subscriber::EnvFilter;

command_enum! {
    (Register, Register),
    (Whoami, Whoami),
    (Contacts, Contacts),
    (Send, SendFile),
    (Receive, Receive),
    (Ls, Ls),
    (Config, Config),
    (Ping, Ping),
    (Version, Version),
}

/// Warnings (skipped recipients, failed lookups) go to stderr so stdout
/// stays clean for command output.
fn init_logging() {
    let env_filter = EnvFilter::builder()
        .with_default_directive(tracing::Level::WARN.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .compact()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() {
    init_logging();
    let args = Args::parse();

    // Build context - always has API client initialized
    let ctx = match cli::op::OpContext::new(args.remote, args.config_path) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("Error: Failed to create API client: {}", e);
            std::process::exit(1);
        }
    };

    match args.command.execute(&ctx).await {
        Ok(output) => {
            println!("{}", output);
            std::process::exit(0);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
