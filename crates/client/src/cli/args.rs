pub use clap::Parser;

use std::path::PathBuf;
use url::Url;

#[derive(Parser, Debug)]
#[command(name = "sealdrop")]
#[command(about = "Send files encrypted to your contacts through a sealdrop relay")]
pub struct Args {
    /// Relay URL (defaults to the current account's relay)
    #[arg(long, global = true, env = "SEALDROP_REMOTE")]
    pub remote: Option<Url>,

    /// Path to the client state directory (defaults to ~/.config/sealdrop/client)
    #[arg(long, global = true, env = "SEALDROP_CONFIG")]
    pub config_path: Option<PathBuf>,

    #[command(subcommand)]
    pub command: crate::Command,
}
