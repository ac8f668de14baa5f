use std::path::PathBuf;

use clap::{Parser, Subcommand};

use common::blob_id::BlobIdScheme;
use sealdrop_server::directory::UserDirectory;
use sealdrop_server::{spawn_service, ServerConfig, ServerState, ServiceConfig};

#[derive(Parser, Debug)]
#[command(name = "sealdrop-server")]
#[command(about = "Store-and-forward relay for sealed file drops")]
struct Args {
    /// Path to the server directory (defaults to ~/.sealdrop-server)
    #[arg(long, global = true, env = "SEALDROP_SERVER_DIR")]
    dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
enum Command {
    /// Create the server directory, identity key and config
    Init {
        #[arg(long)]
        listen_addr: Option<String>,
        #[arg(long)]
        homepage: Option<String>,
        /// Use 32-byte blob ids instead of 4-byte ones
        #[arg(long)]
        long_blob_ids: bool,
    },
    /// Run the relay until interrupted
    Run {
        /// Override the configured listen address
        #[arg(long)]
        listen_addr: Option<String>,
        /// Directory for log files (logs to stdout only if not set)
        #[arg(long)]
        log_dir: Option<PathBuf>,
    },
    /// Replace an account's API token and print the new one
    ReissueToken {
        /// Account name
        name: String,
    },
    /// Print build information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    match args.command {
        Command::Init {
            listen_addr,
            homepage,
            long_blob_ids,
        } => {
            let defaults = ServerConfig::default();
            let config = ServerConfig {
                listen_addr: listen_addr.unwrap_or(defaults.listen_addr),
                homepage: homepage.unwrap_or(defaults.homepage),
                blob_id: if long_blob_ids {
                    BlobIdScheme::Long
                } else {
                    BlobIdScheme::Short
                },
                ..Default::default()
            };
            let state = ServerState::init(args.dir, Some(config))?;
            let identity = state.load_key()?.public();
            println!("initialized {}", state.server_dir.display());
            println!("relay identity: {}", identity);
        }
        Command::Run {
            listen_addr,
            log_dir,
        } => {
            let mut state = ServerState::load(args.dir)?;
            if let Some(addr) = listen_addr {
                state.config.listen_addr = addr;
            }
            if log_dir.is_some() {
                state.config.log_dir = log_dir;
            }
            let config = ServiceConfig::from_state(&state)?;
            spawn_service(&config).await?;
        }
        Command::ReissueToken { name } => {
            let state = ServerState::load(args.dir)?;
            let token = UserDirectory::open(&state.users_path).reissue_token(&name)?;
            println!("{}", token);
        }
        Command::Version => {
            println!("{}", common::prelude::build_info());
        }
    }

    Ok(())
}
