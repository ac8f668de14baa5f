// Relay building blocks
pub mod directory;
pub mod registration;
pub mod store;
pub mod vault;

// Service modules
pub mod http_server;
pub mod process;
pub mod service_config;
pub mod service_state;

// State directory (configuration, paths)
pub mod state;

pub use process::{init_logging, spawn_service};
pub use service_config::Config as ServiceConfig;
pub use service_state::State as ServiceState;
pub use state::{ServerConfig, ServerState, StateError};
