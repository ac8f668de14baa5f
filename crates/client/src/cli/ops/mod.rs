pub mod config;
pub mod contacts;
pub mod ls;
pub mod ping;
pub mod receive;
pub mod register;
pub mod send;
pub mod version;
pub mod whoami;

pub use config::Config;
pub use contacts::Contacts;
pub use ls::Ls;
pub use ping::Ping;
pub use receive::Receive;
pub use register::Register;
pub use send::SendFile;
pub use version::Version;
pub use whoami::Whoami;
