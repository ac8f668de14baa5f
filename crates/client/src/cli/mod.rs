pub mod args;
pub mod op;
pub mod ops;

pub use ops::{Config, Contacts, Ls, Ping, Receive, Register, SendFile, Version, Whoami};
