//! Server configuration and the accept/lifecycle loop

pub mod config;
pub mod listener;

pub use config::{ServerConfig, DEFAULT_CLIENT_READ_TIMEOUT, DEFAULT_PORT};
pub use listener::{MjpegServer, LISTEN_BACKLOG};
