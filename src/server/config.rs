//! Server configuration

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use crate::input::Separator;

/// Default TCP port
pub const DEFAULT_PORT: u16 = 8080;

/// Default client read timeout
pub const DEFAULT_CLIENT_READ_TIMEOUT: Duration = Duration::from_secs(10);

/// Server configuration options
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// TCP port to listen on
    pub port: u16,

    /// Bind to `127.0.0.1` instead of `0.0.0.0`
    pub listen_localhost: bool,

    /// Bounds the wait for client sessions to finish during shutdown; a
    /// session still wedged in a socket write past it is aborted
    pub client_read_timeout: Duration,

    /// Input frame separator; `None` auto-detects JPEG frame boundaries
    pub separator: Option<Vec<u8>>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            listen_localhost: false,
            client_read_timeout: DEFAULT_CLIENT_READ_TIMEOUT,
            separator: None,
        }
    }
}

impl ServerConfig {
    /// Set the TCP port
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Listen only on the localhost interface
    pub fn listen_localhost(mut self, localhost_only: bool) -> Self {
        self.listen_localhost = localhost_only;
        self
    }

    /// Set the client read timeout
    pub fn client_read_timeout(mut self, timeout: Duration) -> Self {
        self.client_read_timeout = timeout;
        self
    }

    /// Set an explicit input separator
    pub fn separator(mut self, separator: impl Into<Vec<u8>>) -> Self {
        self.separator = Some(separator.into());
        self
    }

    /// The address the listening socket binds to
    pub fn bind_addr(&self) -> SocketAddr {
        let ip: IpAddr = if self.listen_localhost {
            Ipv4Addr::LOCALHOST.into()
        } else {
            Ipv4Addr::UNSPECIFIED.into()
        };
        SocketAddr::new(ip, self.port)
    }

    /// The separator policy derived from the configuration
    pub fn separator_policy(&self) -> Separator {
        Separator::from_config(self.separator.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();

        assert_eq!(config.port, DEFAULT_PORT);
        assert!(!config.listen_localhost);
        assert_eq!(config.client_read_timeout, Duration::from_secs(10));
        assert!(config.separator.is_none());
        assert!(config.separator_policy().is_auto());
    }

    #[test]
    fn test_bind_addr_any() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_addr().to_string(), "0.0.0.0:8080");
    }

    #[test]
    fn test_bind_addr_localhost() {
        let config = ServerConfig::default().listen_localhost(true).port(9000);
        assert_eq!(config.bind_addr().to_string(), "127.0.0.1:9000");
    }

    #[test]
    fn test_builder_separator() {
        let config = ServerConfig::default().separator(b"--XYZ--".to_vec());

        assert_eq!(config.separator.as_deref(), Some(&b"--XYZ--"[..]));
        assert!(!config.separator_policy().is_auto());
    }

    #[test]
    fn test_builder_chaining() {
        let config = ServerConfig::default()
            .port(8081)
            .listen_localhost(true)
            .client_read_timeout(Duration::from_secs(5))
            .separator(b"sep".to_vec());

        assert_eq!(config.port, 8081);
        assert!(config.listen_localhost);
        assert_eq!(config.client_read_timeout, Duration::from_secs(5));
        assert_eq!(config.separator.as_deref(), Some(&b"sep"[..]));
    }
}
