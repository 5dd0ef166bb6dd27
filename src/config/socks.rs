//! Local SOCKS5 listener configuration

use serde::{Deserialize, Serialize};

/// Default listen address
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:1080";

fn default_listen_addr() -> String {
    DEFAULT_LISTEN_ADDR.to_string()
}

/// Default request timeout in seconds
pub const DEFAULT_REQUEST_TIMEOUT: u64 = 10;

fn default_request_timeout() -> u64 {
    DEFAULT_REQUEST_TIMEOUT
}

/// SOCKS5 server configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SocksConfig {
    /// Address the local SOCKS5 server listens on
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Time allowed for one CONNECT to be established through the tunnel, in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,
}

impl Default for SocksConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            request_timeout: default_request_timeout(),
        }
    }
}

impl SocksConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if crate::transport::split_host_port(&self.listen_addr).is_none() {
            return Err(format!(
                "SOCKS5 listen address must be host:port, got {}",
                self.listen_addr
            ));
        }
        if self.request_timeout == 0 {
            return Err("SOCKS5 request timeout must be positive".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_socks_config_default() {
        let config = SocksConfig::default();
        assert_eq!(config.listen_addr, "127.0.0.1:1080");
        assert_eq!(config.request_timeout, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_socks_config_validate() {
        let config = SocksConfig {
            listen_addr: "localhost".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = SocksConfig {
            listen_addr: "[::1]:1080".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_socks_config_rejects_zero_timeout() {
        let config = SocksConfig {
            request_timeout: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
