//! TCP transport implementation
//!
//! Opens the single TCP connection the SSH session runs over.

use super::SocketOpts;
use crate::config::SshConfig;
use crate::error::{Error, Result};
use std::time::Duration;
use tokio::net::TcpStream;

/// TCP transport for the SSH connection
#[derive(Debug, Clone)]
pub struct TcpTransport {
    socket_opts: SocketOpts,
    connect_timeout: Duration,
}

impl TcpTransport {
    /// Create a TCP transport from the SSH configuration
    pub fn from_config(config: &SshConfig) -> Self {
        TcpTransport {
            socket_opts: SocketOpts::from_tcp_config(&config.tcp),
            connect_timeout: Duration::from_secs(config.connect_timeout),
        }
    }

    /// Connect to `addr`, resolving it with the system resolver
    pub async fn connect(&self, addr: &str) -> Result<TcpStream> {
        let dial_failed = |reason: String| Error::DialFailed {
            addr: addr.to_string(),
            reason,
        };

        let stream = tokio::time::timeout(self.connect_timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| dial_failed(format!("timed out after {:?}", self.connect_timeout)))?
            .map_err(|e| dial_failed(e.to_string()))?;

        if let Err(e) = self.socket_opts.apply(&stream) {
            tracing::warn!("Failed to apply socket options: {}", e);
        }

        tracing::debug!("TCP connection established to {}", addr);

        Ok(stream)
    }
}
