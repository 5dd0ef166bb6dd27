//! Transport module for sshsocks
//!
//! Provides the TCP connection the SSH session runs over, and address
//! helpers shared with the SOCKS5 front-end.

mod addr;
mod tcp;

pub use addr::{join_host_port, split_host_port};
pub use tcp::TcpTransport;

use crate::config::TcpConfig;
use socket2::{SockRef, TcpKeepalive};
use std::time::Duration;
use tokio::net::TcpStream;

/// Socket options for the SSH server connection
#[derive(Debug, Clone)]
pub struct SocketOpts {
    nodelay: bool,
    keepalive: Option<TcpKeepalive>,
}

impl SocketOpts {
    /// Options described by `config`; a zero keepalive time leaves keepalive off
    pub fn from_tcp_config(config: &TcpConfig) -> Self {
        let keepalive = (config.keepalive_secs > 0).then(|| {
            TcpKeepalive::new()
                .with_time(Duration::from_secs(config.keepalive_secs))
                .with_interval(Duration::from_secs(config.keepalive_interval))
        });

        SocketOpts {
            nodelay: config.nodelay,
            keepalive,
        }
    }

    /// Apply to a connected stream
    pub fn apply(&self, stream: &TcpStream) -> std::io::Result<()> {
        stream.set_nodelay(self.nodelay)?;
        if let Some(keepalive) = &self.keepalive {
            SockRef::from(stream).set_tcp_keepalive(keepalive)?;
        }
        Ok(())
    }
}
