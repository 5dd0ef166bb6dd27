//! # sshsocks - SOCKS5 proxy over an SSH tunnel
//!
//! sshsocks is dynamic port forwarding (`ssh -D`) as a small service. It
//! listens for SOCKS5 clients locally and opens every requested connection
//! as a forwarded channel on one shared SSH session.
//!
//! ## Features
//!
//! - **Lazy Tunnel**: the SSH session is created on the first request and shared afterwards
//! - **Remote Name Resolution**: hostnames are passed through the tunnel unresolved
//! - **Credential Chain**: agent keys, then key files, then password
//! - **Host Key Policies**: accept-any, pinned fingerprint or trust-on-first-use
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sshsocks::config::load_config;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = load_config("sshsocks.toml")?;
//!     sshsocks::run(config, CancellationToken::new()).await
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! SOCKS5 Client -> ProxyServer -> LazyDialer -> DialAdapter -> SshTunnel -> Target
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod config;
pub mod dial;
pub mod error;
pub mod server;
pub mod socks;
pub mod ssh;
pub mod transport;

pub use config::{load_config, Config, ConfigArgs};
pub use dial::{ContextDial, Dial, DialAdapter, LazyDialer};
pub use error::{DialError, Error, Socks5ReplyCode};
pub use server::ProxyServer;

use anyhow::Result;
use config::SshConfig;
use socks::NoopResolver;
use ssh::{resolve_credentials, verifier_for, SshTunnel};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Version of the sshsocks library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Name of the application
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Build the shared dialer for `config`
///
/// Nothing touches the network until the first dial. That dial resolves
/// credentials, connects and authenticates; the outcome is kept for the
/// lifetime of the returned value.
pub fn build_dialer(config: SshConfig) -> LazyDialer {
    let config = Arc::new(config);
    let verifier = verifier_for(&config.host_key_policy);

    LazyDialer::new(move || {
        let config = config.clone();
        let verifier = verifier.clone();
        async move {
            let credentials = resolve_credentials(&config).await?;
            let tunnel = SshTunnel::connect(&config, credentials, verifier).await?;
            Ok(DialAdapter::new(tunnel))
        }
    })
}

/// Serve SOCKS5 clients through the SSH tunnel until `shutdown` fires
pub async fn run(config: Config, shutdown: CancellationToken) -> Result<()> {
    let dialer = Arc::new(build_dialer(config.ssh));
    let server = ProxyServer::bind(config.socks, dialer, Arc::new(NoopResolver)).await?;
    server.run(shutdown).await
}
