//! Local SOCKS5 listener
//!
//! Accepts clients on the configured address and serves each one on its own
//! task, sharing a single tunnel dialer and resolver.

use crate::config::SocksConfig;
use crate::dial::ContextDial;
use crate::socks::{handle_socks5_on_stream, NameResolver};
use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Pause after a failed accept, so errors such as EMFILE do not spin the loop
const ACCEPT_ERROR_DELAY: Duration = Duration::from_millis(100);

/// SOCKS5 server bound to a local address
pub struct ProxyServer {
    listener: TcpListener,
    dialer: Arc<dyn ContextDial>,
    resolver: Arc<dyn NameResolver>,
    config: Arc<SocksConfig>,
}

impl ProxyServer {
    /// Bind the listen address from `config`, after validating it
    pub async fn bind(
        config: SocksConfig,
        dialer: Arc<dyn ContextDial>,
        resolver: Arc<dyn NameResolver>,
    ) -> Result<Self> {
        config.validate().map_err(anyhow::Error::msg)?;

        let listener = TcpListener::bind(&config.listen_addr)
            .await
            .with_context(|| format!("Failed to listen on {}", config.listen_addr))?;

        info!("SOCKS5 proxy listening on {}", listener.local_addr()?);

        Ok(Self {
            listener,
            dialer,
            resolver,
            config: Arc::new(config),
        })
    }

    /// Address actually bound (useful with port 0)
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept clients until `shutdown` fires
    ///
    /// In-flight connections are told to stop through the same token.
    pub async fn run(self, shutdown: CancellationToken) -> Result<()> {
        loop {
            let accepted = tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("SOCKS5 proxy shutting down");
                    return Ok(());
                }
                accepted = self.listener.accept() => accepted,
            };

            let (inbound, peer_addr) = match accepted {
                Ok(accepted) => accepted,
                Err(e) => {
                    error!("Failed to accept connection: {}", e);
                    accept_error_pause(&shutdown).await;
                    continue;
                }
            };

            if let Err(e) = inbound.set_nodelay(true) {
                debug!("Failed to set TCP_NODELAY for {}: {}", peer_addr, e);
            }

            let dialer = self.dialer.clone();
            let resolver = self.resolver.clone();
            let config = self.config.clone();
            let shutdown = shutdown.clone();

            tokio::spawn(async move {
                debug!("New client: {}", peer_addr);

                tokio::select! {
                    result = handle_socks5_on_stream(inbound, &*dialer, &*resolver, &config, &shutdown) => {
                        if let Err(e) = result {
                            error!("Connection error from {}: {:#}", peer_addr, e);
                        }
                    }
                    _ = shutdown.cancelled() => {
                        debug!("Closing client {} on shutdown", peer_addr);
                    }
                }
            });
        }
    }
}

/// Wait out [`ACCEPT_ERROR_DELAY`], or less if `shutdown` fires
async fn accept_error_pause(shutdown: &CancellationToken) {
    tokio::select! {
        _ = shutdown.cancelled() => {}
        _ = tokio::time::sleep(ACCEPT_ERROR_DELAY) => {}
    }
}
