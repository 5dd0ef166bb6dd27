//! SSH client handler
//!
//! Implements the russh client `Handler`, delegating host key checks to the
//! configured [`HostKeyVerifier`].

use super::host_key::HostKeyVerifier;
use russh::client::Handler;
use russh::keys::PublicKey;
use std::sync::Arc;
use thiserror::Error;

/// Errors surfaced by the client handler during the handshake
#[derive(Error, Debug)]
pub enum HandlerError {
    /// Protocol or transport failure
    #[error(transparent)]
    Ssh(#[from] russh::Error),

    /// The verifier refused the server's host key
    #[error("{0}")]
    HostKeyRejected(String),
}

/// russh client handler for the tunnel session
#[derive(Debug)]
pub struct ClientHandler {
    host: String,
    port: u16,
    verifier: Arc<dyn HostKeyVerifier>,
}

impl ClientHandler {
    /// Create a handler for the server at `host:port`
    pub fn new(host: impl Into<String>, port: u16, verifier: Arc<dyn HostKeyVerifier>) -> Self {
        Self {
            host: host.into(),
            port,
            verifier,
        }
    }
}

impl Handler for ClientHandler {
    type Error = HandlerError;

    async fn check_server_key(&mut self, server_public_key: &PublicKey) -> Result<bool, Self::Error> {
        self.verifier
            .verify(&self.host, self.port, server_public_key)
            .await
            .map_err(|e| HandlerError::HostKeyRejected(e.to_string()))?;
        Ok(true)
    }
}
