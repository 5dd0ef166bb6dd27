//! SSH tunnel client
//!
//! One authenticated SSH session over which every forwarded connection is
//! opened as a `direct-tcpip` (or `direct-streamlocal`) channel.

use super::auth::{AuthMethod, CredentialChain, Signer};
use super::handler::{ClientHandler, HandlerError};
use super::host_key::HostKeyVerifier;
use crate::config::SshConfig;
use crate::dial::{BoxedConnection, Dial};
use crate::error::{DialError, Error, Result};
use crate::transport::{split_host_port, TcpTransport};
use async_trait::async_trait;
use russh::client::{self, Handle};
use russh::keys::{HashAlg, PrivateKeyWithHashAlg};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Originator reported to the server for forwarded channels
const ORIGINATOR_HOST: &str = "127.0.0.1";
const ORIGINATOR_PORT: u32 = 0;

/// An established, authenticated SSH session
pub struct SshTunnel {
    handle: Handle<ClientHandler>,
    addr: String,
}

impl std::fmt::Debug for SshTunnel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SshTunnel")
            .field("addr", &self.addr)
            .field("closed", &self.handle.is_closed())
            .finish()
    }
}

impl SshTunnel {
    /// Dial the SSH server, run the handshake and authenticate
    pub async fn connect(
        config: &SshConfig,
        credentials: CredentialChain,
        verifier: Arc<dyn HostKeyVerifier>,
    ) -> Result<Self> {
        let addr = config.addr.clone();
        let (host, port) = split_host_port(&addr)
            .ok_or_else(|| Error::Config(format!("Invalid SSH server address: {}", addr)))?;

        let stream = TcpTransport::from_config(config).connect(&addr).await?;

        let russh_config = Arc::new(client_config(config));
        let handler = ClientHandler::new(host, port, verifier);

        let mut handle = client::connect_stream(russh_config, stream, handler)
            .await
            .map_err(|e| match e {
                HandlerError::HostKeyRejected(reason) => Error::HostKey(reason),
                HandlerError::Ssh(e) => Error::HandshakeFailed {
                    addr: addr.clone(),
                    reason: e.to_string(),
                },
            })?;

        authenticate(&mut handle, &config.username, credentials)
            .await
            .map_err(|reason| Error::HandshakeFailed {
                addr: addr.clone(),
                reason,
            })?;

        info!(server = %addr, user = %config.username, "SSH tunnel established");

        Ok(Self { handle, addr })
    }

    /// Whether the underlying session has ended
    pub fn is_closed(&self) -> bool {
        self.handle.is_closed()
    }

    async fn open(&self, network: &str, address: &str) -> std::result::Result<BoxedConnection, DialError> {
        let forward_failed = |e: russh::Error| {
            if self.is_closed() {
                warn!(server = %self.addr, "SSH session is closed; forwarded channels cannot be opened");
            }
            DialError::Forward {
                network: network.to_string(),
                address: address.to_string(),
                reason: e.to_string(),
            }
        };

        match network {
            "tcp" | "tcp4" | "tcp6" => {
                let (host, port) = split_host_port(address)
                    .ok_or_else(|| DialError::InvalidAddress(address.to_string()))?;
                let channel = self
                    .handle
                    .channel_open_direct_tcpip(host, u32::from(port), ORIGINATOR_HOST, ORIGINATOR_PORT)
                    .await
                    .map_err(forward_failed)?;
                Ok(Box::new(channel.into_stream()))
            }
            "unix" => {
                let channel = self
                    .handle
                    .channel_open_direct_streamlocal(address)
                    .await
                    .map_err(forward_failed)?;
                Ok(Box::new(channel.into_stream()))
            }
            other => Err(DialError::UnsupportedNetwork(other.to_string())),
        }
    }
}

#[async_trait]
impl Dial for SshTunnel {
    async fn dial(&self, network: &str, address: &str) -> std::result::Result<BoxedConnection, DialError> {
        debug!(network = %network, address = %address, "Opening forwarded channel");
        self.open(network, address).await
    }
}

/// russh client settings for `config`
fn client_config(config: &SshConfig) -> client::Config {
    client::Config {
        keepalive_interval: config.keepalive(),
        ..Default::default()
    }
}

/// Try each method in order until the server accepts one
///
/// Rejections move on to the next key or method. Transport failures abort.
async fn authenticate(
    handle: &mut Handle<ClientHandler>,
    user: &str,
    credentials: CredentialChain,
) -> std::result::Result<(), String> {
    let rsa_hash: Option<HashAlg> = handle.best_supported_rsa_hash().await.ok().flatten().flatten();

    for method in credentials.into_methods() {
        match method {
            AuthMethod::PublicKeys(method) => {
                let (signers, mut agent) = method.into_parts();
                for signer in signers {
                    let fingerprint = signer.fingerprint();
                    let accepted = match signer {
                        Signer::Agent(public_key) => match agent.as_mut() {
                            Some(agent) => match agent
                                .authenticate(&mut *handle, user, public_key, rsa_hash)
                                .await
                            {
                                Ok(accepted) => accepted,
                                Err(e) => {
                                    warn!(fingerprint = %fingerprint, error = %e, "SSH agent signing failed");
                                    false
                                }
                            },
                            None => false,
                        },
                        Signer::File { key, .. } => handle
                            .authenticate_publickey(user, PrivateKeyWithHashAlg::new(key, rsa_hash))
                            .await
                            .map_err(|e| e.to_string())?
                            .success(),
                    };

                    if accepted {
                        debug!(fingerprint = %fingerprint, "Public key accepted");
                        return Ok(());
                    }
                    debug!(fingerprint = %fingerprint, "Public key rejected");
                }
            }
            AuthMethod::Password(password) => {
                let accepted = handle
                    .authenticate_password(user, password)
                    .await
                    .map_err(|e| e.to_string())?
                    .success();
                if accepted {
                    debug!("Password accepted");
                    return Ok(());
                }
                debug!("Password rejected");
            }
        }
    }

    Err("all authentication methods were rejected".to_string())
}
