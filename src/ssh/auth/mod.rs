//! Credential resolution
//!
//! Turns the SSH configuration into the ordered list of authentication
//! methods offered to the server: one public key method (agent keys first,
//! then key files) followed by password authentication.

mod agent;
mod keys;

pub use agent::{connect_agent, AgentSigner};
pub use keys::{key_fingerprint, load_private_key, parse_private_key};

use crate::config::SshConfig;
use crate::error::Result;
use russh::keys::{PrivateKey, PublicKey};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};

/// A key the client can prove possession of
#[derive(Debug, Clone)]
pub enum Signer {
    /// Identity held by the SSH agent
    Agent(PublicKey),
    /// Key loaded from a private key file
    File {
        /// Where the key was loaded from
        path: PathBuf,
        /// The decoded private key
        key: Arc<PrivateKey>,
    },
}

impl Signer {
    /// Public half of the key
    pub fn public_key(&self) -> &PublicKey {
        match self {
            Signer::Agent(key) => key,
            Signer::File { key, .. } => key.public_key(),
        }
    }

    /// SHA256 fingerprint of the key
    pub fn fingerprint(&self) -> String {
        key_fingerprint(self.public_key())
    }
}

/// Public key authentication backed by agent identities and key files
#[derive(Debug, Default)]
pub struct PublicKeyMethod {
    signers: Vec<Signer>,
    agent: Option<AgentSigner>,
}

impl PublicKeyMethod {
    /// Signers in the order they are offered
    pub fn signers(&self) -> &[Signer] {
        &self.signers
    }

    /// Split into the signers and the agent connection used for agent keys
    pub fn into_parts(self) -> (Vec<Signer>, Option<AgentSigner>) {
        (self.signers, self.agent)
    }
}

/// One way of authenticating to the server
pub enum AuthMethod {
    /// Offer every signer, in order
    PublicKeys(PublicKeyMethod),
    /// Send the configured password (possibly empty)
    Password(String),
}

impl fmt::Debug for AuthMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthMethod::PublicKeys(method) => f.debug_tuple("PublicKeys").field(method).finish(),
            AuthMethod::Password(_) => f.write_str("Password([hidden])"),
        }
    }
}

/// Ordered credentials offered during the handshake
#[derive(Debug)]
pub struct CredentialChain {
    methods: Vec<AuthMethod>,
}

impl CredentialChain {
    /// Methods in the order they are tried
    pub fn methods(&self) -> &[AuthMethod] {
        &self.methods
    }

    /// Consume the chain, yielding its methods in order
    pub fn into_methods(self) -> Vec<AuthMethod> {
        self.methods
    }
}

/// Build the credential chain for `config`
///
/// Agent identities come first, then each configured key file. A missing
/// agent is only a warning; an unreachable agent or an unreadable key file
/// is an error.
pub async fn resolve_credentials(config: &SshConfig) -> Result<CredentialChain> {
    let mut method = PublicKeyMethod::default();

    match config.agent_addr.as_deref().filter(|addr| !addr.is_empty()) {
        Some(addr) => {
            let (agent, identities) = connect_agent(addr).await?;
            method
                .signers
                .extend(identities.into_iter().map(Signer::Agent));
            method.agent = Some(agent);
        }
        None => warn!("SSH agent connection not configured"),
    }

    for path in &config.private_keys {
        let key = load_private_key(path)?;
        method.signers.push(Signer::File {
            path: path.clone(),
            key: Arc::new(key),
        });
    }

    for signer in &method.signers {
        debug!(fingerprint = %signer.fingerprint(), "Resolved public key signer");
    }

    Ok(CredentialChain {
        methods: vec![
            AuthMethod::PublicKeys(method),
            AuthMethod::Password(config.password.clone()),
        ],
    })
}
