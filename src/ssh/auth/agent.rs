//! SSH agent access
//!
//! Connects to a running agent over its unix socket, lists the identities it
//! holds and asks it to sign authentication challenges.

use crate::error::{Error, Result};
use russh::client;
use russh::keys::{HashAlg, PublicKey};
use std::fmt;

#[cfg(unix)]
use russh::keys::agent::client::AgentClient;

/// Live connection to an SSH agent, used to sign with its keys
pub struct AgentSigner {
    addr: String,
    #[cfg(unix)]
    client: AgentClient<tokio::net::UnixStream>,
}

impl fmt::Debug for AgentSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentSigner")
            .field("addr", &self.addr)
            .finish_non_exhaustive()
    }
}

/// Connect to the agent at `addr` and list its identities
#[cfg(unix)]
pub async fn connect_agent(addr: &str) -> Result<(AgentSigner, Vec<PublicKey>)> {
    let agent_error = |reason: String| Error::AgentConnection {
        addr: addr.to_string(),
        reason,
    };

    let mut client = AgentClient::connect_uds(addr)
        .await
        .map_err(|e| agent_error(e.to_string()))?;
    let identities = client
        .request_identities()
        .await
        .map_err(|e| agent_error(e.to_string()))?;

    tracing::debug!(agent = %addr, keys = identities.len(), "Listed SSH agent identities");

    Ok((
        AgentSigner {
            addr: addr.to_string(),
            client,
        },
        identities,
    ))
}

/// Connect to the agent at `addr` and list its identities
#[cfg(not(unix))]
pub async fn connect_agent(addr: &str) -> Result<(AgentSigner, Vec<PublicKey>)> {
    Err(Error::AgentConnection {
        addr: addr.to_string(),
        reason: "agent sockets are only supported on unix".to_string(),
    })
}

impl AgentSigner {
    /// Offer `key` to the server, letting the agent sign the challenge
    ///
    /// Returns `Ok(false)` when the server rejects the key. `Err` carries
    /// agent or transport failures.
    #[cfg(unix)]
    pub async fn authenticate<H: client::Handler>(
        &mut self,
        handle: &mut client::Handle<H>,
        user: &str,
        key: PublicKey,
        hash_alg: Option<HashAlg>,
    ) -> std::result::Result<bool, String> {
        handle
            .authenticate_publickey_with(user, key, hash_alg, &mut self.client)
            .await
            .map(|result| result.success())
            .map_err(|e| e.to_string())
    }

    /// Offer `key` to the server, letting the agent sign the challenge
    #[cfg(not(unix))]
    pub async fn authenticate<H: client::Handler>(
        &mut self,
        _handle: &mut client::Handle<H>,
        _user: &str,
        _key: PublicKey,
        _hash_alg: Option<HashAlg>,
    ) -> std::result::Result<bool, String> {
        Err("agent sockets are only supported on unix".to_string())
    }
}
