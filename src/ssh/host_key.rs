//! Server host key verification
//!
//! The SSH handshake asks a [`HostKeyVerifier`] whether the server's key is
//! acceptable. Three policies are provided: accept anything (the default,
//! with a warning), a single pinned fingerprint, and trust-on-first-use
//! backed by an OpenSSH `known_hosts` file.

use super::auth::key_fingerprint;
use crate::config::HostKeyPolicy;
use crate::error::{Error, Result};
use crate::transport::join_host_port;
use async_trait::async_trait;
use russh::keys::PublicKey;
use std::fmt::Debug;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Decides whether a server host key is trusted
#[async_trait]
pub trait HostKeyVerifier: Send + Sync + Debug {
    /// Return `Ok(())` to accept `key` for `host:port`
    async fn verify(&self, host: &str, port: u16, key: &PublicKey) -> Result<()>;
}

/// Build the verifier for a configured policy
pub fn verifier_for(policy: &HostKeyPolicy) -> Arc<dyn HostKeyVerifier> {
    match policy {
        HostKeyPolicy::AcceptAny => Arc::new(AcceptAny),
        HostKeyPolicy::Fingerprint(fp) => Arc::new(PinnedFingerprint::new(fp.clone())),
        HostKeyPolicy::KnownHosts(path) => Arc::new(KnownHostsStore::new(path.clone())),
    }
}

/// Accepts every host key
#[derive(Debug, Default, Clone, Copy)]
pub struct AcceptAny;

#[async_trait]
impl HostKeyVerifier for AcceptAny {
    async fn verify(&self, host: &str, port: u16, key: &PublicKey) -> Result<()> {
        warn!(
            server = %join_host_port(host, port),
            fingerprint = %key_fingerprint(key),
            "Accepting SSH host key without verification"
        );
        Ok(())
    }
}

/// Accepts exactly one key, identified by its SHA256 fingerprint
#[derive(Debug, Clone)]
pub struct PinnedFingerprint {
    expected: String,
}

impl PinnedFingerprint {
    /// Pin `fingerprint`; the `SHA256:` prefix is optional
    pub fn new(fingerprint: impl Into<String>) -> Self {
        let fingerprint = fingerprint.into();
        let expected = if fingerprint.starts_with("SHA256:") {
            fingerprint
        } else {
            format!("SHA256:{}", fingerprint)
        };
        Self { expected }
    }
}

#[async_trait]
impl HostKeyVerifier for PinnedFingerprint {
    async fn verify(&self, host: &str, port: u16, key: &PublicKey) -> Result<()> {
        let actual = key_fingerprint(key);
        if actual == self.expected {
            Ok(())
        } else {
            Err(Error::HostKey(format!(
                "{} presented {}, expected {}",
                join_host_port(host, port),
                actual,
                self.expected
            )))
        }
    }
}

/// Trust-on-first-use over an OpenSSH `known_hosts` file
///
/// Unknown servers are appended on first contact; known servers must present
/// a recorded key. Entries use the OpenSSH host syntax, so the file can be
/// shared with `ssh`.
#[derive(Debug)]
pub struct KnownHostsStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl KnownHostsStore {
    /// Store backed by `path`; the file is created on first write
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }
}

#[async_trait]
impl HostKeyVerifier for KnownHostsStore {
    async fn verify(&self, host: &str, port: u16, key: &PublicKey) -> Result<()> {
        // Serialise check+learn so concurrent handshakes agree on one entry
        let _guard = self.lock.lock().await;

        let path = self.path.clone();
        let host = host.to_string();
        let key = key.clone();
        tokio::task::spawn_blocking(move || check_or_learn(&path, &host, port, &key))
            .await
            .map_err(|e| Error::HostKey(format!("known hosts check did not finish: {}", e)))?
    }
}

fn check_or_learn(path: &Path, host: &str, port: u16, key: &PublicKey) -> Result<()> {
    let server = join_host_port(host, port);
    let fingerprint = key_fingerprint(key);

    match russh::keys::check_known_hosts_path(host, port, key, path) {
        Ok(true) => Ok(()),
        Ok(false) => {
            russh::keys::known_hosts::learn_known_hosts_path(host, port, key, path)
                .map_err(|e| Error::HostKey(format!("known hosts file {:?}: {}", path, e)))?;
            info!(server = %server, fingerprint = %fingerprint, "Learned new SSH host key");
            Ok(())
        }
        Err(russh::keys::Error::KeyChanged { line }) => Err(Error::HostKey(format!(
            "{} presented {}, which does not match line {} of {:?}",
            server, fingerprint, line, path
        ))),
        Err(e) => Err(Error::HostKey(format!("known hosts file {:?}: {}", path, e))),
    }
}
