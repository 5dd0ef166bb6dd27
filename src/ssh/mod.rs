//! SSH side of the proxy
//!
//! Credential resolution, host key verification and the tunnel session that
//! carries forwarded connections.

pub mod auth;
mod handler;
pub mod host_key;
mod tunnel;

pub use auth::{resolve_credentials, AuthMethod, CredentialChain, Signer};
pub use handler::{ClientHandler, HandlerError};
pub use host_key::{verifier_for, AcceptAny, HostKeyVerifier, KnownHostsStore, PinnedFingerprint};
pub use tunnel::SshTunnel;
