//! Name resolution for SOCKS5 requests
//!
//! Hostnames must be resolved on the far side of the tunnel, so the default
//! resolver never looks anything up: it returns no address and the request
//! is dialed with the original `host:port`.

use async_trait::async_trait;
use std::io;
use std::net::IpAddr;
use tokio_util::sync::CancellationToken;

/// Resolves hostnames from SOCKS5 requests
#[async_trait]
pub trait NameResolver: Send + Sync {
    /// Resolve `name`
    ///
    /// Returns the (possibly derived) cancellation token to use for the
    /// rest of the request, plus an address if one was found. `None` means
    /// "dial the hostname unchanged".
    async fn resolve(
        &self,
        cancel: CancellationToken,
        name: &str,
    ) -> io::Result<(CancellationToken, Option<IpAddr>)>;
}

/// Resolver that never resolves
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopResolver;

#[async_trait]
impl NameResolver for NoopResolver {
    async fn resolve(
        &self,
        cancel: CancellationToken,
        _name: &str,
    ) -> io::Result<(CancellationToken, Option<IpAddr>)> {
        Ok((cancel, None))
    }
}
