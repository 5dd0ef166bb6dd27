//! Bidirectional byte relay between the SOCKS5 client and a forwarded connection

use anyhow::Result;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::debug;

/// Relay data in both directions until either side closes
///
/// Returns `(client_to_target, target_to_client)` byte counts.
pub async fn relay_tcp<A, B>(client: &mut A, target: &mut B) -> Result<(u64, u64)>
where
    A: AsyncRead + AsyncWrite + Unpin + ?Sized,
    B: AsyncRead + AsyncWrite + Unpin + ?Sized,
{
    let (up, down) = tokio::io::copy_bidirectional(client, target).await?;
    debug!("Relay finished: {} bytes up, {} bytes down", up, down);
    Ok((up, down))
}
