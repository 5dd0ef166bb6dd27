//! SOCKS5 method negotiation
//!
//! The proxy listens on a local address and offers only the "no
//! authentication" method. Clients that do not list it are refused.

use super::consts::*;
use anyhow::{bail, Result};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Read the client greeting and select "no authentication"
///
/// Replies `0xFF` and fails when the client does not offer it.
pub async fn negotiate_auth<S>(stream: &mut S) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut buf = [0u8; 2];
    stream.read_exact(&mut buf).await?;

    let version = buf[0];
    let num_methods = buf[1];

    if version != SOCKS5_VERSION {
        bail!("Unsupported SOCKS version: {}", version);
    }

    let mut methods = vec![0u8; num_methods as usize];
    stream.read_exact(&mut methods).await?;

    let selected = if methods.contains(&SOCKS5_AUTH_METHOD_NONE) {
        SOCKS5_AUTH_METHOD_NONE
    } else {
        SOCKS5_AUTH_METHOD_NOT_ACCEPTABLE
    };

    stream.write_all(&[SOCKS5_VERSION, selected]).await?;
    stream.flush().await?;

    if selected == SOCKS5_AUTH_METHOD_NOT_ACCEPTABLE {
        bail!("No acceptable authentication method in {:?}", methods);
    }

    Ok(())
}
