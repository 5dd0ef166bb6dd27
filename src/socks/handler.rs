//! Per-connection SOCKS5 handling
//!
//! Negotiates, parses the request, and serves CONNECT by dialing the target
//! through the tunnel. Every other command is refused.

use super::auth::negotiate_auth;
use super::command::{parse_command, send_reply, send_success};
use super::relay::relay_tcp;
use super::resolver::NameResolver;
use super::types::{SocksCommand, TargetAddr};
use crate::config::SocksConfig;
use crate::dial::{BoxedConnection, ContextDial};
use crate::error::Socks5ReplyCode;
use crate::transport::join_host_port;
use anyhow::{anyhow, Context, Result};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Serve one SOCKS5 client on `stream`
///
/// `shutdown` bounds the whole exchange: the dial is abandoned if it fires.
pub async fn handle_socks5_on_stream<S>(
    mut stream: S,
    dialer: &dyn ContextDial,
    resolver: &dyn NameResolver,
    config: &SocksConfig,
    shutdown: &CancellationToken,
) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    negotiate_auth(&mut stream)
        .await
        .context("Authentication negotiation failed")?;

    let (command, target_addr) = match parse_command(&mut stream).await {
        Ok(parsed) => parsed,
        Err(e) => {
            if let Some(code) = e.reply_code() {
                send_reply(&mut stream, code, None).await?;
            }
            return Err(e).context("Failed to parse SOCKS5 command");
        }
    };

    info!("SOCKS5 {} request to {}", command, target_addr);

    match command {
        SocksCommand::Connect => {
            handle_tcp_connect(stream, target_addr, dialer, resolver, config, shutdown).await
        }
        SocksCommand::Bind | SocksCommand::UdpAssociate => {
            warn!("{} command not supported", command);
            send_reply(&mut stream, Socks5ReplyCode::CommandNotSupported, None).await?;
            Ok(())
        }
    }
}

/// Serve CONNECT: dial through the tunnel, reply, then relay
async fn handle_tcp_connect<S>(
    mut client_stream: S,
    target_addr: TargetAddr,
    dialer: &dyn ContextDial,
    resolver: &dyn NameResolver,
    config: &SocksConfig,
    shutdown: &CancellationToken,
) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    let cancel = shutdown.child_token();

    let (cancel, address) = match dial_address(&target_addr, resolver, cancel).await {
        Ok(resolved) => resolved,
        Err(e) => {
            send_reply(&mut client_stream, Socks5ReplyCode::HostUnreachable, None).await?;
            return Err(e).with_context(|| format!("Failed to resolve {}", target_addr));
        }
    };

    let mut target = match dial_with_timeout(dialer, &cancel, &address, config).await {
        Ok(conn) => conn,
        Err((code, e)) => {
            warn!("Failed to connect to {}: {}", address, e);
            send_reply(&mut client_stream, code, None).await?;
            return Err(e);
        }
    };

    send_success(&mut client_stream).await?;
    info!("SOCKS5 tunnel established to {}", address);

    relay_tcp(&mut client_stream, &mut target).await?;
    Ok(())
}

/// Address string handed to the dialer
///
/// Domains go through the resolver; without an answer they are dialed by
/// name so the far side of the tunnel resolves them.
async fn dial_address(
    target: &TargetAddr,
    resolver: &dyn NameResolver,
    cancel: CancellationToken,
) -> std::io::Result<(CancellationToken, String)> {
    match target {
        TargetAddr::Ip(addr) => Ok((cancel, addr.to_string())),
        TargetAddr::Domain(name, port) => {
            let (cancel, resolved) = resolver.resolve(cancel, name).await?;
            let address = match resolved {
                Some(ip) => SocketAddr::new(ip, *port).to_string(),
                None => join_host_port(name, *port),
            };
            debug!("Dialing {} as {}", target, address);
            Ok((cancel, address))
        }
    }
}

async fn dial_with_timeout(
    dialer: &dyn ContextDial,
    cancel: &CancellationToken,
    address: &str,
    config: &SocksConfig,
) -> std::result::Result<BoxedConnection, (Socks5ReplyCode, anyhow::Error)> {
    let timeout = Duration::from_secs(config.request_timeout);

    match tokio::time::timeout(timeout, dialer.dial_context(cancel, "tcp", address)).await {
        Ok(Ok(conn)) => Ok(conn),
        Ok(Err(e)) => Err((Socks5ReplyCode::from(&e), e.into())),
        Err(_) => {
            cancel.cancel();
            Err((
                Socks5ReplyCode::TtlExpired,
                anyhow!("Connection to {} timed out after {:?}", address, timeout),
            ))
        }
    }
}
