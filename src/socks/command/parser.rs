//! SOCKS5 request parser

use crate::error::Socks5ReplyCode;
use crate::socks::consts::*;
use crate::socks::types::{SocksCommand, TargetAddr};
use std::net::{Ipv4Addr, Ipv6Addr};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Malformed or unsupported request
#[derive(Error, Debug)]
pub enum RequestError {
    /// The stream failed or closed mid-request
    #[error("Failed to read request: {0}")]
    Io(#[from] std::io::Error),

    /// Wrong protocol version byte
    #[error("Unsupported SOCKS version in request: {0}")]
    Version(u8),

    /// Command byte outside CONNECT/BIND/UDP ASSOCIATE
    #[error("Unknown command: {0}")]
    UnknownCommand(u8),

    /// Address type byte outside IPv4/domain/IPv6
    #[error("Unsupported address type: {0}")]
    AddressType(u8),

    /// Domain name empty or not UTF-8
    #[error("Invalid domain name: {0}")]
    InvalidDomain(String),
}

impl RequestError {
    /// Reply owed to the client, if the stream is still usable
    pub fn reply_code(&self) -> Option<Socks5ReplyCode> {
        match self {
            RequestError::Io(_) | RequestError::Version(_) => None,
            RequestError::UnknownCommand(_) => Some(Socks5ReplyCode::CommandNotSupported),
            RequestError::AddressType(_) => Some(Socks5ReplyCode::AddressTypeNotSupported),
            RequestError::InvalidDomain(_) => Some(Socks5ReplyCode::GeneralFailure),
        }
    }
}

/// Parse a SOCKS5 request from the stream
///
/// ```text
/// +----+-----+-------+------+----------+----------+
/// |VER | CMD |  RSV  | ATYP | DST.ADDR | DST.PORT |
/// +----+-----+-------+------+----------+----------+
/// | 1  |  1  | X'00' |  1   | Variable |    2     |
/// +----+-----+-------+------+----------+----------+
/// ```
///
/// Domain names are returned as-is; resolving them is left to the caller.
pub async fn parse_command<S>(stream: &mut S) -> Result<(SocksCommand, TargetAddr), RequestError>
where
    S: AsyncRead + Unpin,
{
    let mut header = [0u8; 4];
    stream.read_exact(&mut header).await?;

    let [version, cmd_byte, _reserved, addr_type] = header;

    if version != SOCKS5_VERSION {
        return Err(RequestError::Version(version));
    }

    let command = SocksCommand::from_byte(cmd_byte).ok_or(RequestError::UnknownCommand(cmd_byte))?;
    let target_addr = parse_address(stream, addr_type).await?;

    tracing::debug!("Parsed SOCKS5 command: {} to {}", command, target_addr);

    Ok((command, target_addr))
}

async fn parse_address<S>(stream: &mut S, addr_type: u8) -> Result<TargetAddr, RequestError>
where
    S: AsyncRead + Unpin,
{
    match addr_type {
        SOCKS5_ADDR_TYPE_IPV4 => {
            let mut addr = [0u8; 4];
            stream.read_exact(&mut addr).await?;
            let port = stream.read_u16().await?;
            Ok(TargetAddr::ipv4(Ipv4Addr::from(addr), port))
        }

        SOCKS5_ADDR_TYPE_DOMAIN => {
            let domain_len = stream.read_u8().await? as usize;
            let mut domain_buf = vec![0u8; domain_len];
            stream.read_exact(&mut domain_buf).await?;
            let port = stream.read_u16().await?;

            if domain_len == 0 || domain_len > MAX_DOMAIN_LEN {
                return Err(RequestError::InvalidDomain(format!("length {}", domain_len)));
            }
            let domain = String::from_utf8(domain_buf)
                .map_err(|e| RequestError::InvalidDomain(e.to_string()))?;

            Ok(TargetAddr::domain(domain, port))
        }

        SOCKS5_ADDR_TYPE_IPV6 => {
            let mut addr = [0u8; 16];
            stream.read_exact(&mut addr).await?;
            let port = stream.read_u16().await?;
            Ok(TargetAddr::ipv6(Ipv6Addr::from(addr), port))
        }

        other => Err(RequestError::AddressType(other)),
    }
}
