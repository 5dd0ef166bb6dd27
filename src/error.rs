//! Error types for sshsocks
//!
//! This module defines the error taxonomy shared by credential resolution,
//! tunnel establishment and per-request forwarding.

use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Main error type for configuration, credential and tunnel failures
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed or missing configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// The SSH agent socket could not be opened or queried
    #[error("SSH agent error at {addr}: {reason}")]
    AgentConnection {
        /// Agent socket address
        addr: String,
        /// Underlying failure
        reason: String,
    },

    /// A private key file could not be read or parsed
    #[error("Failed to load private key {path:?}: {reason}")]
    KeyLoad {
        /// Path of the offending key file
        path: PathBuf,
        /// Underlying failure
        reason: String,
    },

    /// The transport connection to the SSH server failed
    #[error("Failed to dial SSH server {addr}: {reason}")]
    DialFailed {
        /// SSH server address
        addr: String,
        /// Underlying failure
        reason: String,
    },

    /// SSH negotiation failed or every authentication method was rejected
    #[error("SSH handshake with {addr} failed: {reason}")]
    HandshakeFailed {
        /// SSH server address
        addr: String,
        /// Underlying failure
        reason: String,
    },

    /// Host key store could not be used
    #[error("Host key error: {0}")]
    HostKey(String),
}

/// Result alias for [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by a single dial through the tunnel
#[derive(Error, Debug, Clone)]
pub enum DialError {
    /// The shared tunnel could not be created; cached for every caller
    #[error("Tunnel unavailable: {0}")]
    Setup(Arc<Error>),

    /// The tunnel is up but this forwarded connection failed
    #[error("Forwarding to {network}/{address} failed: {reason}")]
    Forward {
        /// Requested network
        network: String,
        /// Requested address
        address: String,
        /// Underlying failure
        reason: String,
    },

    /// The caller cancelled the dial before it completed
    #[error("Dial cancelled")]
    Cancelled,

    /// The requested network is not supported by the tunnel
    #[error("Unsupported network: {0}")]
    UnsupportedNetwork(String),

    /// The address could not be split into host and port
    #[error("Invalid address: {0}")]
    InvalidAddress(String),
}

/// Reply codes for SOCKS5 protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Socks5ReplyCode {
    /// Command succeeded
    Succeeded = 0x00,
    /// General SOCKS server failure
    GeneralFailure = 0x01,
    /// Connection not allowed by ruleset
    ConnectionNotAllowed = 0x02,
    /// Network unreachable
    NetworkUnreachable = 0x03,
    /// Host unreachable
    HostUnreachable = 0x04,
    /// Connection refused
    ConnectionRefused = 0x05,
    /// TTL expired
    TtlExpired = 0x06,
    /// Command not supported
    CommandNotSupported = 0x07,
    /// Address type not supported
    AddressTypeNotSupported = 0x08,
}

impl From<Socks5ReplyCode> for u8 {
    fn from(code: Socks5ReplyCode) -> Self {
        code as u8
    }
}

impl From<&DialError> for Socks5ReplyCode {
    fn from(err: &DialError) -> Self {
        match err {
            DialError::Setup(_) => Socks5ReplyCode::NetworkUnreachable,
            DialError::Forward { .. } => Socks5ReplyCode::ConnectionRefused,
            DialError::Cancelled => Socks5ReplyCode::TtlExpired,
            DialError::UnsupportedNetwork(_) => Socks5ReplyCode::CommandNotSupported,
            DialError::InvalidAddress(_) => Socks5ReplyCode::AddressTypeNotSupported,
        }
    }
}
