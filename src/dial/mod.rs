//! Dialing through the tunnel
//!
//! [`Dial`] is the plain "open a forwarded connection" capability of an SSH
//! session. [`ContextDial`] adds a cancellation token and is what the
//! SOCKS5 front-end consumes. [`DialAdapter`] turns the former into the
//! latter, and [`LazyDialer`] defers building the whole stack until the
//! first request arrives.

mod adapter;
mod lazy;

pub use adapter::DialAdapter;
pub use lazy::{LazyDialer, LazyState};

use crate::error::DialError;
use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::sync::CancellationToken;

/// A bidirectional byte stream returned by a dial
pub trait Connection: AsyncRead + AsyncWrite + Unpin + Send {}

/// Blanket implementation: any type implementing the required traits is a Connection.
impl<T: AsyncRead + AsyncWrite + Unpin + Send> Connection for T {}

/// Boxed [`Connection`]
pub type BoxedConnection = Box<dyn Connection>;

/// Opens connections without a cancellation token
#[async_trait]
pub trait Dial: Send + Sync {
    /// Open a connection to `address` on `network` ("tcp", "tcp4", "tcp6" or "unix")
    async fn dial(&self, network: &str, address: &str) -> Result<BoxedConnection, DialError>;
}

/// Opens connections, giving up when `cancel` fires
#[async_trait]
pub trait ContextDial: Send + Sync {
    /// Open a connection to `address` on `network`, or fail with
    /// [`DialError::Cancelled`] once `cancel` is triggered
    async fn dial_context(
        &self,
        cancel: &CancellationToken,
        network: &str,
        address: &str,
    ) -> Result<BoxedConnection, DialError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    struct DuplexDialer;

    #[async_trait]
    impl Dial for DuplexDialer {
        async fn dial(&self, _network: &str, address: &str) -> Result<BoxedConnection, DialError> {
            let (client, mut server) = tokio::io::duplex(64);
            let greeting = address.to_string();
            tokio::spawn(async move {
                let _ = server.write_all(greeting.as_bytes()).await;
            });
            Ok(Box::new(client))
        }
    }

    #[test]
    fn test_connection_trait_objects() {
        fn assert_connection<T: Connection>() {}
        assert_connection::<tokio::io::DuplexStream>();
        assert_connection::<tokio::net::TcpStream>();
        assert_connection::<BoxedConnection>();
    }

    #[tokio::test]
    async fn test_dial_trait_object() {
        let dialer: Box<dyn Dial> = Box::new(DuplexDialer);
        let mut conn = dialer.dial("tcp", "example.com:80").await.unwrap();

        let mut buf = [0u8; 14];
        conn.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"example.com:80");
    }
}
