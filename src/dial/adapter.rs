//! Cancellation-aware wrapper around a plain [`Dial`]

use super::{BoxedConnection, ContextDial, Dial};
use crate::error::DialError;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// Exposes a [`Dial`] as a [`ContextDial`]
///
/// The inner dial races the token. Whichever finishes first decides the
/// result; a connection that completes after cancellation is dropped.
#[derive(Debug)]
pub struct DialAdapter<D> {
    inner: D,
}

impl<D: Dial> DialAdapter<D> {
    /// Wrap `inner`
    pub fn new(inner: D) -> Self {
        Self { inner }
    }

    /// The wrapped dialer
    pub fn inner(&self) -> &D {
        &self.inner
    }
}

#[async_trait]
impl<D: Dial> ContextDial for DialAdapter<D> {
    async fn dial_context(
        &self,
        cancel: &CancellationToken,
        network: &str,
        address: &str,
    ) -> Result<BoxedConnection, DialError> {
        if cancel.is_cancelled() {
            return Err(DialError::Cancelled);
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!(network = %network, address = %address, "Dial cancelled");
                Err(DialError::Cancelled)
            }
            result = self.inner.dial(network, address) => result,
        }
    }
}
