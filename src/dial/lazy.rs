//! Lazily created, shared dialer
//!
//! The first dial builds the real dialer through a factory; every later
//! dial reuses it. A failed build is remembered and returned to every
//! subsequent caller without calling the factory again.

use super::{BoxedConnection, ContextDial};
use crate::error::{DialError, Error};
use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt, Shared};
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, OnceLock};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

type Outcome = Result<Arc<dyn ContextDial>, Arc<Error>>;
type Factory = Box<dyn Fn() -> BoxFuture<'static, Result<Arc<dyn ContextDial>, Error>> + Send + Sync>;

/// Observable state of a [`LazyDialer`]
#[derive(Debug, Clone)]
pub enum LazyState {
    /// Nothing built yet (or the build is still running)
    Empty,
    /// The real dialer is available
    Ready,
    /// The build failed; this error is returned to every caller
    Failed(Arc<Error>),
}

/// Dialer that builds its real dialer on first use
///
/// Concurrent first callers share a single build: the factory runs exactly
/// once for the lifetime of the value, and a caller dropping out half way
/// does not restart it.
pub struct LazyDialer {
    factory: Factory,
    ready: OnceLock<Outcome>,
    pending: Mutex<Option<Shared<BoxFuture<'static, Outcome>>>>,
}

impl fmt::Debug for LazyDialer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyDialer")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl LazyDialer {
    /// Create a lazy dialer around `factory`; nothing runs until the first dial
    pub fn new<F, Fut, D>(factory: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<D, Error>> + Send + 'static,
        D: ContextDial + 'static,
    {
        let factory: Factory = Box::new(move || {
            let creating = factory();
            async move { creating.await.map(|d| Arc::new(d) as Arc<dyn ContextDial>) }.boxed()
        });

        Self {
            factory,
            ready: OnceLock::new(),
            pending: Mutex::new(None),
        }
    }

    /// Current state
    pub fn state(&self) -> LazyState {
        match self.ready.get() {
            None => LazyState::Empty,
            Some(Ok(_)) => LazyState::Ready,
            Some(Err(e)) => LazyState::Failed(e.clone()),
        }
    }

    async fn resolve(&self) -> Outcome {
        if let Some(outcome) = self.ready.get() {
            return outcome.clone();
        }

        let pending = {
            let mut slot = self.pending.lock().unwrap_or_else(|p| p.into_inner());
            slot.get_or_insert_with(|| self.start()).clone()
        };

        let outcome = pending.await;
        if self.ready.set(outcome.clone()).is_ok() {
            self.pending.lock().unwrap_or_else(|p| p.into_inner()).take();
        }
        outcome
    }

    fn start(&self) -> Shared<BoxFuture<'static, Outcome>> {
        info!("Creating tunnel dialer");
        let creating = (self.factory)();

        async move {
            match creating.await {
                Ok(dialer) => {
                    info!("Tunnel dialer ready");
                    Ok(dialer)
                }
                Err(e) => {
                    error!(error = %e, "Failed to create tunnel dialer");
                    Err(Arc::new(e))
                }
            }
        }
        .boxed()
        .shared()
    }
}

#[async_trait]
impl ContextDial for LazyDialer {
    async fn dial_context(
        &self,
        cancel: &CancellationToken,
        network: &str,
        address: &str,
    ) -> Result<BoxedConnection, DialError> {
        let dialer = self.resolve().await.map_err(DialError::Setup)?;
        dialer.dial_context(cancel, network, address).await
    }
}
