//! Shutdown coordination through a cancellable lifecycle context.

use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};

/// A cancellable context shared by everything one `Commander::start` builds.
///
/// Cancellation is idempotent and terminal: once cancelled, a context (and
/// every child derived from it) stays cancelled.
#[derive(Debug, Clone, Default)]
pub struct LifecycleContext {
    token: CancellationToken,
}

impl LifecycleContext {
    /// Create a new root context.
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
        }
    }

    /// Derive a child context. Cancelling the parent cancels the child, not
    /// the other way around.
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
        }
    }

    /// Trigger cancellation. Safe to call any number of times.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Whether cancellation has been triggered.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolve once the context is cancelled.
    pub fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.token.cancelled()
    }
}
