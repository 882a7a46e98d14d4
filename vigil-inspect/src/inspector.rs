//! The page inspector port
//!
//! One call, one isolated inspection session. Sessions are counted through
//! `SessionGauge` and released by RAII on every exit path.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use thiserror::Error;

use vigil_core::PageSignal;

/// Errors from a page inspection.
///
/// Only unrecoverable conditions are errors. A redirect wait that elapses
/// without a pattern match is the normal non-redirect outcome and never
/// surfaces here.
#[derive(Debug, Error)]
pub enum InspectError {
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(String),

    #[error("navigation failed: {0}")]
    Navigation(String),

    #[error("render service error: {0}")]
    Render(String),

    #[error("invalid redirect pattern: {0}")]
    Pattern(String),
}

/// Capability to perform one page inspection
#[async_trait]
pub trait PageInspector: Send + Sync {
    /// Inspect the page at `url` and return the observed signal.
    async fn inspect(&self, url: &str) -> Result<PageSignal, InspectError>;
}

/// Shared handle to an inspector
pub type SharedInspector = Arc<dyn PageInspector>;

/// Counts live inspection sessions.
///
/// `acquire` hands out a guard; the count drops when the guard drops, so a
/// session can never leak past an early return or error.
#[derive(Debug, Clone, Default)]
pub struct SessionGauge {
    live: Arc<AtomicUsize>,
}

impl SessionGauge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a session, returning its release guard.
    pub fn acquire(&self) -> SessionGuard {
        self.live.fetch_add(1, Ordering::SeqCst);
        SessionGuard {
            live: Arc::clone(&self.live),
        }
    }

    /// Number of sessions currently open
    pub fn live(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }
}

/// Releases one session when dropped
pub struct SessionGuard {
    live: Arc<AtomicUsize>,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}
