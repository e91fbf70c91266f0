//! Fallback sink for errors that cannot be delivered downstream.
//!
//! A stage that already delivered its terminal signal cannot pass a late
//! error to its consumer, and protocol violations have no consumer-facing
//! channel at all. Both end up here instead of being dropped.
//!
//! The process-wide sink is installed once via [`install`] and defaults to
//! [`TracingSink`]. Stages can also be handed a sink directly, which is what
//! tests do with [`CapturingSink`].

use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use tracing::{error, warn};

use crate::{GleipnirError, Result};

/// Receiver of errors that have nowhere else to go.
pub trait ErrorSink: Send + Sync {
    /// Report an error. Must not panic.
    fn report(&self, error: GleipnirError);
}

/// Default sink: logs through `tracing`.
///
/// Protocol violations are logged at `warn`, everything else at `error`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl ErrorSink for TracingSink {
    fn report(&self, err: GleipnirError) {
        if err.is_protocol_violation() {
            warn!(kind = err.kind(), error = %err, "back-pressure protocol violation");
        } else {
            error!(kind = err.kind(), error = %err, "undeliverable stream error");
        }
    }
}

/// Sink that keeps every reported error in memory.
#[derive(Debug, Default)]
pub struct CapturingSink {
    errors: Mutex<Vec<GleipnirError>>,
}

impl CapturingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of errors reported so far.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Remove and return every captured error, oldest first.
    pub fn take(&self) -> Vec<GleipnirError> {
        std::mem::take(&mut *self.lock())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<GleipnirError>> {
        self.errors.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ErrorSink for CapturingSink {
    fn report(&self, error: GleipnirError) {
        self.lock().push(error);
    }
}

static GLOBAL_SINK: OnceLock<Arc<dyn ErrorSink>> = OnceLock::new();

/// Install the process-wide fallback sink.
///
/// Can only succeed once; later calls return
/// [`GleipnirError::Configuration`] and leave the first sink in place.
pub fn install(sink: Arc<dyn ErrorSink>) -> Result<()> {
    GLOBAL_SINK
        .set(sink)
        .map_err(|_| GleipnirError::Configuration("error sink already installed".to_string()))
}

/// The process-wide fallback sink, or a [`TracingSink`] if none was installed.
pub fn global() -> Arc<dyn ErrorSink> {
    match GLOBAL_SINK.get() {
        Some(sink) => Arc::clone(sink),
        None => Arc::new(TracingSink),
    }
}
