//! Tagged-variant form of the protocol signals.

use std::fmt;
use std::sync::Arc;

use crate::GleipnirError;
use crate::traits::Subscription;

/// Every signal a relay stage can receive, from either direction.
///
/// Producer-side signals: `Subscribe`, `Next`, `Error`, `Complete`.
/// Consumer-side signals: `Request`, `Cancel`.
pub enum Signal<T> {
    Subscribe(Arc<dyn Subscription>),
    Next(T),
    Error(GleipnirError),
    Complete,
    Request(u64),
    Cancel,
}

impl<T> Signal<T> {
    /// Short name, used in log fields.
    pub fn name(&self) -> &'static str {
        match self {
            Signal::Subscribe(_) => "subscribe",
            Signal::Next(_) => "next",
            Signal::Error(_) => "error",
            Signal::Complete => "complete",
            Signal::Request(_) => "request",
            Signal::Cancel => "cancel",
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Subscribe(_) => f.write_str("Subscribe"),
            Signal::Next(item) => f.debug_tuple("Next").field(item).finish(),
            Signal::Error(error) => f.debug_tuple("Error").field(error).finish(),
            Signal::Complete => f.write_str("Complete"),
            Signal::Request(n) => f.debug_tuple("Request").field(n).finish(),
            Signal::Cancel => f.write_str("Cancel"),
        }
    }
}
