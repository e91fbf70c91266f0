//! Shared subscription helpers.

use std::sync::Arc;

use tracing::debug;

use crate::sink::ErrorSink;
use crate::telemetry;
use crate::traits::{Subscriber, Subscription};
use crate::GleipnirError;

/// A subscription that does nothing. Handed to consumers of streams that
/// terminate before any demand could matter.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmptySubscription;

impl Subscription for EmptySubscription {
    fn request(&self, _n: u64) {}

    fn cancel(&self) {}
}

/// Subscribe `subscriber` to nothing and complete it immediately.
pub fn complete_empty<T, S>(subscriber: &mut S)
where
    S: Subscriber<T> + ?Sized,
{
    subscriber.on_subscribe(Arc::new(EmptySubscription));
    subscriber.on_complete();
}

/// Report a protocol violation through `sink`.
pub fn report_violation(sink: &dyn ErrorSink, err: GleipnirError) {
    debug_assert!(err.is_protocol_violation());
    debug!(kind = err.kind(), "protocol violation");
    metrics::counter!(telemetry::PROTOCOL_VIOLATIONS_TOTAL, "kind" => err.kind()).increment(1);
    sink.report(err);
}

/// Check that a demand request is positive, reporting it otherwise.
///
/// Returns `true` when the request may proceed.
pub fn validate_demand(n: u64, sink: &dyn ErrorSink) -> bool {
    if n == 0 {
        report_violation(sink, GleipnirError::InvalidDemand(n));
        return false;
    }
    true
}

/// Reject a second subscription: cancel the late arrival and report it.
pub fn reject_duplicate(late: &dyn Subscription, sink: &dyn ErrorSink) {
    late.cancel();
    report_violation(sink, GleipnirError::DuplicateSubscription);
}
