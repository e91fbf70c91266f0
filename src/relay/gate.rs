//! Demand controller of a limit stage.
//!
//! The gate is what the consumer sees as its [`Subscription`]. It owns the
//! demand budget: the amount of demand that may still be forwarded upstream.
//! The budget starts at the stage limit and only ever shrinks, so the sum of
//! everything forwarded can never exceed the limit, however many threads
//! call [`request`](Subscription::request) at once.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::trace;

use crate::sink::ErrorSink;
use crate::subscription::validate_demand;
use crate::telemetry;
use crate::traits::Subscription;

/// Bounded forwarder of consumer demand to the producer.
pub struct DemandGate {
    /// Demand not yet forwarded upstream. Starts at the limit.
    budget: AtomicU64,
    upstream: Arc<dyn Subscription>,
    sink: Arc<dyn ErrorSink>,
}

impl DemandGate {
    /// Create a gate over `upstream` that forwards at most `limit` demand in total.
    pub fn new(upstream: Arc<dyn Subscription>, limit: u64, sink: Arc<dyn ErrorSink>) -> Self {
        Self {
            budget: AtomicU64::new(limit),
            upstream,
            sink,
        }
    }

    /// Demand that may still be forwarded upstream.
    pub fn budget(&self) -> u64 {
        self.budget.load(Ordering::Acquire)
    }

    /// The producer's subscription.
    pub(crate) fn upstream(&self) -> &dyn Subscription {
        self.upstream.as_ref()
    }
}

impl Subscription for DemandGate {
    fn request(&self, n: u64) {
        if !validate_demand(n, self.sink.as_ref()) {
            return;
        }
        loop {
            let current = self.budget.load(Ordering::Acquire);
            if current == 0 {
                trace!(requested = n, "demand budget exhausted");
                break;
            }
            let to_forward = current.min(n);
            if self
                .budget
                .compare_exchange_weak(
                    current,
                    current - to_forward,
                    Ordering::AcqRel,
                    Ordering::Acquire,
                )
                .is_ok()
            {
                metrics::counter!(telemetry::DEMAND_FORWARDED_TOTAL).increment(to_forward);
                self.upstream.request(to_forward);
                break;
            }
        }
    }

    fn cancel(&self) {
        self.upstream.cancel();
    }
}

impl fmt::Debug for DemandGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DemandGate")
            .field("budget", &self.budget())
            .finish_non_exhaustive()
    }
}
