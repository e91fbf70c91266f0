//! Bounded-demand relay stage.
//!
//! A [`BoundedRelay`] sits between a producer and a consumer and lets at most
//! `limit` items through. It caps demand at the same limit: the consumer's
//! requests are forwarded through a [`DemandGate`] whose budget starts at
//! `limit` and never grows back.
//!
//! Once the last allowed item is delivered the relay cancels the producer and
//! completes the consumer, which from downstream looks exactly like a normal
//! end of stream.
//!
//! # Threading
//!
//! Producer-side signals arrive through `&mut self` and are therefore serial,
//! so `remaining` is a plain counter. Consumer-side signals go to the shared
//! [`DemandGate`], which tolerates concurrent callers.

mod gate;
mod limit;

pub use gate::DemandGate;
pub use limit::{Limit, PublisherExt};

use std::fmt;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::signal::Signal;
use crate::sink::{self, ErrorSink};
use crate::subscription::{complete_empty, reject_duplicate, report_violation};
use crate::telemetry;
use crate::traits::{Subscriber, Subscription};
use crate::GleipnirError;

/// Stage that forwards at most `limit` items and at most `limit` demand.
pub struct BoundedRelay<T> {
    downstream: Box<dyn Subscriber<T>>,
    limit: u64,
    /// Items still allowed downstream. Zero once any terminal signal was sent.
    remaining: u64,
    activated: bool,
    gate: Option<Arc<DemandGate>>,
    sink: Arc<dyn ErrorSink>,
}

impl<T> BoundedRelay<T> {
    /// Create a relay reporting to the process-wide fallback sink.
    pub fn new(downstream: Box<dyn Subscriber<T>>, limit: u64) -> Self {
        Self::with_sink(downstream, limit, sink::global())
    }

    /// Create a relay reporting undeliverable errors and protocol violations to `sink`.
    pub fn with_sink(downstream: Box<dyn Subscriber<T>>, limit: u64, sink: Arc<dyn ErrorSink>) -> Self {
        Self {
            downstream,
            limit,
            remaining: limit,
            activated: false,
            gate: None,
            sink,
        }
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    /// Items that may still be delivered downstream.
    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    /// Demand that may still be forwarded upstream, or `None` before the
    /// producer subscribed (and always for a zero limit).
    pub fn demand_budget(&self) -> Option<u64> {
        self.gate.as_ref().map(|gate| gate.budget())
    }

    /// Whether the consumer has received its terminal signal.
    pub fn is_terminated(&self) -> bool {
        self.activated && self.remaining == 0
    }

    /// Single entry point for every signal, from either direction.
    pub fn dispatch(&mut self, signal: Signal<T>) {
        trace!(signal = signal.name(), remaining = self.remaining, "dispatch");
        match signal {
            Signal::Subscribe(upstream) => self.handle_subscribe(upstream),
            Signal::Next(item) => self.handle_next(item),
            Signal::Error(err) => self.handle_error(err),
            Signal::Complete => self.handle_complete(),
            Signal::Request(n) => match &self.gate {
                Some(gate) => gate.request(n),
                None if self.activated => {}
                None => report_violation(self.sink.as_ref(), GleipnirError::NotSubscribed),
            },
            Signal::Cancel => match &self.gate {
                Some(gate) => gate.cancel(),
                None if self.activated => {}
                None => report_violation(self.sink.as_ref(), GleipnirError::NotSubscribed),
            },
        }
    }

    fn handle_subscribe(&mut self, upstream: Arc<dyn Subscription>) {
        if self.activated {
            reject_duplicate(upstream.as_ref(), self.sink.as_ref());
            return;
        }
        self.activated = true;

        if self.remaining == 0 {
            upstream.cancel();
            complete_empty(self.downstream.as_mut());
            return;
        }

        // The gate holds the upstream handle before the consumer sees it, so
        // a request made from inside `on_subscribe` already reaches the producer.
        let gate = Arc::new(DemandGate::new(upstream, self.limit, Arc::clone(&self.sink)));
        self.gate = Some(Arc::clone(&gate));
        trace!(limit = self.limit, "limit stage subscribed");
        self.downstream.on_subscribe(gate);
    }

    fn handle_next(&mut self, item: T) {
        if !self.activated {
            report_violation(self.sink.as_ref(), GleipnirError::NotSubscribed);
            return;
        }
        if self.remaining == 0 {
            trace!("dropping item after limit reached");
            return;
        }
        self.remaining -= 1;
        self.downstream.on_next(item);
        if self.remaining == 0 {
            debug!(limit = self.limit, "limit reached, cancelling upstream");
            metrics::counter!(telemetry::LIMIT_REACHED_TOTAL).increment(1);
            if let Some(gate) = &self.gate {
                gate.upstream().cancel();
            }
            self.downstream.on_complete();
        }
    }

    fn handle_error(&mut self, err: GleipnirError) {
        if self.remaining > 0 {
            self.remaining = 0;
            self.downstream.on_error(err);
        } else {
            metrics::counter!(telemetry::UNDELIVERABLE_ERRORS_TOTAL).increment(1);
            self.sink.report(GleipnirError::Undeliverable(Box::new(err)));
        }
    }

    fn handle_complete(&mut self) {
        if self.remaining > 0 {
            self.remaining = 0;
            self.downstream.on_complete();
        } else {
            trace!("ignoring completion after terminal signal");
        }
    }
}

impl<T> Subscriber<T> for BoundedRelay<T> {
    fn on_subscribe(&mut self, subscription: Arc<dyn Subscription>) {
        self.dispatch(Signal::Subscribe(subscription));
    }

    fn on_next(&mut self, item: T) {
        self.dispatch(Signal::Next(item));
    }

    fn on_error(&mut self, error: GleipnirError) {
        self.dispatch(Signal::Error(error));
    }

    fn on_complete(&mut self) {
        self.dispatch(Signal::Complete);
    }
}

impl<T> fmt::Debug for BoundedRelay<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundedRelay")
            .field("limit", &self.limit)
            .field("remaining", &self.remaining)
            .field("activated", &self.activated)
            .field("gate", &self.gate)
            .finish_non_exhaustive()
    }
}
