//! Demand-driven source over an iterator.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::sink::{self, ErrorSink};
use crate::subscription::validate_demand;
use crate::traits::{Publisher, Subscriber, Subscription};

/// Publisher that emits the items of an iterator, never more than requested.
///
/// Emission happens on whichever thread calls `request` (or `subscribe`).
/// A work-in-progress counter elects a single emitting thread, so requests
/// made reentrantly from `on_next` or concurrently from elsewhere only add
/// demand and never emit in parallel. Demand of `u64::MAX` is unbounded.
pub struct IterPublisher<I> {
    iter: I,
    sink: Option<Arc<dyn ErrorSink>>,
}

impl<I: Iterator> IterPublisher<I> {
    pub fn new<J>(items: J) -> Self
    where
        J: IntoIterator<IntoIter = I>,
    {
        Self {
            iter: items.into_iter(),
            sink: None,
        }
    }

    /// Report zero-demand requests to `sink` instead of the process-wide one.
    pub fn sink(mut self, sink: Arc<dyn ErrorSink>) -> Self {
        self.sink = Some(sink);
        self
    }
}

impl<I> Publisher<I::Item> for IterPublisher<I>
where
    I: Iterator + Send + 'static,
    I::Item: 'static,
{
    fn subscribe(self, subscriber: Box<dyn Subscriber<I::Item>>) {
        let subscription = Arc::new(IterSubscription {
            state: Mutex::new(EmitState {
                iter: Some(self.iter),
                subscriber: Some(subscriber),
            }),
            requested: AtomicU64::new(0),
            // Held while `on_subscribe` runs so early requests only add demand.
            wip: AtomicU64::new(1),
            cancelled: AtomicBool::new(false),
            sink: self.sink.unwrap_or_else(sink::global),
        });
        {
            let mut state = subscription.lock();
            let handle: Arc<dyn Subscription> = subscription.clone();
            if let Some(subscriber) = state.subscriber.as_mut() {
                subscriber.on_subscribe(handle);
            }
        }
        subscription.drain();
    }
}

/// Emission state. Both halves are released once the stream completes or is
/// cancelled: the subscriber holds this subscription through its own chain,
/// so keeping it would keep the whole stage alive.
struct EmitState<I: Iterator> {
    iter: Option<I>,
    subscriber: Option<Box<dyn Subscriber<I::Item>>>,
}

type Released<I> = (Option<I>, Option<Box<dyn Subscriber<<I as Iterator>::Item>>>);

impl<I: Iterator> EmitState<I> {
    fn release(&mut self) -> Released<I> {
        (self.iter.take(), self.subscriber.take())
    }
}

struct IterSubscription<I: Iterator> {
    state: Mutex<EmitState<I>>,
    requested: AtomicU64,
    wip: AtomicU64,
    cancelled: AtomicBool,
    sink: Arc<dyn ErrorSink>,
}

impl<I: Iterator> IterSubscription<I> {
    fn lock(&self) -> MutexGuard<'_, EmitState<I>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Emit until demand or work runs out. The caller owns one unit of `wip`.
    fn drain(&self) {
        let mut missed = 1;
        loop {
            let released = {
                let mut state = self.lock();
                if self.emit(&mut state) {
                    Some(state.release())
                } else {
                    None
                }
            };
            // Dropped outside the lock: a subscriber's destructor may call back in.
            drop(released);

            missed = self.wip.fetch_sub(missed, Ordering::AcqRel) - missed;
            if missed == 0 {
                break;
            }
        }
    }

    /// Returns `true` once the stream is over (completed or cancelled).
    fn emit(&self, state: &mut EmitState<I>) -> bool {
        let (Some(iter), Some(subscriber)) = (state.iter.as_mut(), state.subscriber.as_mut())
        else {
            return false;
        };
        loop {
            if self.cancelled.load(Ordering::Acquire) {
                return true;
            }
            let requested = self.requested.load(Ordering::Acquire);
            if requested == 0 {
                return false;
            }
            match iter.next() {
                Some(item) => {
                    if requested != u64::MAX {
                        self.requested.fetch_sub(1, Ordering::AcqRel);
                    }
                    subscriber.on_next(item);
                }
                None => {
                    subscriber.on_complete();
                    return true;
                }
            }
        }
    }
}

impl<I> Subscription for IterSubscription<I>
where
    I: Iterator + Send,
{
    fn request(&self, n: u64) {
        if !validate_demand(n, self.sink.as_ref()) {
            return;
        }
        let _ = self
            .requested
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                Some(current.saturating_add(n))
            });
        if self.wip.fetch_add(1, Ordering::AcqRel) == 0 {
            self.drain();
        }
    }

    fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
        // An idle source releases its state right away.
        if self.wip.fetch_add(1, Ordering::AcqRel) == 0 {
            self.drain();
        }
    }
}
