//! The `limit` operator.

use std::sync::Arc;

use super::BoundedRelay;
use crate::sink::{self, ErrorSink};
use crate::stream::SubscriberStream;
use crate::traits::{Publisher, Subscriber};

/// Publisher that lets at most `limit` items of `source` through.
///
/// Every subscriber gets its own [`BoundedRelay`] in front of the source.
pub struct Limit<P> {
    source: P,
    limit: u64,
    sink: Option<Arc<dyn ErrorSink>>,
}

impl<P> Limit<P> {
    pub fn new(source: P, limit: u64) -> Self {
        Self {
            source,
            limit,
            sink: None,
        }
    }

    /// Report undeliverable errors to `sink` instead of the process-wide one.
    pub fn sink(mut self, sink: Arc<dyn ErrorSink>) -> Self {
        self.sink = Some(sink);
        self
    }
}

impl<T, P> Publisher<T> for Limit<P>
where
    T: 'static,
    P: Publisher<T>,
{
    fn subscribe(self, subscriber: Box<dyn Subscriber<T>>) {
        let sink = self.sink.unwrap_or_else(sink::global);
        let relay = BoundedRelay::with_sink(subscriber, self.limit, sink);
        self.source.subscribe(Box::new(relay));
    }
}

/// Operator methods available on every [`Publisher`].
pub trait PublisherExt<T>: Publisher<T> + Sized {
    /// Let at most `n` items through, requesting at most `n` upstream.
    fn limit(self, n: u64) -> Limit<Self> {
        Limit::new(self, n)
    }

    /// Like [`limit`](Self::limit), reporting to `sink` instead of the global sink.
    fn limit_with_sink(self, n: u64, sink: Arc<dyn ErrorSink>) -> Limit<Self> {
        Limit::new(self, n).sink(sink)
    }

    /// Consume the publisher as an async stream prefetching `buffer` items.
    fn into_stream(self, buffer: usize) -> SubscriberStream<T>
    where
        T: Send + 'static,
    {
        SubscriberStream::new(self, buffer)
    }
}

impl<T, P: Publisher<T>> PublisherExt<T> for P {}
