//! Bridge from a [`Publisher`] to an async `Stream`.
//!
//! Items are pushed by the producer into a bounded `tokio::sync::mpsc`
//! channel. The bridge prefetches `buffer` items and requests one more for
//! every item the consumer takes, so the channel never holds more than
//! `buffer` items and the producer never runs ahead of the consumer.
//!
//! Dropping the stream cancels the subscription.

use std::pin::Pin;
use std::sync::{Arc, OnceLock};
use std::task::{Context, Poll};

use futures_util::Stream;
use pin_project_lite::pin_project;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio_stream::wrappers::ReceiverStream;
use tracing::warn;

use crate::sink::{self, ErrorSink};
use crate::subscription::reject_duplicate;
use crate::traits::{Publisher, Subscriber, Subscription};
use crate::{GleipnirError, Result};

/// Default number of items prefetched between producer and consumer.
pub const DEFAULT_STREAM_BUFFER: usize = 64;

type SharedSubscription = Arc<OnceLock<Arc<dyn Subscription>>>;

pin_project! {
    /// Async view of a publisher. Yields `Ok(item)` for every item, a final
    /// `Err` if the stream failed, then ends.
    pub struct SubscriberStream<T> {
        #[pin]
        inner: ReceiverStream<Result<T>>,
        subscription: SharedSubscription,
    }

    impl<T> PinnedDrop for SubscriberStream<T> {
        fn drop(this: Pin<&mut Self>) {
            if let Some(subscription) = this.project().subscription.get() {
                subscription.cancel();
            }
        }
    }
}

impl<T: Send + 'static> SubscriberStream<T> {
    /// Subscribe to `publisher`, prefetching up to `buffer` items (at least one).
    pub fn new<P: Publisher<T>>(publisher: P, buffer: usize) -> Self {
        let buffer = buffer.max(1);
        // One extra slot so a terminal error always fits behind a full buffer.
        let (tx, rx) = mpsc::channel(buffer + 1);
        let subscription: SharedSubscription = Arc::new(OnceLock::new());

        publisher.subscribe(Box::new(ChannelSubscriber {
            tx: Some(tx),
            subscription: Arc::clone(&subscription),
            prefetch: buffer as u64,
            sink: sink::global(),
        }));

        Self {
            inner: ReceiverStream::new(rx),
            subscription,
        }
    }
}

impl<T> Stream for SubscriberStream<T> {
    type Item = Result<T>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.project();
        let polled = this.inner.poll_next(cx);
        if let Poll::Ready(Some(Ok(_))) = &polled {
            if let Some(subscription) = this.subscription.get() {
                subscription.request(1);
            }
        }
        polled
    }
}

struct ChannelSubscriber<T> {
    tx: Option<mpsc::Sender<Result<T>>>,
    subscription: SharedSubscription,
    prefetch: u64,
    sink: Arc<dyn ErrorSink>,
}

impl<T> ChannelSubscriber<T> {
    fn cancel_upstream(&mut self) {
        self.tx = None;
        if let Some(subscription) = self.subscription.get() {
            subscription.cancel();
        }
    }
}

impl<T: Send> Subscriber<T> for ChannelSubscriber<T> {
    fn on_subscribe(&mut self, subscription: Arc<dyn Subscription>) {
        if self.subscription.set(Arc::clone(&subscription)).is_err() {
            reject_duplicate(subscription.as_ref(), self.sink.as_ref());
            return;
        }
        subscription.request(self.prefetch);
    }

    fn on_next(&mut self, item: T) {
        let Some(tx) = &self.tx else {
            return;
        };
        match tx.try_send(Ok(item)) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                warn!("producer exceeded requested demand, cancelling");
                self.cancel_upstream();
                self.sink.report(GleipnirError::Stream(
                    "producer exceeded requested demand".to_string(),
                ));
            }
            // Consumer dropped the stream.
            Err(TrySendError::Closed(_)) => self.cancel_upstream(),
        }
    }

    fn on_error(&mut self, error: GleipnirError) {
        let Some(tx) = self.tx.take() else {
            self.sink.report(GleipnirError::Undeliverable(Box::new(error)));
            return;
        };
        if let Err(err) = tx.try_send(Err(error)) {
            if let Err(error) = err.into_inner() {
                self.sink.report(GleipnirError::Undeliverable(Box::new(error)));
            }
        }
    }

    fn on_complete(&mut self) {
        self.tx = None;
    }
}
