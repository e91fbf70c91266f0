//! Core push/pull protocol traits

use std::sync::Arc;

use crate::GleipnirError;

/// Handle a consumer uses to pull items from a producer.
///
/// Shared as `Arc<dyn Subscription>` and callable from any thread, possibly
/// concurrently. Calling [`cancel`](Subscription::cancel) more than once must
/// be harmless.
pub trait Subscription: Send + Sync {
    /// Authorize the producer to send up to `n` more items.
    ///
    /// `n == 0` is a protocol violation; implementations report it rather
    /// than silently ignoring it.
    fn request(&self, n: u64);

    /// Stop the flow of items. No further demand will be honoured.
    fn cancel(&self);
}

/// Receiver of the producer-side signals.
///
/// Producers deliver `on_subscribe` first, then any number of `on_next`,
/// then at most one of `on_error` / `on_complete`. All methods take
/// `&mut self`: delivery to one subscriber is serial, never concurrent.
pub trait Subscriber<T>: Send {
    /// Receive the handle used to request demand or cancel.
    fn on_subscribe(&mut self, subscription: Arc<dyn Subscription>);

    /// Receive one item, within previously granted demand.
    fn on_next(&mut self, item: T);

    /// The stream failed. Terminal.
    fn on_error(&mut self, error: GleipnirError);

    /// The stream finished normally. Terminal.
    fn on_complete(&mut self);
}

/// A cold source of items, consumed by a single subscription.
pub trait Publisher<T> {
    /// Start delivering signals to `subscriber`.
    fn subscribe(self, subscriber: Box<dyn Subscriber<T>>);
}
