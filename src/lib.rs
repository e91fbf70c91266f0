//! Gleipnir - bounded-demand limit stage for push/pull streams
//!
//! This crate provides a [`BoundedRelay`] stage that lets at most `n` items
//! through from a producer to a consumer and forwards at most `n` demand
//! upstream. When the cap is reached it cancels the producer and completes
//! the consumer, as if the stream had ended on its own.
//!
//! The protocol follows the reactive-streams shape: [`Publisher`]s deliver
//! signals to [`Subscriber`]s, which pull with a shared [`Subscription`].
//!
//! # Example
//!
//! ```rust,no_run
//! use futures_util::StreamExt;
//! use gleipnir::{IterPublisher, PublisherExt};
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut stream = IterPublisher::new(0..1_000).limit(3).into_stream(16);
//!
//!     while let Some(item) = stream.next().await {
//!         println!("{}", item.unwrap());
//!     }
//!     // prints 0, 1, 2
//! }
//! ```

pub mod config;
pub mod error;
pub mod relay;
pub mod signal;
pub mod sink;
pub mod source;
pub mod stream;
pub mod subscription;
pub mod telemetry;
pub mod traits;

// Re-export main types at crate root
pub use config::Config;
pub use error::{GleipnirError, Result};
pub use relay::{BoundedRelay, DemandGate, Limit, PublisherExt};
pub use signal::Signal;
pub use sink::{CapturingSink, ErrorSink, TracingSink};
pub use source::IterPublisher;
pub use stream::{DEFAULT_STREAM_BUFFER, SubscriberStream};
pub use subscription::EmptySubscription;
pub use traits::{Publisher, Subscriber, Subscription};
