//! Tests for the async stream bridge and the `limit` operator end to end.

use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Weak};

use futures_util::StreamExt;
use gleipnir::{
    CapturingSink, GleipnirError, IterPublisher, Publisher, PublisherExt, Subscriber,
    Subscription,
};
use tokio_test::{assert_pending, assert_ready};

/// Publisher that ignores demand, emits `items` and then fails.
struct FailingPublisher {
    items: Vec<u32>,
    message: &'static str,
}

impl Publisher<u32> for FailingPublisher {
    fn subscribe(self, mut subscriber: Box<dyn Subscriber<u32>>) {
        struct Unbounded;
        impl Subscription for Unbounded {
            fn request(&self, _n: u64) {}
            fn cancel(&self) {}
        }
        subscriber.on_subscribe(Arc::new(Unbounded));
        for item in self.items {
            subscriber.on_next(item);
        }
        subscriber.on_error(GleipnirError::Stream(self.message.into()));
    }
}

/// Publisher that records how much demand reaches it and only emits when told to.
#[derive(Clone, Default)]
struct DemandRecorder {
    requested: Arc<Mutex<Vec<u64>>>,
    cancels: Arc<AtomicUsize>,
    subscriber: Arc<Mutex<Option<Box<dyn Subscriber<u32>>>>>,
}

impl DemandRecorder {
    fn emit(&self, item: u32) {
        if let Some(subscriber) = self.subscriber.lock().unwrap().as_mut() {
            subscriber.on_next(item);
        }
    }
}

impl Subscription for DemandRecorder {
    fn request(&self, n: u64) {
        self.requested.lock().unwrap().push(n);
    }

    fn cancel(&self) {
        self.cancels.fetch_add(1, Ordering::SeqCst);
    }
}

impl Publisher<u32> for DemandRecorder {
    fn subscribe(self, mut subscriber: Box<dyn Subscriber<u32>>) {
        subscriber.on_subscribe(Arc::new(self.clone()));
        *self.subscriber.lock().unwrap() = Some(subscriber);
    }
}

/// Iterator wrapper whose token is dropped together with the iterator.
struct Tracked<I> {
    inner: I,
    _token: Arc<()>,
}

impl<I: Iterator> Iterator for Tracked<I> {
    type Item = I::Item;

    fn next(&mut self) -> Option<I::Item> {
        self.inner.next()
    }
}

fn tracked<I>(inner: I) -> (Tracked<I>, Weak<()>) {
    let token = Arc::new(());
    let weak = Arc::downgrade(&token);
    (Tracked { inner, _token: token }, weak)
}

#[tokio::test]
async fn limit_stops_an_endless_source() {
    let produced = Arc::new(AtomicU32::new(0));
    let counter = produced.clone();
    let source = IterPublisher::new((0u32..).inspect(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    }));

    let items: Vec<u32> = source
        .limit(3)
        .into_stream(16)
        .map(|item| item.unwrap())
        .collect()
        .await;

    assert_eq!(items, vec![0, 1, 2]);
    assert_eq!(produced.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn limit_larger_than_source_ends_with_source() {
    let items: Vec<u32> = IterPublisher::new(0u32..4)
        .limit(100)
        .into_stream(2)
        .map(|item| item.unwrap())
        .collect()
        .await;

    assert_eq!(items, vec![0, 1, 2, 3]);
}

#[tokio::test]
async fn zero_limit_yields_nothing() {
    let produced = Arc::new(AtomicU32::new(0));
    let counter = produced.clone();
    let source = IterPublisher::new((0u32..10).inspect(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    }));

    let mut stream = source.limit(0).into_stream(8);
    assert!(stream.next().await.is_none());
    assert_eq!(produced.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn upstream_error_is_the_last_item() {
    let mut stream = FailingPublisher {
        items: vec![1, 2],
        message: "boom",
    }
    .limit(5)
    .into_stream(8);

    assert_eq!(stream.next().await.unwrap().unwrap(), 1);
    assert_eq!(stream.next().await.unwrap().unwrap(), 2);
    let err = stream.next().await.unwrap().unwrap_err();
    assert!(matches!(err, GleipnirError::Stream(ref msg) if msg == "boom"));
    assert!(stream.next().await.is_none());
}

#[tokio::test]
async fn error_after_limit_is_not_delivered() {
    let sink = Arc::new(CapturingSink::new());
    let items: Vec<_> = FailingPublisher {
        items: vec![1, 2, 3],
        message: "late",
    }
    .limit_with_sink(2, sink.clone())
    .into_stream(8)
    .collect()
    .await;

    assert_eq!(items.len(), 2);
    assert!(items.iter().all(|item| item.is_ok()));
    assert_eq!(sink.len(), 1);
    assert!(matches!(sink.take()[0], GleipnirError::Undeliverable(_)));
}

#[tokio::test]
async fn prefetch_is_clamped_by_the_limit() {
    let upstream = DemandRecorder::default();
    let stream = upstream.clone().limit(5).into_stream(64);

    assert_eq!(*upstream.requested.lock().unwrap(), vec![5]);
    drop(stream);
    assert_eq!(upstream.cancels.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn prefetch_is_the_buffer_when_below_limit() {
    let upstream = DemandRecorder::default();
    let _stream = upstream.clone().limit(100).into_stream(4);

    assert_eq!(*upstream.requested.lock().unwrap(), vec![4]);
}

#[tokio::test]
async fn consuming_items_replenishes_demand_one_by_one() {
    let produced = Arc::new(AtomicU32::new(0));
    let counter = produced.clone();
    let source = IterPublisher::new((0u32..100).inspect(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    }));

    let mut stream = source.limit(50).into_stream(4);
    assert_eq!(produced.load(Ordering::SeqCst), 4);

    stream.next().await.unwrap().unwrap();
    assert_eq!(produced.load(Ordering::SeqCst), 5);

    stream.next().await.unwrap().unwrap();
    stream.next().await.unwrap().unwrap();
    assert_eq!(produced.load(Ordering::SeqCst), 7);
}

#[tokio::test]
async fn dropping_the_stream_cancels_the_source() {
    let produced = Arc::new(AtomicU32::new(0));
    let counter = produced.clone();
    let source = IterPublisher::new((0u32..1000).inspect(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    }));

    let mut stream = source.limit(500).into_stream(4);
    stream.next().await;
    stream.next().await;
    drop(stream);

    let total = produced.load(Ordering::SeqCst);
    assert!(total <= 6, "source kept producing after drop: {total}");
}

#[test]
fn pending_until_a_late_producer_delivers() {
    let upstream = DemandRecorder::default();
    let mut stream = tokio_test::task::spawn(upstream.clone().limit(3).into_stream(2));

    assert_pending!(stream.poll_next());
    assert_eq!(*upstream.requested.lock().unwrap(), vec![2]);

    upstream.emit(9);
    assert!(stream.is_woken());
    let item = assert_ready!(stream.poll_next());
    assert_eq!(item.unwrap().unwrap(), 9);
    assert_eq!(*upstream.requested.lock().unwrap(), vec![2, 1]);
}

#[test]
fn ready_items_are_yielded_without_waiting() {
    let mut stream =
        tokio_test::task::spawn(IterPublisher::new(vec![7u32, 8]).limit(1).into_stream(4));

    let first = assert_ready!(stream.poll_next());
    assert_eq!(first.unwrap().unwrap(), 7);
    let end = assert_ready!(stream.poll_next());
    assert!(end.is_none());
}

// ============================================================================
// Resource release
// ============================================================================

#[tokio::test]
async fn exhausted_source_releases_the_chain() {
    let (iter, alive) = tracked(0u32..2);
    let items: Vec<u32> = IterPublisher::new(iter)
        .limit(10)
        .into_stream(4)
        .map(|item| item.unwrap())
        .collect()
        .await;

    assert_eq!(items, vec![0, 1]);
    assert!(alive.upgrade().is_none(), "source state outlived completion");
}

#[tokio::test]
async fn reaching_the_limit_releases_the_chain() {
    let (iter, alive) = tracked(1u32..);
    let mut stream = IterPublisher::new(iter).limit(3).into_stream(4);

    for expected in 1..=3 {
        assert_eq!(stream.next().await.unwrap().unwrap(), expected);
    }
    // Released by the self-cancel, before the consumer lets go.
    assert!(alive.upgrade().is_none(), "source state outlived the limit");
    assert!(stream.next().await.is_none());
}

#[tokio::test]
async fn dropping_the_stream_mid_flight_releases_the_chain() {
    let (iter, alive) = tracked(0u32..1000);
    let mut stream = IterPublisher::new(iter).limit(500).into_stream(4);

    stream.next().await.unwrap().unwrap();
    stream.next().await.unwrap().unwrap();
    assert!(alive.upgrade().is_some());

    drop(stream);
    assert!(alive.upgrade().is_none(), "source state outlived the stream");
}
