//! ABOUTME: EventBus — non-blocking pub/sub fan-out for StatusEvent (spec §4.5, §5)
//! ABOUTME: A short-held lock guards the subscriber list; publication never blocks on a slow handler

use crate::event::StatusEvent;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, error, trace};

/// Receives published `StatusEvent`s. Implementations must not assume any
/// particular thread; the bus invokes handlers from a dedicated per-
/// subscriber task, so a slow or panicking handler only delays its own
/// subscription, never the publisher or other subscribers (§4.5).
pub trait StatusHandler: Send + Sync + 'static {
    fn handle(&self, event: StatusEvent);
}

impl<F> StatusHandler for F
where
    F: Fn(StatusEvent) + Send + Sync + 'static,
{
    fn handle(&self, event: StatusEvent) {
        self(event);
    }
}

/// Opaque handle returned by `subscribe`, used to `unsubscribe` later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle(u64);

struct Subscriber {
    id: u64,
    queue: Arc<Mutex<VecDeque<StatusEvent>>>,
    notify: Arc<Notify>,
    dropped: Arc<AtomicU64>,
    task: JoinHandle<()>,
}

/// Non-blocking fan-out of lifecycle events to zero or more subscribers.
///
/// Each subscriber has its own bounded ring buffer (`buffer_size` events).
/// When a subscriber's buffer is full, the oldest buffered event for that
/// subscriber is dropped and its drop counter increments — the publisher
/// itself never blocks and never drops events meant for a different,
/// healthy subscriber (§4.5 backpressure policy).
pub struct EventBus {
    subscribers: Arc<Mutex<Vec<Subscriber>>>,
    next_id: AtomicU64,
    buffer_size: usize,
    events_dropped_total: Arc<AtomicU64>,
}

impl EventBus {
    #[must_use]
    pub fn new(buffer_size: usize) -> Self {
        Self {
            subscribers: Arc::new(Mutex::new(Vec::new())),
            next_id: AtomicU64::new(0),
            buffer_size: buffer_size.max(1),
            events_dropped_total: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Register a handler. Handlers are invoked in registration order
    /// relative to each other's subscribe() calls, but independently: one
    /// handler running long does not delay another's delivery.
    pub fn subscribe(&self, handler: impl StatusHandler) -> SubscriptionHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let queue: Arc<Mutex<VecDeque<StatusEvent>>> = Arc::new(Mutex::new(VecDeque::new()));
        let notify = Arc::new(Notify::new());
        let dropped = Arc::new(AtomicU64::new(0));

        let task_queue = Arc::clone(&queue);
        let task_notify = Arc::clone(&notify);
        let handler = Arc::new(handler);
        let task = tokio::spawn(async move {
            loop {
                task_notify.notified().await;
                loop {
                    let next = task_queue.lock().pop_front();
                    match next {
                        Some(event) => handler.handle(event),
                        None => break,
                    }
                }
            }
        });

        self.subscribers.lock().push(Subscriber {
            id,
            queue,
            notify,
            dropped,
            task,
        });
        debug!(subscriber_id = id, "status bus subscriber registered");
        SubscriptionHandle(id)
    }

    pub fn unsubscribe(&self, handle: SubscriptionHandle) {
        let mut subs = self.subscribers.lock();
        if let Some(pos) = subs.iter().position(|s| s.id == handle.0) {
            let sub = subs.remove(pos);
            sub.task.abort();
            debug!(subscriber_id = handle.0, "status bus subscriber removed");
        }
    }

    /// Publish an event to every current subscriber. Never blocks: at
    /// worst it briefly holds the subscriber-list lock to take a snapshot,
    /// then performs a lock-free-from-the-publisher's-perspective push into
    /// each subscriber's own queue.
    pub fn publish(&self, event: StatusEvent) {
        trace!(workflow_id = event.workflow_id(), "publishing status event");
        // Snapshot under the lock, then release it before touching any
        // individual subscriber queue (§5: "publication uses a snapshot of
        // subscribers to avoid holding the lock during handler invocation").
        let snapshot: Vec<_> = {
            let subs = self.subscribers.lock();
            subs.iter()
                .map(|s| (Arc::clone(&s.queue), Arc::clone(&s.notify), Arc::clone(&s.dropped)))
                .collect()
        };

        for (queue, notify, dropped) in snapshot {
            let mut q = queue.lock();
            if q.len() >= self.buffer_size {
                q.pop_front();
                dropped.fetch_add(1, Ordering::Relaxed);
                self.events_dropped_total.fetch_add(1, Ordering::Relaxed);
                error!("status bus subscriber buffer full, dropping oldest event");
            }
            q.push_back(event.clone());
            drop(q);
            notify.notify_one();
        }
    }

    #[must_use]
    pub fn events_dropped_total(&self) -> u64 {
        self.events_dropped_total.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

impl Drop for EventBus {
    fn drop(&mut self) {
        for sub in self.subscribers.lock().drain(..) {
            sub.task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::WorkflowOutcomeSummary;
    use chrono::Utc;
    use std::sync::mpsc;
    use std::sync::Mutex as StdMutex;

    fn wf_started(id: &str) -> StatusEvent {
        StatusEvent::WorkflowStarted {
            workflow_id: id.to_string(),
            at: Utc::now(),
        }
    }

    fn wf_finished(id: &str) -> StatusEvent {
        StatusEvent::WorkflowFinished {
            workflow_id: id.to_string(),
            status: WorkflowOutcomeSummary::Ok,
            at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn subscriber_receives_events_in_order() {
        let bus = EventBus::new(16);
        let received: Arc<StdMutex<Vec<String>>> = Arc::new(StdMutex::new(Vec::new()));
        let captured = Arc::clone(&received);
        bus.subscribe(move |event: StatusEvent| {
            captured.lock().unwrap().push(event.workflow_id().to_string());
        });

        bus.publish(wf_started("wf-1"));
        bus.publish(wf_finished("wf-1"));
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;

        assert_eq!(*received.lock().unwrap(), vec!["wf-1", "wf-1"]);
    }

    #[tokio::test]
    async fn unsubscribe_stops_delivery() {
        let bus = EventBus::new(16);
        let count = Arc::new(AtomicU64::new(0));
        let captured = Arc::clone(&count);
        let handle = bus.subscribe(move |_: StatusEvent| {
            captured.fetch_add(1, Ordering::Relaxed);
        });
        bus.unsubscribe(handle);
        bus.publish(wf_started("wf-2"));
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert_eq!(count.load(Ordering::Relaxed), 0);
    }

    #[tokio::test]
    async fn blocked_subscriber_drops_oldest_without_delaying_publish_or_peers() {
        let bus = EventBus::new(2);

        // A subscriber whose handler blocks forever on the first event it
        // receives: recv() on a channel whose sender is kept alive but
        // never used. Its own queue then backs up and drops under load
        // while the publisher and every other subscriber are unaffected.
        let (_never_send, blocker_rx) = mpsc::channel::<()>();
        let blocker_rx = Mutex::new(blocker_rx);
        bus.subscribe(move |_: StatusEvent| {
            let _ = blocker_rx.lock().recv();
        });

        let order: Arc<StdMutex<Vec<String>>> = Arc::new(StdMutex::new(Vec::new()));
        let captured = Arc::clone(&order);
        bus.subscribe(move |event: StatusEvent| {
            captured.lock().unwrap().push(event.workflow_id().to_string());
        });

        let start = std::time::Instant::now();
        for i in 0..5 {
            bus.publish(wf_started(&format!("wf-{i}")));
        }
        assert!(start.elapsed() < std::time::Duration::from_millis(200));

        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        assert!(bus.events_dropped_total() >= 1);
        assert_eq!(
            *order.lock().unwrap(),
            vec!["wf-0", "wf-1", "wf-2", "wf-3", "wf-4"]
        );
    }
}
