//! Topic-keyed publish/subscribe event bus.
//!
//! Listeners are plain callbacks registered under a [`Topic`].  Publishing
//! runs every listener of the topic synchronously on the caller's task.  A
//! listener that returns an error or panics is logged and skipped; the
//! remaining listeners still run and the publisher never sees the failure.
//!
//! Every published event is also forwarded to a [`tokio::sync::broadcast`]
//! tap so async consumers (bridges, servers, the CLI) can follow the stream
//! without registering a callback.
//!
//! # Registry semantics
//!
//! | Operation | Behaviour |
//! |---|---|
//! | [`EventBus::subscribe`] | Registers a listener; the same [`Listener`] handle twice is stored once |
//! | [`EventBus::unsubscribe`] | Removes by handle identity; absent handles are a no-op |
//! | [`EventBus::clear`] | Drops every registration on every topic |

use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex, MutexGuard};

use tablepulse_types::{BusEvent, PulseError, Topic};
use tokio::sync::broadcast;
use tracing::{error, warn};

/// Default tap capacity (events buffered before slow tap receivers lag).
const DEFAULT_CAPACITY: usize = 256;

/// Shared handle to a listener callback.
///
/// Identity is the allocation: clone the handle you subscribed with to
/// unsubscribe it later.
pub type Listener = Arc<dyn Fn(&BusEvent) -> Result<(), PulseError> + Send + Sync>;

/// Wrap a closure into a [`Listener`] handle.
pub fn listener<F>(f: F) -> Listener
where
    F: Fn(&BusEvent) -> Result<(), PulseError> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Shared event bus.  Clone it cheaply – all clones share one registry and
/// one tap channel.
#[derive(Clone)]
pub struct EventBus {
    registry: Arc<Mutex<HashMap<Topic, Vec<Listener>>>>,
    tap: broadcast::Sender<BusEvent>,
}

impl EventBus {
    /// Create a bus whose broadcast tap buffers `capacity` events.
    pub fn new(capacity: usize) -> Self {
        let (tap, _) = broadcast::channel(capacity);
        Self {
            registry: Arc::new(Mutex::new(HashMap::new())),
            tap,
        }
    }

    /// Register `listener` under `topic`.
    pub fn subscribe(&self, topic: Topic, listener: Listener) {
        let mut registry = self.registry();
        let listeners = registry.entry(topic).or_default();
        if !listeners.iter().any(|l| Arc::ptr_eq(l, &listener)) {
            listeners.push(listener);
        }
    }

    /// Remove `listener` from `topic` if it is registered there.
    pub fn unsubscribe(&self, topic: Topic, listener: &Listener) {
        let mut registry = self.registry();
        if let Some(listeners) = registry.get_mut(&topic) {
            listeners.retain(|l| !Arc::ptr_eq(l, listener));
        }
    }

    /// Deliver `event` to every listener of its topic, then to the tap.
    ///
    /// Returns the number of listeners that handled the event without error.
    pub fn publish(&self, event: BusEvent) -> usize {
        let topic = event.topic();
        // Snapshot so listeners may (un)subscribe while being called.
        let listeners = self.registry().get(&topic).cloned().unwrap_or_default();

        let mut delivered = 0;
        for listener in &listeners {
            match catch_unwind(AssertUnwindSafe(|| listener(&event))) {
                Ok(Ok(())) => delivered += 1,
                Ok(Err(e)) => warn!(topic = %topic, error = %e, "event listener failed"),
                Err(panic) => error!(
                    topic = %topic,
                    panic = panic_message(panic.as_ref()),
                    "event listener panicked"
                ),
            }
        }

        // No tap receivers is the normal case.
        let _ = self.tap.send(event);
        delivered
    }

    /// Receive every event published from now on, regardless of topic.
    pub fn tap(&self) -> broadcast::Receiver<BusEvent> {
        self.tap.subscribe()
    }

    /// Drop every registration on every topic.
    pub fn clear(&self) {
        self.registry().clear();
    }

    /// Number of listeners currently registered under `topic`.
    pub fn listener_count(&self, topic: Topic) -> usize {
        self.registry().get(&topic).map_or(0, Vec::len)
    }

    fn registry(&self) -> MutexGuard<'_, HashMap<Topic, Vec<Listener>>> {
        // A panicking listener never runs under this lock, so a poisoned
        // guard still holds a consistent map.
        self.registry.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("<non-string panic>")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tablepulse_types::{DisconnectReason, Pong, ServerEvent};

    fn counting_listener(counter: &Arc<AtomicUsize>) -> Listener {
        let counter = Arc::clone(counter);
        listener(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }

    fn pong() -> BusEvent {
        BusEvent::Server(ServerEvent::Pong(Pong { timestamp: 1 }))
    }

    #[test]
    fn publish_reaches_listeners_of_topic_only() {
        let bus = EventBus::default();
        let pongs = Arc::new(AtomicUsize::new(0));
        let losses = Arc::new(AtomicUsize::new(0));
        bus.subscribe(Topic::Pong, counting_listener(&pongs));
        bus.subscribe(Topic::ConnectionLost, counting_listener(&losses));

        assert_eq!(bus.publish(pong()), 1);
        assert_eq!(pongs.load(Ordering::SeqCst), 1);
        assert_eq!(losses.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn same_listener_registered_twice_is_stored_once() {
        let bus = EventBus::default();
        let hits = Arc::new(AtomicUsize::new(0));
        let l = counting_listener(&hits);
        bus.subscribe(Topic::Pong, Arc::clone(&l));
        bus.subscribe(Topic::Pong, Arc::clone(&l));

        assert_eq!(bus.listener_count(Topic::Pong), 1);
        bus.publish(pong());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unsubscribe_removes_by_identity() {
        let bus = EventBus::default();
        let hits = Arc::new(AtomicUsize::new(0));
        let kept = counting_listener(&hits);
        let removed = counting_listener(&hits);
        bus.subscribe(Topic::Pong, Arc::clone(&kept));
        bus.subscribe(Topic::Pong, Arc::clone(&removed));

        bus.unsubscribe(Topic::Pong, &removed);
        bus.publish(pong());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unsubscribe_unknown_listener_is_noop() {
        let bus = EventBus::default();
        let hits = Arc::new(AtomicUsize::new(0));
        bus.unsubscribe(Topic::Error, &counting_listener(&hits));
        assert_eq!(bus.listener_count(Topic::Error), 0);
    }

    #[test]
    fn failing_listener_does_not_block_the_others() {
        let bus = EventBus::default();
        let hits = Arc::new(AtomicUsize::new(0));
        bus.subscribe(
            Topic::Pong,
            listener(|_| Err(PulseError::Listener("boom".to_string()))),
        );
        bus.subscribe(Topic::Pong, counting_listener(&hits));

        assert_eq!(bus.publish(pong()), 1);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn panicking_listener_is_contained() {
        let bus = EventBus::default();
        let hits = Arc::new(AtomicUsize::new(0));
        bus.subscribe(Topic::Pong, listener(|_| panic!("listener exploded")));
        bus.subscribe(Topic::Pong, counting_listener(&hits));

        assert_eq!(bus.publish(pong()), 1);
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        // The registry is still usable afterwards.
        bus.publish(pong());
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn listener_may_unsubscribe_itself_while_running() {
        let bus = EventBus::default();
        let hits = Arc::new(AtomicUsize::new(0));
        let slot: Arc<Mutex<Option<Listener>>> = Arc::new(Mutex::new(None));

        let once = {
            let bus = bus.clone();
            let slot = Arc::clone(&slot);
            let hits = Arc::clone(&hits);
            listener(move |_| {
                hits.fetch_add(1, Ordering::SeqCst);
                if let Some(me) = slot.lock().unwrap().take() {
                    bus.unsubscribe(Topic::Pong, &me);
                }
                Ok(())
            })
        };
        *slot.lock().unwrap() = Some(Arc::clone(&once));
        bus.subscribe(Topic::Pong, once);

        bus.publish(pong());
        bus.publish(pong());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn clear_drops_every_topic() {
        let bus = EventBus::default();
        let hits = Arc::new(AtomicUsize::new(0));
        bus.subscribe(Topic::Pong, counting_listener(&hits));
        bus.subscribe(Topic::Error, counting_listener(&hits));

        bus.clear();
        assert_eq!(bus.listener_count(Topic::Pong), 0);
        assert_eq!(bus.listener_count(Topic::Error), 0);
        assert_eq!(bus.publish(pong()), 0);
    }

    #[tokio::test]
    async fn tap_sees_every_published_event() -> Result<(), Box<dyn std::error::Error>> {
        let bus = EventBus::default();
        let mut tap = bus.tap();

        bus.publish(BusEvent::ConnectionLost {
            reason: DisconnectReason::ServerClosed,
        });
        bus.publish(pong());

        assert_eq!(tap.recv().await?.topic(), Topic::ConnectionLost);
        assert_eq!(tap.recv().await?.topic(), Topic::Pong);
        Ok(())
    }
}
