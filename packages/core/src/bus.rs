//! The change bus: tag-keyed publish/subscribe for field changes.

use std::any::Any;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use prefstore_kv_store::Primitive;

/// What a publish carries to each subscriber.
///
/// The decoded value is type-erased; a handler that knows the field's value
/// type recovers it with [`value`](Self::value). The stored primitive is
/// always available as-is.
pub struct ChangeNotice {
    tag: String,
    field: String,
    key: String,
    value: Arc<dyn Any + Send + Sync>,
    stored: Primitive,
}

impl ChangeNotice {
    /// Build a notice.
    ///
    /// The accessor builds these on tagged writes; building one directly is
    /// useful for publishing out-of-band changes and for testing handlers.
    pub fn new(
        tag: impl Into<String>,
        field: impl Into<String>,
        key: impl Into<String>,
        value: Arc<dyn Any + Send + Sync>,
        stored: Primitive,
    ) -> Self {
        ChangeNotice {
            tag: tag.into(),
            field: field.into(),
            key: key.into(),
            value,
            stored,
        }
    }

    /// The tag this notice was published under.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// The field whose value changed.
    pub fn field(&self) -> &str {
        &self.field
    }

    /// The storage key backing the field.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The new decoded value, if it is a `T`.
    pub fn value<T: 'static>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    /// The new stored primitive.
    pub fn stored(&self) -> &Primitive {
        &self.stored
    }
}

impl std::fmt::Debug for ChangeNotice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeNotice")
            .field("tag", &self.tag)
            .field("field", &self.field)
            .field("key", &self.key)
            .field("stored", &self.stored)
            .finish()
    }
}

/// What a subscriber returns.
///
/// An `Err` is captured into the publish's [`PublishReport`]; it never stops
/// the handlers registered after it.
pub type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

type Handler = dyn Fn(&ChangeNotice) -> HandlerResult + Send + Sync;

/// Identifies one subscription on one tag.
///
/// Obtained from [`ChangeBus::subscribe`]; pass it back to
/// [`ChangeBus::unsubscribe`] to remove the handler. Dropping a handle does
/// not unsubscribe.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubscriptionHandle {
    tag: String,
    id: u64,
}

impl SubscriptionHandle {
    /// The tag the subscription listens on.
    pub fn tag(&self) -> &str {
        &self.tag
    }
}

/// One handler failure captured during a publish.
#[derive(Debug)]
pub struct HandlerFailure {
    /// The failing handler's subscription.
    pub subscription: SubscriptionHandle,
    /// The error the handler returned.
    pub error: Box<dyn std::error::Error + Send + Sync>,
}

/// The outcome of one publish.
#[derive(Debug, Default)]
pub struct PublishReport {
    /// How many handlers were invoked.
    pub notified: usize,
    /// Failures, in the order the failing handlers ran.
    pub failures: Vec<HandlerFailure>,
}

impl PublishReport {
    /// Whether every invoked handler succeeded.
    pub fn all_ok(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Tag-keyed publish/subscribe registry.
///
/// Handlers for a tag run synchronously on the publishing thread, in
/// registration order. A publish snapshots the tag's subscriber list under
/// the bus lock and invokes the snapshot outside it, so handlers may
/// subscribe and unsubscribe freely without skipping or double-invoking
/// anyone for the in-flight publish.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use prefstore_core::{ChangeBus, ChangeNotice};
/// use prefstore_kv_store::Primitive;
///
/// let bus = ChangeBus::new();
/// let handle = bus.subscribe("audio", |notice| {
///     println!("{} changed to {}", notice.field(), notice.stored());
///     Ok(())
/// });
///
/// let notice = ChangeNotice::new("audio", "volume", "volume", Arc::new(7i32), Primitive::Int(7));
/// let report = bus.publish(&notice);
/// assert_eq!(report.notified, 1);
/// assert!(bus.unsubscribe(&handle));
/// ```
pub struct ChangeBus {
    subscriptions: Mutex<HashMap<String, Vec<(u64, Arc<Handler>)>>>,
    next_id: AtomicU64,
}

impl ChangeBus {
    /// Create a bus with no subscriptions.
    pub fn new() -> Self {
        ChangeBus {
            subscriptions: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(0),
        }
    }

    /// Register `handler` on `tag`.
    ///
    /// The handler runs for every publish on the tag until the returned
    /// handle is passed to [`unsubscribe`](Self::unsubscribe).
    pub fn subscribe<F>(&self, tag: impl Into<String>, handler: F) -> SubscriptionHandle
    where
        F: Fn(&ChangeNotice) -> HandlerResult + Send + Sync + 'static,
    {
        let tag = tag.into();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        let mut subscriptions = self.subscriptions.lock().unwrap_or_else(|e| e.into_inner());
        subscriptions
            .entry(tag.clone())
            .or_default()
            .push((id, Arc::new(handler)));

        SubscriptionHandle { tag, id }
    }

    /// Remove the subscription behind `handle`.
    ///
    /// Returns `true` if the subscription was still registered. A publish
    /// already iterating its snapshot still delivers to the removed handler.
    pub fn unsubscribe(&self, handle: &SubscriptionHandle) -> bool {
        let mut subscriptions = self.subscriptions.lock().unwrap_or_else(|e| e.into_inner());
        let Some(handlers) = subscriptions.get_mut(&handle.tag) else {
            return false;
        };
        let before = handlers.len();
        handlers.retain(|(id, _)| *id != handle.id);
        let removed = handlers.len() != before;
        if handlers.is_empty() {
            subscriptions.remove(&handle.tag);
        }
        removed
    }

    /// Number of subscriptions currently registered on `tag`.
    pub fn subscriber_count(&self, tag: &str) -> usize {
        self.subscriptions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(tag)
            .map_or(0, Vec::len)
    }

    /// Deliver `notice` to every subscriber of its tag.
    ///
    /// Handlers run in registration order. A failing handler never prevents
    /// the handlers after it; failures are collected into the report after
    /// all handlers ran, and logged.
    pub fn publish(&self, notice: &ChangeNotice) -> PublishReport {
        let snapshot: Vec<(u64, Arc<Handler>)> = {
            let subscriptions = self.subscriptions.lock().unwrap_or_else(|e| e.into_inner());
            subscriptions
                .get(notice.tag())
                .map(|handlers| handlers.to_vec())
                .unwrap_or_default()
        };

        let mut report = PublishReport::default();
        for (id, handler) in snapshot {
            report.notified += 1;
            if let Err(error) = handler(notice) {
                tracing::warn!(
                    tag = notice.tag(),
                    field = notice.field(),
                    subscription = id,
                    %error,
                    "change handler failed"
                );
                report.failures.push(HandlerFailure {
                    subscription: SubscriptionHandle {
                        tag: notice.tag().to_string(),
                        id,
                    },
                    error,
                });
            }
        }
        report
    }
}

impl Default for ChangeBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn notice(tag: &str, value: i32) -> ChangeNotice {
        ChangeNotice::new(
            tag,
            "field",
            "key",
            Arc::new(value),
            Primitive::Int(value),
        )
    }

    #[test]
    fn publish_reaches_all_subscribers_in_order() {
        let bus = ChangeBus::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for label in ["first", "second", "third"] {
            let order = Arc::clone(&order);
            bus.subscribe("abs", move |_| {
                order.lock().unwrap().push(label);
                Ok(())
            });
        }

        let report = bus.publish(&notice("abs", 7));
        assert_eq!(report.notified, 3);
        assert!(report.all_ok());
        assert_eq!(*order.lock().unwrap(), vec!["first", "second", "third"]);
    }

    #[test]
    fn failing_handler_does_not_stop_siblings() {
        let bus = ChangeBus::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let c = Arc::clone(&calls);
        bus.subscribe("abs", move |_| {
            c.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        bus.subscribe("abs", |_| Err("handler broke".into()));
        let c = Arc::clone(&calls);
        bus.subscribe("abs", move |_| {
            c.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        let report = bus.publish(&notice("abs", 7));
        assert_eq!(report.notified, 3);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(format!("{}", report.failures[0].error).contains("handler broke"));
    }

    #[test]
    fn publish_only_reaches_matching_tag() {
        let bus = ChangeBus::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let c = Arc::clone(&calls);
        bus.subscribe("audio", move |_| {
            c.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        let report = bus.publish(&notice("video", 1));
        assert_eq!(report.notified, 0);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn unsubscribe_removes_only_its_handler() {
        let bus = ChangeBus::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let c = Arc::clone(&calls);
        let first = bus.subscribe("abs", move |_| {
            c.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        let c = Arc::clone(&calls);
        bus.subscribe("abs", move |_| {
            c.fetch_add(10, Ordering::SeqCst);
            Ok(())
        });

        assert!(bus.unsubscribe(&first));
        assert!(!bus.unsubscribe(&first));

        bus.publish(&notice("abs", 7));
        assert_eq!(calls.load(Ordering::SeqCst), 10);
        assert_eq!(bus.subscriber_count("abs"), 1);
    }

    #[test]
    fn unsubscribing_sibling_mid_publish_keeps_snapshot_delivery() {
        let bus = Arc::new(ChangeBus::new());
        let calls = Arc::new(AtomicUsize::new(0));

        // The first handler unsubscribes the second while the publish that
        // snapshotted both is still running; the second must still fire.
        let late: Arc<Mutex<Option<SubscriptionHandle>>> = Arc::new(Mutex::new(None));
        let bus_ref = Arc::clone(&bus);
        let late_ref = Arc::clone(&late);
        bus.subscribe("abs", move |_| {
            if let Some(handle) = late_ref.lock().unwrap().take() {
                bus_ref.unsubscribe(&handle);
            }
            Ok(())
        });

        let c = Arc::clone(&calls);
        let second = bus.subscribe("abs", move |_| {
            c.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        *late.lock().unwrap() = Some(second);

        let report = bus.publish(&notice("abs", 7));
        assert_eq!(report.notified, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // The unsubscription took effect for the next publish.
        let report = bus.publish(&notice("abs", 8));
        assert_eq!(report.notified, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn notice_value_downcasts() {
        let n = notice("abs", 42);
        assert_eq!(n.value::<i32>(), Some(&42));
        assert_eq!(n.value::<String>(), None);
        assert_eq!(n.stored(), &Primitive::Int(42));
    }
}
