//! # Event Bus
//!
//! Publish/subscribe with prioritized, middleware-wrapped dispatch.
//!
//! ## Dispatch Algorithm
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          emit(event)                                    │
//! │                                                                         │
//! │  1. Build EventRecord { kind, payload, context { ts, source, meta } }   │
//! │  2. Append to history (evict oldest past capacity)                      │
//! │  3. Run middleware chain ──── Err ──► return Err (no handler runs)      │
//! │  4. Snapshot handlers for kind (ascending priority, stable)             │
//! │  5. Await each handler in order                                         │
//! │       ├── Ok      → once? mark for removal                              │
//! │       ├── Err     → log, continue                                       │
//! │       └── panic   → log, continue                                       │
//! │  6. Remove fired once-subscriptions                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Locking
//! Registries sit behind `std::sync::Mutex` and are only touched between
//! awaits, so handlers may freely emit, subscribe or unsubscribe while a
//! dispatch is running.

mod event;
mod middleware;

pub use event::{BasketAction, Event, EventContext, EventKind, EventRecord};
pub use middleware::{EventMiddleware, LoggingMiddleware, Next, ValidationMiddleware, Validator};

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use tracing::{debug, error, info};

use crate::config::BusSettings;
use crate::error::{BusResult, HandlerError};

/// Default number of records kept in the history.
pub const DEFAULT_HISTORY_CAPACITY: usize = 1000;

/// A type-erased async event handler.
pub type EventHandler =
    Arc<dyn Fn(Event, EventContext) -> BoxFuture<'static, Result<(), HandlerError>> + Send + Sync>;

// =============================================================================
// Subscriptions
// =============================================================================

/// Handle returned by `on`/`once`, needed to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "event_{}", self.0)
    }
}

#[derive(Clone)]
struct Subscription {
    id: SubscriptionId,
    priority: i32,
    once: bool,
    handler: EventHandler,
}

// =============================================================================
// Event Bus
// =============================================================================

/// The storefront event bus.
pub struct EventBus {
    subscriptions: Mutex<HashMap<EventKind, Vec<Subscription>>>,
    middleware: Mutex<Vec<Arc<dyn EventMiddleware>>>,
    validation: Arc<ValidationMiddleware>,
    history: Mutex<VecDeque<EventRecord>>,
    history_capacity: usize,
    next_id: AtomicU64,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

impl EventBus {
    /// Creates a bus with only the validation middleware installed.
    pub fn new(history_capacity: usize) -> Self {
        let validation = Arc::new(ValidationMiddleware::new());
        let chain: Vec<Arc<dyn EventMiddleware>> = vec![validation.clone()];

        EventBus {
            subscriptions: Mutex::new(HashMap::new()),
            middleware: Mutex::new(chain),
            validation,
            history: Mutex::new(VecDeque::with_capacity(history_capacity.min(64))),
            history_capacity: history_capacity.max(1),
            next_id: AtomicU64::new(0),
        }
    }

    /// Creates a bus from config, adding the logging middleware on request.
    pub fn from_settings(settings: &BusSettings) -> Self {
        let bus = Self::new(settings.history_capacity);
        if settings.log_events {
            bus.add_middleware(Arc::new(LoggingMiddleware));
        }
        bus
    }

    // =========================================================================
    // Subscribe / Unsubscribe
    // =========================================================================

    /// Subscribes `handler` to `kind` with priority 0.
    pub fn on<F, Fut>(&self, kind: EventKind, handler: F) -> SubscriptionId
    where
        F: Fn(Event, EventContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
    {
        self.subscribe(kind, 0, false, handler)
    }

    /// Subscribes with an explicit priority; lower numbers run first.
    pub fn on_with_priority<F, Fut>(&self, kind: EventKind, priority: i32, handler: F) -> SubscriptionId
    where
        F: Fn(Event, EventContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
    {
        self.subscribe(kind, priority, false, handler)
    }

    /// Subscribes for one successful delivery.
    pub fn once<F, Fut>(&self, kind: EventKind, handler: F) -> SubscriptionId
    where
        F: Fn(Event, EventContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
    {
        self.subscribe(kind, 0, true, handler)
    }

    /// `once` with an explicit priority.
    pub fn once_with_priority<F, Fut>(&self, kind: EventKind, priority: i32, handler: F) -> SubscriptionId
    where
        F: Fn(Event, EventContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
    {
        self.subscribe(kind, priority, true, handler)
    }

    fn subscribe<F, Fut>(&self, kind: EventKind, priority: i32, once: bool, handler: F) -> SubscriptionId
    where
        F: Fn(Event, EventContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);

        // The call itself happens inside the future so a panicking handler
        // is caught by the dispatch loop.
        let handler = Arc::new(handler);
        let erased: EventHandler = Arc::new(move |event: Event, context: EventContext| {
            let handler = Arc::clone(&handler);
            async move { handler(event, context).await }.boxed()
        });

        let mut subscriptions = self.subscriptions();
        let list = subscriptions.entry(kind).or_default();
        list.push(Subscription {
            id,
            priority,
            once,
            handler: erased,
        });
        // Vec::sort_by_key is stable: equal priorities keep registration order.
        list.sort_by_key(|s| s.priority);

        debug!(event = %kind, %id, priority, once, "Subscribed");
        id
    }

    /// Removes one subscription. Returns false if it was not registered.
    pub fn off(&self, kind: EventKind, id: SubscriptionId) -> bool {
        let mut subscriptions = self.subscriptions();
        let Some(list) = subscriptions.get_mut(&kind) else {
            return false;
        };

        let before = list.len();
        list.retain(|s| s.id != id);
        let removed = list.len() != before;

        if list.is_empty() {
            subscriptions.remove(&kind);
        }
        removed
    }

    /// Removes every subscription of `kind`, or of every kind when `None`.
    pub fn off_all(&self, kind: Option<EventKind>) {
        let mut subscriptions = self.subscriptions();
        match kind {
            Some(kind) => {
                subscriptions.remove(&kind);
            }
            None => subscriptions.clear(),
        }
    }

    // =========================================================================
    // Middleware
    // =========================================================================

    /// Appends a middleware to the chain (after validation).
    pub fn add_middleware(&self, middleware: Arc<dyn EventMiddleware>) {
        info!(middleware = middleware.name(), "Event middleware installed");
        self.middleware
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(middleware);
    }

    /// Registers a payload predicate with the validation middleware.
    pub fn add_validator<F>(&self, kind: EventKind, validator: F)
    where
        F: Fn(&Event) -> bool + Send + Sync + 'static,
    {
        self.validation.add_validator(kind, Arc::new(validator));
    }

    // =========================================================================
    // Emit
    // =========================================================================

    /// Dispatches `event` to every subscriber of its kind.
    ///
    /// ## Returns
    /// - `Ok(())` once every handler has run (handler failures are logged)
    /// - `Err(BusError)` if a middleware aborted the dispatch
    pub async fn emit(
        &self,
        event: Event,
        source: impl Into<String>,
        metadata: Option<serde_json::Value>,
    ) -> BusResult<()> {
        let record = EventRecord::new(event, source.into(), metadata);
        self.remember(record.clone());

        let chain = self
            .middleware
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        Next::new(self, &chain).run(&record).await
    }

    /// Delivers a record to its handlers. Runs at the end of the chain.
    pub(crate) async fn dispatch(&self, record: &EventRecord) {
        let snapshot = self.handlers_for(record.kind);
        if snapshot.is_empty() {
            debug!(event = %record.kind, "No subscribers");
            return;
        }

        let mut fired_once = Vec::new();
        for subscription in snapshot {
            let call = (subscription.handler)(record.payload.clone(), record.context.clone());

            match AssertUnwindSafe(call).catch_unwind().await {
                Ok(Ok(())) => {
                    if subscription.once {
                        fired_once.push(subscription.id);
                    }
                }
                Ok(Err(e)) => {
                    error!(event = %record.kind, id = %subscription.id, error = %e, "Event handler failed");
                }
                Err(_) => {
                    error!(event = %record.kind, id = %subscription.id, "Event handler panicked");
                }
            }
        }

        for id in fired_once {
            self.off(record.kind, id);
        }
    }

    // =========================================================================
    // Diagnostics
    // =========================================================================

    /// Recorded events, oldest first.
    pub fn history(&self) -> Vec<EventRecord> {
        self.history_guard().iter().cloned().collect()
    }

    pub fn clear_history(&self) {
        self.history_guard().clear();
    }

    /// Number of live subscriptions for `kind`.
    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        self.subscriptions().get(&kind).map_or(0, Vec::len)
    }

    /// Kinds with at least one subscription, sorted.
    pub fn event_kinds(&self) -> Vec<EventKind> {
        let mut kinds: Vec<_> = self.subscriptions().keys().copied().collect();
        kinds.sort();
        kinds
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn remember(&self, record: EventRecord) {
        let mut history = self.history_guard();
        history.push_back(record);
        while history.len() > self.history_capacity {
            history.pop_front();
        }
    }

    fn handlers_for(&self, kind: EventKind) -> Vec<Subscription> {
        self.subscriptions().get(&kind).cloned().unwrap_or_default()
    }

    fn subscriptions(&self) -> MutexGuard<'_, HashMap<EventKind, Vec<Subscription>>> {
        self.subscriptions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn history_guard(&self) -> MutexGuard<'_, VecDeque<EventRecord>> {
        self.history.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("event_kinds", &self.event_kinds())
            .field("history_len", &self.history_guard().len())
            .field("history_capacity", &self.history_capacity)
            .finish()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BusError;
    use std::sync::atomic::AtomicUsize;

    type Log = Arc<Mutex<Vec<&'static str>>>;

    fn recorder(log: &Log, tag: &'static str) -> impl Fn(Event, EventContext) -> BoxFuture<'static, Result<(), HandlerError>> + Send + Sync + 'static {
        let log = Arc::clone(log);
        move |_, _| {
            let log = Arc::clone(&log);
            async move {
                log.lock().unwrap().push(tag);
                Ok(())
            }
            .boxed()
        }
    }

    #[tokio::test]
    async fn test_priority_order_is_stable() {
        let bus = EventBus::default();
        let log: Log = Arc::default();

        bus.on_with_priority(EventKind::AppReady, 1, recorder(&log, "a"));
        bus.on_with_priority(EventKind::AppReady, 0, recorder(&log, "b"));
        bus.on_with_priority(EventKind::AppReady, 1, recorder(&log, "c"));

        bus.emit(Event::AppReady, "test", None).await.unwrap();

        assert_eq!(*log.lock().unwrap(), vec!["b", "a", "c"]);
    }

    #[tokio::test]
    async fn test_once_fires_a_single_time() {
        let bus = EventBus::default();
        let calls = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&calls);
        bus.once(EventKind::BasketCleared, move |_, _| {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        });

        bus.emit(Event::BasketCleared, "test", None).await.unwrap();
        bus.emit(Event::BasketCleared, "test", None).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(bus.subscriber_count(EventKind::BasketCleared), 0);
    }

    #[tokio::test]
    async fn test_failed_once_handler_stays_subscribed() {
        let bus = EventBus::default();
        bus.once(EventKind::AppReady, |_, _| async { Err::<(), HandlerError>("not yet".into()) });

        bus.emit(Event::AppReady, "test", None).await.unwrap();
        assert_eq!(bus.subscriber_count(EventKind::AppReady), 1);
    }

    #[tokio::test]
    async fn test_failing_handlers_do_not_stop_delivery() {
        let bus = EventBus::default();
        let log: Log = Arc::default();

        bus.on_with_priority(EventKind::AppReady, 0, |_, _| async {
            Err::<(), HandlerError>("boom".into())
        });
        bus.on_with_priority(EventKind::AppReady, 1, |_, _| async {
            if true {
                panic!("handler panic");
            }
            Ok::<(), HandlerError>(())
        });
        bus.on_with_priority(EventKind::AppReady, 2, recorder(&log, "last"));

        let result = bus.emit(Event::AppReady, "test", None).await;

        assert!(result.is_ok());
        assert_eq!(*log.lock().unwrap(), vec!["last"]);
    }

    #[tokio::test]
    async fn test_off_removes_empty_kind() {
        let bus = EventBus::default();
        let log: Log = Arc::default();

        let id = bus.on(EventKind::ModalClosed, recorder(&log, "x"));
        assert_eq!(id.to_string(), "event_1");
        assert_eq!(bus.event_kinds(), vec![EventKind::ModalClosed]);

        assert!(bus.off(EventKind::ModalClosed, id));
        assert!(!bus.off(EventKind::ModalClosed, id));
        assert!(bus.event_kinds().is_empty());

        bus.emit(Event::ModalClosed, "test", None).await.unwrap();
        assert!(log.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_off_all() {
        let bus = EventBus::default();
        let log: Log = Arc::default();
        bus.on(EventKind::ModalClosed, recorder(&log, "x"));
        bus.on(EventKind::AppReady, recorder(&log, "y"));

        bus.off_all(Some(EventKind::AppReady));
        assert_eq!(bus.event_kinds(), vec![EventKind::ModalClosed]);

        bus.off_all(None);
        assert!(bus.event_kinds().is_empty());
    }

    #[tokio::test]
    async fn test_validator_aborts_before_handlers() {
        let bus = EventBus::default();
        let log: Log = Arc::default();
        bus.on(EventKind::ModalOpen, recorder(&log, "opened"));
        bus.add_validator(EventKind::ModalOpen, |event| {
            matches!(event, Event::ModalOpen { content, .. } if !content.is_empty())
        });

        let rejected = Event::ModalOpen {
            content: String::new(),
            modal_type: None,
            product: None,
        };
        let err = bus.emit(rejected, "test", None).await.unwrap_err();
        assert_eq!(err, BusError::ValidationFailed(EventKind::ModalOpen));
        assert!(log.lock().unwrap().is_empty());

        let accepted = Event::ModalOpen {
            content: "basket".into(),
            modal_type: None,
            product: None,
        };
        bus.emit(accepted, "test", None).await.unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["opened"]);
    }

    #[tokio::test]
    async fn test_panicking_validator_aborts_with_middleware_error() {
        let bus = EventBus::default();
        let log: Log = Arc::default();
        bus.on(EventKind::ModalClose, recorder(&log, "closed"));
        bus.add_validator(EventKind::ModalClose, |_| panic!("broken predicate"));

        let err = bus.emit(Event::ModalClose, "test", None).await.unwrap_err();

        assert_eq!(
            err,
            BusError::Middleware {
                middleware: "validation".into(),
                kind: EventKind::ModalClose,
                reason: "validator panicked".into(),
            }
        );
        assert!(log.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_history_is_bounded() {
        let bus = EventBus::new(3);
        for i in 0..5 {
            bus.emit(Event::error(format!("e{i}")), "test", None).await.unwrap();
        }

        let history = bus.history();
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].payload, Event::error("e2"));
        assert_eq!(history[2].payload, Event::error("e4"));

        bus.clear_history();
        assert!(bus.history().is_empty());
    }

    #[tokio::test]
    async fn test_rejected_events_are_still_recorded() {
        let bus = EventBus::default();
        bus.add_validator(EventKind::AppReady, |_| false);

        assert!(bus.emit(Event::AppReady, "test", None).await.is_err());
        assert_eq!(bus.history().len(), 1);
    }

    #[tokio::test]
    async fn test_handler_receives_context() {
        let bus = EventBus::default();
        let seen: Arc<Mutex<Option<EventContext>>> = Arc::default();

        let slot = Arc::clone(&seen);
        bus.on(EventKind::AppReady, move |_, context| {
            let slot = Arc::clone(&slot);
            async move {
                *slot.lock().unwrap() = Some(context);
                Ok(())
            }
        });

        let meta = serde_json::json!({ "trace": 7 });
        bus.emit(Event::AppReady, "renderer", Some(meta.clone()))
            .await
            .unwrap();

        let context = seen.lock().unwrap().clone().unwrap();
        assert_eq!(context.source, "renderer");
        assert_eq!(context.metadata, Some(meta));
    }

    #[tokio::test]
    async fn test_handler_may_emit_reentrantly() {
        let bus = Arc::new(EventBus::default());
        let log: Log = Arc::default();
        bus.on(EventKind::ModalClosed, recorder(&log, "closed"));

        let inner = Arc::clone(&bus);
        bus.on(EventKind::ModalClose, move |_, _| {
            let bus = Arc::clone(&inner);
            async move {
                bus.emit(Event::ModalClosed, "handler", None).await?;
                Ok::<(), HandlerError>(())
            }
        });

        bus.emit(Event::ModalClose, "test", None).await.unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["closed"]);
    }

    #[tokio::test]
    async fn test_logging_middleware_passes_through() {
        let bus = EventBus::from_settings(&BusSettings {
            history_capacity: 10,
            log_events: true,
        });
        let log: Log = Arc::default();
        bus.on(EventKind::AppReady, recorder(&log, "ready"));

        bus.emit(Event::AppReady, "test", None).await.unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["ready"]);
    }
}
