//! # Store
//!
//! Holds the canonical `AppState` and tells subscribers when it changes.
//!
//! ## Update Cycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        update_basket(updater)                           │
//! │                                                                         │
//! │  lock ─► old = current snapshot                                         │
//! │          new = AppState { basket: updater(&old.basket), ..old }         │
//! │          current = new                                   ─► unlock      │
//! │                                                                         │
//! │  snapshot listeners                                                     │
//! │  for each listener:                                                     │
//! │     selector? ── selector(new) == selector(old) ──► skip                │
//! │     callback(&new, &old)        (panics caught and logged)              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Snapshots are `Arc<AppState>`: a snapshot handed out by [`Store::state`]
//! never changes, the store only ever swaps in a new one.
//!
//! Updaters run while the state lock is held and must not call back into
//! the store. Listeners run after the lock is released and may.

use std::collections::HashMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use chrono::Utc;
use larek_core::{
    AppState, BasketState, CatalogState, NewNotification, Notification, OrderState, UiState,
};
use tokio::runtime::Handle;
use tokio::task::AbortHandle;
use tracing::{debug, error, warn};
use uuid::Uuid;

type StateCallback = Arc<dyn Fn(&AppState, &AppState) + Send + Sync>;
type ChangeFilter = Arc<dyn Fn(&AppState, &AppState) -> bool + Send + Sync>;

/// Handle returned by `subscribe`, needed to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub_{}", self.0)
    }
}

#[derive(Clone)]
struct Listener {
    id: ListenerId,
    changed: Option<ChangeFilter>,
    callback: StateCallback,
}

// =============================================================================
// Store
// =============================================================================

/// The single owner of application state.
pub struct Store {
    state: Mutex<Arc<AppState>>,
    listeners: Mutex<Vec<Listener>>,
    timers: Mutex<HashMap<String, AbortHandle>>,
    next_id: AtomicU64,
}

impl Default for Store {
    fn default() -> Self {
        Self::with_state(AppState::default())
    }
}

impl Store {
    /// Creates a store with the empty initial state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store starting from `state`.
    pub fn with_state(state: AppState) -> Self {
        Store {
            state: Mutex::new(Arc::new(state)),
            listeners: Mutex::new(Vec::new()),
            timers: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(0),
        }
    }

    /// The current snapshot.
    pub fn state(&self) -> Arc<AppState> {
        Arc::clone(&self.state_guard())
    }

    // =========================================================================
    // Updaters
    // =========================================================================

    /// Replaces the whole state.
    pub fn update(&self, updater: impl FnOnce(&AppState) -> AppState) {
        let (new, old) = {
            let mut current = self.state_guard();
            let old = Arc::clone(&current);
            let new = Arc::new(updater(&old));
            *current = Arc::clone(&new);
            (new, old)
        };
        self.notify(&new, &old);
    }

    pub fn update_catalog(&self, updater: impl FnOnce(&CatalogState) -> CatalogState) {
        self.update(|state| AppState {
            catalog: updater(&state.catalog),
            ..state.clone()
        });
    }

    pub fn update_basket(&self, updater: impl FnOnce(&BasketState) -> BasketState) {
        self.update(|state| AppState {
            basket: updater(&state.basket),
            ..state.clone()
        });
    }

    pub fn update_order(&self, updater: impl FnOnce(&OrderState) -> OrderState) {
        self.update(|state| AppState {
            order: updater(&state.order),
            ..state.clone()
        });
    }

    pub fn update_ui(&self, updater: impl FnOnce(&UiState) -> UiState) {
        self.update(|state| AppState {
            ui: updater(&state.ui),
            ..state.clone()
        });
    }

    // =========================================================================
    // Subscriptions
    // =========================================================================

    /// Calls `callback(new, old)` after every update.
    pub fn subscribe<C>(&self, callback: C) -> ListenerId
    where
        C: Fn(&AppState, &AppState) + Send + Sync + 'static,
    {
        self.add_listener(None, Arc::new(callback))
    }

    /// Calls `callback(new, old)` only when `selector` picks out a different
    /// value from the new state than from the old one.
    ///
    /// ## Example
    /// ```rust
    /// use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
    /// use larek_engine::Store;
    ///
    /// let store = Store::new();
    /// let calls = Arc::new(AtomicUsize::new(0));
    /// let seen = Arc::clone(&calls);
    /// store.subscribe_with(|s| s.basket.total, move |_, _| {
    ///     seen.fetch_add(1, Ordering::SeqCst);
    /// });
    ///
    /// store.update_order(|o| o.clone());
    /// assert_eq!(calls.load(Ordering::SeqCst), 0);
    /// ```
    pub fn subscribe_with<T, S, C>(&self, selector: S, callback: C) -> ListenerId
    where
        T: PartialEq,
        S: Fn(&AppState) -> T + Send + Sync + 'static,
        C: Fn(&AppState, &AppState) + Send + Sync + 'static,
    {
        let changed: ChangeFilter = Arc::new(move |new, old| selector(new) != selector(old));
        self.add_listener(Some(changed), Arc::new(callback))
    }

    /// Removes a listener. Returns false if it was not registered.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners_guard();
        let before = listeners.len();
        listeners.retain(|l| l.id != id);
        listeners.len() != before
    }

    /// Removes every listener.
    pub fn unsubscribe_all(&self) {
        self.listeners_guard().clear();
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners_guard().len()
    }

    fn add_listener(&self, changed: Option<ChangeFilter>, callback: StateCallback) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        self.listeners_guard().push(Listener {
            id,
            changed,
            callback,
        });
        id
    }

    fn notify(&self, new: &AppState, old: &AppState) {
        let snapshot = self.listeners_guard().clone();

        for listener in snapshot {
            let delivered = panic::catch_unwind(AssertUnwindSafe(|| {
                let changed = listener
                    .changed
                    .as_ref()
                    .map_or(true, |changed| changed(new, old));
                if changed {
                    (listener.callback)(new, old);
                }
            }));

            if delivered.is_err() {
                error!(listener = %listener.id, "State listener panicked");
            }
        }
    }

    // =========================================================================
    // Notifications
    // =========================================================================

    /// Appends a notification and schedules its removal.
    ///
    /// The removal timer runs on the ambient tokio runtime. Without one the
    /// notification stays until [`Store::remove_notification`] is called.
    ///
    /// ## Returns
    /// The id assigned to the notification.
    pub fn add_notification(self: &Arc<Self>, notification: NewNotification) -> String {
        let id = Uuid::new_v4().to_string();
        let duration_ms = notification.duration_ms;

        let entry = Notification {
            id: id.clone(),
            kind: notification.kind,
            message: notification.message,
            duration_ms,
            timestamp: Utc::now(),
        };
        self.update_ui(|ui| {
            let mut ui = ui.clone();
            ui.notifications.push(entry);
            ui
        });

        if let Some(ms) = duration_ms.filter(|ms| *ms > 0) {
            self.schedule_removal(&id, Duration::from_millis(u64::from(ms)));
        }

        id
    }

    /// Removes a notification and cancels its timer.
    ///
    /// ## Returns
    /// - `true` if the notification was present
    pub fn remove_notification(&self, id: &str) -> bool {
        if let Some(timer) = self.timers_guard().remove(id) {
            timer.abort();
        }
        self.drop_notification(id)
    }

    /// Aborts every pending removal timer.
    pub fn cancel_notification_timers(&self) {
        for (_, timer) in self.timers_guard().drain() {
            timer.abort();
        }
    }

    fn schedule_removal(self: &Arc<Self>, id: &str, after: Duration) {
        let Ok(runtime) = Handle::try_current() else {
            warn!(notification = %id, "No tokio runtime, notification will not auto-dismiss");
            return;
        };

        // Held across spawn so a short timer cannot fire before it is tracked.
        let mut timers = self.timers_guard();

        let store: Weak<Store> = Arc::downgrade(self);
        let key = id.to_string();
        let task = runtime.spawn(async move {
            tokio::time::sleep(after).await;
            if let Some(store) = store.upgrade() {
                store.timers_guard().remove(&key);
                store.drop_notification(&key);
            }
        });

        timers.insert(id.to_string(), task.abort_handle());
    }

    fn drop_notification(&self, id: &str) -> bool {
        let present = self
            .state()
            .ui
            .notifications
            .iter()
            .any(|n| n.id == id);

        if present {
            self.update_ui(|ui| UiState {
                notifications: ui
                    .notifications
                    .iter()
                    .filter(|n| n.id != id)
                    .cloned()
                    .collect(),
                ..ui.clone()
            });
            debug!(notification = %id, "Notification removed");
        }
        present
    }

    // =========================================================================
    // Lock Helpers
    // =========================================================================

    fn state_guard(&self) -> MutexGuard<'_, Arc<AppState>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn listeners_guard(&self) -> MutexGuard<'_, Vec<Listener>> {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn timers_guard(&self) -> MutexGuard<'_, HashMap<String, AbortHandle>> {
        self.timers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for Store {
    fn drop(&mut self) {
        self.cancel_notification_timers();
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("state", &self.state())
            .field("listeners", &self.listener_count())
            .finish()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
