//! # Bus Middleware
//!
//! Middleware wraps a dispatch: it sees the record first, decides whether to
//! pass it on, and can observe the outcome of everything after it.
//!
//! ## Chain Shape
//! ```text
//! emit(event)
//!    │
//!    ▼
//! ┌──────────────────────┐   ┌──────────────────────┐   ┌──────────────────┐
//! │ ValidationMiddleware │──►│  LoggingMiddleware   │──►│ handlers, by     │
//! │ (always first)       │   │  (opt-in)            │   │ ascending        │
//! │ Err → abort emit     │   │  times the rest      │   │ priority         │
//! │ panic → Middleware   │   │                      │   │                  │
//! └──────────────────────┘   └──────────────────────┘   └──────────────────┘
//! ```

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use async_trait::async_trait;
use tracing::{debug, error, warn};

use super::event::{Event, EventKind, EventRecord};
use super::EventBus;
use crate::error::{BusError, BusResult};

/// A payload predicate; `false` rejects the event.
pub type Validator = Arc<dyn Fn(&Event) -> bool + Send + Sync>;

// =============================================================================
// Middleware Trait
// =============================================================================

/// A link of the dispatch chain.
#[async_trait]
pub trait EventMiddleware: Send + Sync {
    /// Name used in logs and abort errors.
    fn name(&self) -> &str;

    /// Processes `record`; call `next.run(record)` to continue the chain.
    async fn handle(&self, record: &EventRecord, next: Next<'_>) -> BusResult<()>;
}

/// The rest of the chain after the current middleware.
pub struct Next<'a> {
    bus: &'a EventBus,
    remaining: &'a [Arc<dyn EventMiddleware>],
}

impl<'a> Next<'a> {
    pub(crate) fn new(bus: &'a EventBus, chain: &'a [Arc<dyn EventMiddleware>]) -> Self {
        Next {
            bus,
            remaining: chain,
        }
    }

    /// Runs the remaining middleware, then the handlers.
    pub async fn run(self, record: &EventRecord) -> BusResult<()> {
        match self.remaining.split_first() {
            Some((current, rest)) => {
                let next = Next {
                    bus: self.bus,
                    remaining: rest,
                };
                current.handle(record, next).await
            }
            None => {
                self.bus.dispatch(record).await;
                Ok(())
            }
        }
    }
}

// =============================================================================
// Validation Middleware
// =============================================================================

/// Rejects events whose payload fails a registered predicate.
#[derive(Default)]
pub struct ValidationMiddleware {
    validators: Mutex<HashMap<EventKind, Vec<Validator>>>,
}

impl ValidationMiddleware {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a predicate for `kind`. All predicates of a kind must pass.
    pub fn add_validator(&self, kind: EventKind, validator: Validator) {
        self.validators
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(kind)
            .or_default()
            .push(validator);
    }

    fn validators_for(&self, kind: EventKind) -> Vec<Validator> {
        self.validators
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&kind)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl EventMiddleware for ValidationMiddleware {
    fn name(&self) -> &str {
        "validation"
    }

    async fn handle(&self, record: &EventRecord, next: Next<'_>) -> BusResult<()> {
        for valid in self.validators_for(record.kind) {
            match panic::catch_unwind(AssertUnwindSafe(|| valid(&record.payload))) {
                Ok(true) => {}
                Ok(false) => {
                    warn!(event = %record.kind, source = %record.context.source, "Event rejected by validator");
                    return Err(BusError::ValidationFailed(record.kind));
                }
                Err(_) => {
                    error!(event = %record.kind, "Validator panicked");
                    return Err(BusError::Middleware {
                        middleware: self.name().to_string(),
                        kind: record.kind,
                        reason: "validator panicked".to_string(),
                    });
                }
            }
        }
        next.run(record).await
    }
}

// =============================================================================
// Logging Middleware
// =============================================================================

/// Logs every event and how long the rest of its dispatch took.
#[derive(Debug, Default)]
pub struct LoggingMiddleware;

#[async_trait]
impl EventMiddleware for LoggingMiddleware {
    fn name(&self) -> &str {
        "logging"
    }

    async fn handle(&self, record: &EventRecord, next: Next<'_>) -> BusResult<()> {
        debug!(
            event = %record.kind,
            source = %record.context.source,
            payload = ?record.payload,
            "Dispatching event"
        );

        let started = Instant::now();
        let result = next.run(record).await;
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

        match &result {
            Ok(()) => debug!(event = %record.kind, elapsed_ms, "Event dispatched"),
            Err(e) => warn!(event = %record.kind, elapsed_ms, error = %e, "Event dispatch aborted"),
        }
        result
    }
}
