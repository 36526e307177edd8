//! # Bus Events
//!
//! The closed set of events the storefront exchanges.
//!
//! ## Event Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                             Event Flow                                  │
//! │                                                                         │
//! │  INBOUND (renderers → engine)         OUTBOUND (engine → renderers)     │
//! │  ────────────────────────────         ─────────────────────────────     │
//! │  product:add-to-basket       ──┐  ┌── basket:updated                    │
//! │  product:remove-from-basket  ──┤  ├── basket:cleared / basket:restored  │
//! │  basket:clear                ──┼─►├── catalog:loaded / catalog:error    │
//! │  order:field:change          ──┤  ├── catalog:cleared                   │
//! │  modal:open / modal:close    ──┘  ├── order:field:updated               │
//! │                                   ├── modal:opened / modal:closed       │
//! │                                   └── app:ready                         │
//! │                                                                         │
//! │  SYSTEM: error { message }  (anyone → notification)                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Wire Format
//! Events serialize adjacently tagged, keeping the original event names:
//! ```json
//! { "event": "product:remove-from-basket", "payload": { "product_id": "p1" } }
//! ```

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use larek_core::{ModalKind, OrderField, Product};
use serde::{Deserialize, Serialize};

use crate::error::BusError;

// =============================================================================
// Event Payloads
// =============================================================================

/// What happened to a basket line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BasketAction {
    Add,
    Remove,
}

/// Every event the bus carries, with its payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload")]
pub enum Event {
    // =========================================================================
    // Inbound
    // =========================================================================
    #[serde(rename = "product:add-to-basket")]
    ProductAddToBasket { product_id: String, product: Product },

    #[serde(rename = "product:remove-from-basket")]
    ProductRemoveFromBasket { product_id: String },

    #[serde(rename = "basket:clear")]
    BasketClear,

    #[serde(rename = "order:field:change")]
    OrderFieldChange { field: OrderField, value: String },

    #[serde(rename = "modal:open")]
    ModalOpen {
        content: String,
        #[serde(default)]
        modal_type: Option<ModalKind>,
        #[serde(default)]
        product: Option<Product>,
    },

    #[serde(rename = "modal:close")]
    ModalClose,

    // =========================================================================
    // Outbound
    // =========================================================================
    #[serde(rename = "basket:updated")]
    BasketUpdated {
        product_id: String,
        action: BasketAction,
    },

    #[serde(rename = "basket:cleared")]
    BasketCleared,

    #[serde(rename = "basket:restored")]
    BasketRestored,

    #[serde(rename = "catalog:loaded")]
    CatalogLoaded { items: Vec<Product> },

    #[serde(rename = "catalog:error")]
    CatalogError { error: String },

    #[serde(rename = "catalog:cleared")]
    CatalogCleared,

    #[serde(rename = "order:field:updated")]
    OrderFieldUpdated { field: OrderField, value: String },

    #[serde(rename = "modal:opened")]
    ModalOpened {
        content: Option<String>,
        product: Option<Product>,
    },

    #[serde(rename = "modal:closed")]
    ModalClosed,

    #[serde(rename = "app:ready")]
    AppReady,

    // =========================================================================
    // System
    // =========================================================================
    #[serde(rename = "error")]
    Error { message: String },
}

impl Event {
    /// The subscription key of this event.
    pub fn kind(&self) -> EventKind {
        match self {
            Event::ProductAddToBasket { .. } => EventKind::ProductAddToBasket,
            Event::ProductRemoveFromBasket { .. } => EventKind::ProductRemoveFromBasket,
            Event::BasketClear => EventKind::BasketClear,
            Event::OrderFieldChange { .. } => EventKind::OrderFieldChange,
            Event::ModalOpen { .. } => EventKind::ModalOpen,
            Event::ModalClose => EventKind::ModalClose,
            Event::BasketUpdated { .. } => EventKind::BasketUpdated,
            Event::BasketCleared => EventKind::BasketCleared,
            Event::BasketRestored => EventKind::BasketRestored,
            Event::CatalogLoaded { .. } => EventKind::CatalogLoaded,
            Event::CatalogError { .. } => EventKind::CatalogError,
            Event::CatalogCleared => EventKind::CatalogCleared,
            Event::OrderFieldUpdated { .. } => EventKind::OrderFieldUpdated,
            Event::ModalOpened { .. } => EventKind::ModalOpened,
            Event::ModalClosed => EventKind::ModalClosed,
            Event::AppReady => EventKind::AppReady,
            Event::Error { .. } => EventKind::Error,
        }
    }

    /// Shorthand for the system error event.
    pub fn error(message: impl Into<String>) -> Self {
        Event::Error {
            message: message.into(),
        }
    }
}

// =============================================================================
// Event Kind
// =============================================================================

/// Payload-free name of an event, used as the subscription key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventKind {
    #[serde(rename = "product:add-to-basket")]
    ProductAddToBasket,
    #[serde(rename = "product:remove-from-basket")]
    ProductRemoveFromBasket,
    #[serde(rename = "basket:clear")]
    BasketClear,
    #[serde(rename = "order:field:change")]
    OrderFieldChange,
    #[serde(rename = "modal:open")]
    ModalOpen,
    #[serde(rename = "modal:close")]
    ModalClose,
    #[serde(rename = "basket:updated")]
    BasketUpdated,
    #[serde(rename = "basket:cleared")]
    BasketCleared,
    #[serde(rename = "basket:restored")]
    BasketRestored,
    #[serde(rename = "catalog:loaded")]
    CatalogLoaded,
    #[serde(rename = "catalog:error")]
    CatalogError,
    #[serde(rename = "catalog:cleared")]
    CatalogCleared,
    #[serde(rename = "order:field:updated")]
    OrderFieldUpdated,
    #[serde(rename = "modal:opened")]
    ModalOpened,
    #[serde(rename = "modal:closed")]
    ModalClosed,
    #[serde(rename = "app:ready")]
    AppReady,
    #[serde(rename = "error")]
    Error,
}

impl EventKind {
    /// Every kind, inbound first.
    pub const ALL: [EventKind; 17] = [
        EventKind::ProductAddToBasket,
        EventKind::ProductRemoveFromBasket,
        EventKind::BasketClear,
        EventKind::OrderFieldChange,
        EventKind::ModalOpen,
        EventKind::ModalClose,
        EventKind::BasketUpdated,
        EventKind::BasketCleared,
        EventKind::BasketRestored,
        EventKind::CatalogLoaded,
        EventKind::CatalogError,
        EventKind::CatalogCleared,
        EventKind::OrderFieldUpdated,
        EventKind::ModalOpened,
        EventKind::ModalClosed,
        EventKind::AppReady,
        EventKind::Error,
    ];

    /// The wire name.
    pub const fn as_str(&self) -> &'static str {
        match self {
            EventKind::ProductAddToBasket => "product:add-to-basket",
            EventKind::ProductRemoveFromBasket => "product:remove-from-basket",
            EventKind::BasketClear => "basket:clear",
            EventKind::OrderFieldChange => "order:field:change",
            EventKind::ModalOpen => "modal:open",
            EventKind::ModalClose => "modal:close",
            EventKind::BasketUpdated => "basket:updated",
            EventKind::BasketCleared => "basket:cleared",
            EventKind::BasketRestored => "basket:restored",
            EventKind::CatalogLoaded => "catalog:loaded",
            EventKind::CatalogError => "catalog:error",
            EventKind::CatalogCleared => "catalog:cleared",
            EventKind::OrderFieldUpdated => "order:field:updated",
            EventKind::ModalOpened => "modal:opened",
            EventKind::ModalClosed => "modal:closed",
            EventKind::AppReady => "app:ready",
            EventKind::Error => "error",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = BusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| BusError::UnknownEvent(s.to_string()))
    }
}

// =============================================================================
// Dispatch Record
// =============================================================================

/// Dispatch context handed to every handler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventContext {
    pub timestamp: DateTime<Utc>,

    /// Free-form origin tag ("storefront", "basket-view", ...).
    pub source: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

/// One dispatched event as kept in the bus history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub kind: EventKind,
    pub payload: Event,
    pub context: EventContext,
}

impl EventRecord {
    /// Stamps `payload` with the current time.
    pub fn new(payload: Event, source: String, metadata: Option<serde_json::Value>) -> Self {
        EventRecord {
            kind: payload.kind(),
            payload,
            context: EventContext {
                timestamp: Utc::now(),
                source,
                metadata,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names_round_trip() {
        for kind in EventKind::ALL {
            assert_eq!(kind.as_str().parse::<EventKind>().unwrap(), kind);
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
        assert!("basket:explode".parse::<EventKind>().is_err());
    }

    #[test]
    fn test_event_wire_format() {
        let event = Event::ProductRemoveFromBasket {
            product_id: "p1".into(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "event": "product:remove-from-basket",
                "payload": { "product_id": "p1" }
            })
        );
    }

    #[test]
    fn test_event_from_renderer_json() {
        let event: Event = serde_json::from_str(
            r#"{ "event": "order:field:change", "payload": { "field": "email", "value": "a@b.com" } }"#,
        )
        .unwrap();
        assert_eq!(
            event,
            Event::OrderFieldChange {
                field: OrderField::Email,
                value: "a@b.com".into()
            }
        );

        let event: Event =
            serde_json::from_str(r#"{ "event": "modal:open", "payload": { "content": "basket" } }"#)
                .unwrap();
        assert_eq!(event.kind(), EventKind::ModalOpen);
    }

    #[test]
    fn test_record_takes_kind_from_payload() {
        let record = EventRecord::new(Event::AppReady, "test".into(), None);
        assert_eq!(record.kind, EventKind::AppReady);
        assert_eq!(record.context.source, "test");
    }
}
