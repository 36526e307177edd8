//! # larek-engine: Event Bus, Store and Commands for the Larek Storefront
//!
//! Every state transition of the storefront runs through this crate.
//!
//! ## Data Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Storefront Data Flow                            │
//! │                                                                         │
//! │  Renderer ── emit(inbound event) ──► EventBus                           │
//! │                                        │  middleware (validation, log)  │
//! │                                        ▼                                │
//! │                                  Storefront handler                     │
//! │                                        │                                │
//! │                                        ▼                                │
//! │                                  CommandManager ── execute / undo       │
//! │                                        │                                │
//! │                                        ▼                                │
//! │                                      Command ── update ──► Store        │
//! │                                        │                     │          │
//! │                      outbound event ◄──┘        listeners ◄──┘          │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`bus`] - Typed events, priority dispatch, middleware, history
//! - [`store`] - Application state snapshots, listeners, notifications
//! - [`command`] - Reversible commands and the undo/redo history
//! - [`catalog`] - Product sources (HTTP API, in-memory)
//! - [`config`] - TOML configuration with environment overrides
//! - [`app`] - The [`Storefront`] composition root
//! - [`error`] - Error types for every layer

pub mod app;
pub mod bus;
pub mod catalog;
pub mod command;
pub mod config;
pub mod error;
pub mod store;

pub use app::Storefront;
pub use bus::{Event, EventBus, EventContext, EventKind, EventRecord, SubscriptionId};
pub use catalog::{CatalogSource, HttpCatalogSource, StaticCatalog};
pub use command::{Command, CommandContext, CommandManager};
pub use config::StorefrontConfig;
pub use error::{BusError, CatalogError, CommandError, ConfigError, HandlerError};
pub use store::{ListenerId, Store};
