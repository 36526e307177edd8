//! # Engine Error Types
//!
//! Error types for the bus, commands, catalog source and configuration.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Engine Error Categories                           │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │    BusError     │  │  CommandError   │  │     CatalogError        │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │ ValidationFailed│  │  CannotExecute  │  │  Http / Status          │ │
//! │  │ Middleware      │  │  NotInBasket    │  │  Decode / Empty         │ │
//! │  │                 │  │  Bus, Reentrant │  │                         │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  ┌─────────────────┐                                                   │
//! │  │   ConfigError   │   Handler failures are NOT errors of emit():      │
//! │  │                 │   they are logged and isolated by the bus.        │
//! │  │ Io/Parse/Invalid│                                                   │
//! │  └─────────────────┘                                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use crate::bus::EventKind;

/// Boxed error a bus handler may return.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

// =============================================================================
// Bus Errors
// =============================================================================

/// Errors that abort an `emit` before any handler runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BusError {
    /// A registered validator rejected the payload.
    #[error("Event {0} failed validation")]
    ValidationFailed(EventKind),

    /// A middleware refused to pass the event on.
    #[error("Middleware {middleware} aborted {kind}: {reason}")]
    Middleware {
        middleware: String,
        kind: EventKind,
        reason: String,
    },

    /// A string that names no event.
    #[error("Unknown event: {0}")]
    UnknownEvent(String),
}

/// Result type alias for bus operations.
pub type BusResult<T> = Result<T, BusError>;

// =============================================================================
// Command Errors
// =============================================================================

/// Errors raised by commands and the command manager.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    /// `can_execute()` returned false.
    #[error("Command cannot be executed: {description}")]
    CannotExecute { description: String },

    /// Removal of a product that has no basket line.
    #[error("Product {0} is not in the basket")]
    NotInBasket(String),

    /// The command's outbound event was rejected by the bus.
    #[error("Event dispatch failed: {0}")]
    Bus(#[from] BusError),

    /// A command was issued from inside another command's dispatch.
    #[error("Command issued while another command is running: {description}")]
    Reentrant { description: String },
}

/// Result type alias for command operations.
pub type CommandResult<T> = Result<T, CommandError>;

// =============================================================================
// Catalog Errors
// =============================================================================

/// Failures of a catalog source.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Transport-level failure (connect, TLS, timeout).
    #[error("Catalog request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("Catalog API returned status {0}")]
    Status(u16),

    /// The body was not a product list.
    #[error("Catalog response could not be decoded: {0}")]
    Decode(String),

    /// The API returned no products.
    #[error("Catalog is empty")]
    Empty,
}

/// Result type alias for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;

// =============================================================================
// Config Errors
// =============================================================================

/// Configuration loading failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// The config file is not valid TOML for this schema.
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of range.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Result type alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
