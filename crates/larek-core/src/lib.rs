//! # larek-core: Pure Domain Types for the Larek Storefront
//!
//! This crate holds the state shape of the storefront and the rules that
//! keep it consistent. It has zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Larek Storefront Architecture                     │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Renderers (external collaborators)              │   │
//! │  │      Catalog ──► Preview ──► Basket ──► Order ──► Contacts      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ bus events                             │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              larek-engine (Bus, Store, Commands)                │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ larek-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐   │   │
//! │  │   │   types   │  │   money   │  │   error   │  │ validation│   │   │
//! │  │   │ AppState  │  │   Money   │  │ CoreError │  │  order    │   │   │
//! │  │   │ Product   │  │  display  │  │           │  │  fields   │   │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘   │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO TIMERS • NO NETWORK • PURE FUNCTIONS             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - State partitions (catalog, basket, order, ui) and entities
//! - [`money`] - Integer money with storefront display formatting
//! - [`error`] - Domain error types
//! - [`validation`] - Checkout field validation
//!
//! ## Example Usage
//!
//! ```rust
//! use larek_core::{BasketState, Money, Product};
//!
//! let product = Product::new("p1", "Widget", Some(Money::from_units(500)));
//! let basket = BasketState::default().with_product("p1", &product);
//!
//! assert_eq!(basket.items.len(), 1);
//! assert_eq!(basket.total, Money::from_units(500));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Modal content used when neither content nor a modal kind is given.
pub const DEFAULT_MODAL_CONTENT: &str = "default";

/// Minimum number of digits in a contact phone number.
pub const MIN_PHONE_DIGITS: usize = 11;

/// Minimum length of a delivery address (after trimming).
pub const MIN_ADDRESS_LEN: usize = 5;
