//! # Error Types
//!
//! Domain-specific error types for larek-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  larek-core errors (this file)                                          │
//! │  ├── CoreError        - Basket / order rule violations                  │
//! │  └── ValidationError  - Checkout field validation failures              │
//! │                                                                         │
//! │  larek-engine errors (separate crate)                                   │
//! │  ├── BusError         - Middleware aborted a dispatch                   │
//! │  ├── CommandError     - Command precondition failures                   │
//! │  └── CatalogError     - Catalog collaborator failures                   │
//! │                                                                         │
//! │  Flow: ValidationError → order.validation (stored, never thrown)        │
//! │        CoreError → CommandError → Storefront → error notification       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (product id, field)
//! 3. Each variant maps to a user-facing message

use thiserror::Error;

use crate::types::OrderField;

// =============================================================================
// Core Error
// =============================================================================

/// Basket and order rule violations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// The product is not a line of the basket.
    ///
    /// ## When This Occurs
    /// - Removing a product twice from two stale renderers
    /// - Removing a product whose line was already cleared
    #[error("Product {0} is not in the basket")]
    NotInBasket(String),

    /// A payment value outside the accepted set.
    #[error("Unknown payment method: {0}")]
    UnknownPaymentMethod(String),

    /// An order field name outside the checkout form.
    #[error("Unknown order field: {0}")]
    UnknownOrderField(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Checkout field validation failures.
///
/// The `Display` text is what the order form shows under the field, so it is
/// written for the shopper, not for the log.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is empty.
    #[error("{field} is required")]
    Required { field: OrderField },

    /// Field value is too short.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: OrderField, min: usize },

    /// Email does not look like `name@host.tld`.
    #[error("Invalid email format")]
    InvalidEmail,

    /// Phone has too few digits.
    #[error("Phone must contain at least {min_digits} digits")]
    PhoneTooShort { min_digits: usize },

    /// Payment is not one of the accepted methods.
    #[error("Choose a payment method")]
    PaymentNotSelected,
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::NotInBasket("p-42".to_string());
        assert_eq!(err.to_string(), "Product p-42 is not in the basket");
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: OrderField::Address,
        };
        assert_eq!(err.to_string(), "address is required");

        let err = ValidationError::TooShort {
            field: OrderField::Address,
            min: 5,
        };
        assert_eq!(err.to_string(), "address must be at least 5 characters");

        let err = ValidationError::PhoneTooShort { min_digits: 11 };
        assert_eq!(err.to_string(), "Phone must contain at least 11 digits");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let core_err: CoreError = ValidationError::InvalidEmail.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
