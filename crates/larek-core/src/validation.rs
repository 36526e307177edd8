//! # Validation Module
//!
//! Checkout form validation.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Where Validation Runs                              │
//! │                                                                         │
//! │  Field change (order:field:change)                                     │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  UpdateOrderField command                                              │
//! │  ├── writes the value                                                  │
//! │  └── validate_field(field, value) ← THIS MODULE                        │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  order.validation.<field> = Some(message) | None                       │
//! │                                                                         │
//! │  Errors are stored for the form to display, never thrown.              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use larek_core::validation::{validate_email, validate_phone};
//!
//! assert!(validate_email("a@b.com").is_ok());
//! assert!(validate_phone("+7 900 123 45 67").is_ok());
//! ```

use crate::error::ValidationError;
use crate::types::{OrderField, PaymentMethod};
use crate::{MIN_ADDRESS_LEN, MIN_PHONE_DIGITS};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Field Dispatch
// =============================================================================

/// Validates one checkout field.
///
/// Only the given field is checked; the rest of the form is untouched.
pub fn validate_field(field: OrderField, value: &str) -> ValidationResult<()> {
    match field {
        OrderField::Payment => validate_payment(value).map(|_| ()),
        OrderField::Address => validate_address(value),
        OrderField::Email => validate_email(value),
        OrderField::Phone => validate_phone(value),
    }
}

// =============================================================================
// String Validators
// =============================================================================

/// Validates an email address.
///
/// ## Rules
/// - Exactly one `@`, with a non-empty local part
/// - No whitespace anywhere
/// - The domain has a dot with characters on both sides
///
/// ## Example
/// ```rust
/// use larek_core::validation::validate_email;
///
/// assert!(validate_email("shopper@larek.dev").is_ok());
/// assert!(validate_email("bad").is_err());
/// assert!(validate_email("a@b").is_err());
/// ```
pub fn validate_email(email: &str) -> ValidationResult<()> {
    if email.chars().any(char::is_whitespace) {
        return Err(ValidationError::InvalidEmail);
    }

    let (local, domain) = email.split_once('@').ok_or(ValidationError::InvalidEmail)?;
    if local.is_empty() || domain.contains('@') {
        return Err(ValidationError::InvalidEmail);
    }

    // Some dot must have at least one character before and after it.
    let has_inner_dot = domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len());
    if !has_inner_dot {
        return Err(ValidationError::InvalidEmail);
    }

    Ok(())
}

/// Validates a phone number.
///
/// ## Rules
/// - At least `MIN_PHONE_DIGITS` (11) digits; formatting characters are
///   ignored
pub fn validate_phone(phone: &str) -> ValidationResult<()> {
    let digits = phone.chars().filter(char::is_ascii_digit).count();
    if digits < MIN_PHONE_DIGITS {
        return Err(ValidationError::PhoneTooShort {
            min_digits: MIN_PHONE_DIGITS,
        });
    }
    Ok(())
}

/// Validates a delivery address.
///
/// ## Rules
/// - Must not be blank
/// - At least `MIN_ADDRESS_LEN` (5) characters after trimming
pub fn validate_address(address: &str) -> ValidationResult<()> {
    let address = address.trim();

    if address.is_empty() {
        return Err(ValidationError::Required {
            field: OrderField::Address,
        });
    }

    if address.chars().count() < MIN_ADDRESS_LEN {
        return Err(ValidationError::TooShort {
            field: OrderField::Address,
            min: MIN_ADDRESS_LEN,
        });
    }

    Ok(())
}

/// Validates the payment selection and returns the parsed method.
pub fn validate_payment(payment: &str) -> ValidationResult<PaymentMethod> {
    payment
        .parse()
        .map_err(|_| ValidationError::PaymentNotSelected)
}

// =============================================================================
// Step Validators
// =============================================================================

/// Validates the contacts step; returns every failure, email first.
pub fn validate_contacts(email: &str, phone: &str) -> Vec<ValidationError> {
    [validate_email(email), validate_phone(phone)]
        .into_iter()
        .filter_map(Result::err)
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================
