//! # Error Types
//!
//! Domain-specific error types for stitch-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  stitch-core errors (this file)                                        │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  stitch-db errors (separate crate)                                     │
//! │  └── DbError          - Database failures (wraps CoreError)            │
//! │                                                                         │
//! │  stitch-ops errors (binary)                                            │
//! │  └── OpsError         - What the operator sees                         │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → OpsError                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (number, outlet, date)
//! 3. Errors are enum variants, never String
//! 4. "No payout due" is NOT an error - it is `Option::None`

use chrono::NaiveDate;
use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Not enough stock at an outlet to move or consume.
    ///
    /// ## User Workflow
    /// ```text
    /// Transfer 5 × SHIRT-M from BLR-01
    ///      │
    ///      ▼
    /// Check stock at BLR-01: available=3
    ///      │
    ///      ▼
    /// InsufficientStock { product_id, outlet_id, available: 3, requested: 5 }
    /// ```
    #[error("Insufficient stock of {product_id} at {outlet_id}: available {available}, requested {requested}")]
    InsufficientStock {
        product_id: String,
        outlet_id: String,
        available: i64,
        requested: i64,
    },

    /// Report range is missing, reversed or too long.
    #[error("Invalid date range {from}..={to}: {reason}")]
    InvalidDateRange {
        from: NaiveDate,
        to: NaiveDate,
        reason: String,
    },

    /// Payments do not add up to the bill.
    #[error("Payments total {paid} but the bill is {expected}")]
    PaymentMismatch { expected: String, paid: String },

    /// Credit note cannot be redeemed (unknown, cancelled, exhausted).
    #[error("Credit note {number} cannot be redeemed: {reason}")]
    CreditNoteUnavailable { number: String, reason: String },

    /// No outlet could be determined for a document.
    #[error("Cannot determine the outlet for {document}")]
    LocationUnresolved { document: String },

    /// A register session already exists for this outlet and day.
    #[error("Register for outlet {outlet_id} on {business_date} is already open")]
    RegisterAlreadyOpen {
        outlet_id: String,
        business_date: NaiveDate,
    },

    /// Document is not in a state that allows the requested operation.
    ///
    /// ## When This Occurs
    /// - Voiding an already voided sale
    /// - Receiving a transfer twice
    /// - Closing a closed register
    #[error("{document} {id} is {current_status}, cannot perform operation")]
    InvalidStatus {
        document: String,
        id: String,
        current_status: String,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID, invalid prefix).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Two fields must differ (e.g. transfer source and destination).
    #[error("{field} must differ from {other}")]
    MustDiffer { field: String, other: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
