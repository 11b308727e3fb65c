//! # Validation Module
//!
//! Input validation utilities for Stitch POS.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Caller (ops CLI / request handler)                           │
//! │  └── Type validation (deserialization, clap parsing)                   │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE - business rule validation                       │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  ├── UNIQUE constraints (numbers, one active slab per threshold)       │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDate;

use crate::error::{CoreError, ValidationError};
use crate::money::Money;
use crate::MAX_LINE_QUANTITY;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest accepted sequence prefix.
pub const MAX_PREFIX_LEN: usize = 16;

/// Widest accepted zero-padding for document numbers.
pub const MAX_PAD_WIDTH: i64 = 12;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a document-number prefix.
///
/// ## Rules
/// - 1 to 16 characters
/// - ASCII uppercase letters, digits, `-` or `/`
/// - `@` is never allowed, so internal counter keys (`@barcode`) cannot
///   collide with a document family
///
/// ## Example
/// ```rust
/// use stitch_core::validation::validate_prefix;
///
/// assert!(validate_prefix("INV").is_ok());
/// assert!(validate_prefix("CONWS").is_ok());
/// assert!(validate_prefix("inv").is_err());
/// assert!(validate_prefix("@barcode").is_err());
/// ```
pub fn validate_prefix(prefix: &str) -> ValidationResult<()> {
    if prefix.is_empty() {
        return Err(ValidationError::Required {
            field: "prefix".to_string(),
        });
    }

    if prefix.len() > MAX_PREFIX_LEN {
        return Err(ValidationError::TooLong {
            field: "prefix".to_string(),
            max: MAX_PREFIX_LEN,
        });
    }

    if !prefix
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '-' || c == '/')
    {
        return Err(ValidationError::InvalidFormat {
            field: "prefix".to_string(),
            reason: "must contain only A-Z, 0-9, '-' or '/'".to_string(),
        });
    }

    Ok(())
}

/// Validates a zero-padding width (0 means "no padding").
pub fn validate_pad_width(width: i64) -> ValidationResult<()> {
    if !(0..=MAX_PAD_WIDTH).contains(&width) {
        return Err(ValidationError::OutOfRange {
            field: "pad_width".to_string(),
            min: 0,
            max: MAX_PAD_WIDTH,
        });
    }
    Ok(())
}

/// Validates a SKU (Stock Keeping Unit).
///
/// ## Rules
/// - Must not be empty, at most 50 characters
/// - Alphanumeric characters, hyphens, underscores
pub fn validate_sku(sku: &str) -> ValidationResult<()> {
    let sku = sku.trim();

    if sku.is_empty() {
        return Err(ValidationError::Required {
            field: "sku".to_string(),
        });
    }

    if sku.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "sku".to_string(),
            max: 50,
        });
    }

    if !sku
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "sku".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a display name (outlet, employee, customer, product).
pub fn validate_name(field: &str, name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if name.len() > 200 {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: 200,
        });
    }

    Ok(())
}

/// Validates that a reference id is present.
pub fn validate_required_id(field: &str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_LINE_QUANTITY
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_LINE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_LINE_QUANTITY,
        });
    }

    Ok(())
}

/// Validates that an amount is zero or more.
///
/// ## Example
/// ```rust
/// use stitch_core::money::Money;
/// use stitch_core::validation::validate_non_negative;
///
/// assert!(validate_non_negative("min_amount", Money::zero()).is_ok());
/// assert!(validate_non_negative("min_amount", Money::from_cents(-1)).is_err());
/// ```
pub fn validate_non_negative(field: &str, amount: Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: i64::MAX,
        });
    }
    Ok(())
}

/// Validates that an amount is strictly positive.
pub fn validate_positive(field: &str, amount: Money) -> ValidationResult<()> {
    if !amount.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Date Validators
// =============================================================================

/// Validates a report date range (inclusive on both ends).
///
/// ## Rules
/// - `from <= to`
/// - At most `max_days` calendar days in total
///
/// ## Example
/// ```rust
/// use chrono::NaiveDate;
/// use stitch_core::validation::validate_date_range;
///
/// let d = |day| NaiveDate::from_ymd_opt(2026, 3, day).unwrap();
/// assert!(validate_date_range(d(1), d(5), 366).is_ok());
/// assert!(validate_date_range(d(5), d(1), 366).is_err());
/// assert!(validate_date_range(d(1), d(5), 4).is_err());
/// ```
pub fn validate_date_range(from: NaiveDate, to: NaiveDate, max_days: i64) -> Result<(), CoreError> {
    if from > to {
        return Err(CoreError::InvalidDateRange {
            from,
            to,
            reason: "start date is after end date".to_string(),
        });
    }

    let days = (to - from).num_days() + 1;
    if days > max_days {
        return Err(CoreError::InvalidDateRange {
            from,
            to,
            reason: format!("range covers {} days, maximum is {}", days, max_days),
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
