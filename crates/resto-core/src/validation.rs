//! # Validation Module
//!
//! Input validation utilities for Resto POS.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP extractor (serde)                                       │
//! │  ├── Type validation (deserialization, enum names)                     │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Service (Rust)                                               │
//! │  └── THIS MODULE: field rules (lengths, ranges, formats)               │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  └── UNIQUE constraints (promo code, settlement date+user)             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDate;

use crate::error::ValidationError;
use crate::{MAX_AMOUNT_CENTS, MAX_ITEM_QUANTITY, MAX_ORDER_LINES};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a required free-text field and returns it trimmed.
///
/// ## Example
/// ```rust
/// use resto_core::validation::validate_required;
///
/// assert_eq!(validate_required("customer_name", "  Budi ", 100).unwrap(), "Budi");
/// assert!(validate_required("customer_name", "   ", 100).is_err());
/// ```
pub fn validate_required(field: &str, value: &str, max: usize) -> ValidationResult<String> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(value.to_string())
}

/// Validates a phone number: digits plus an optional leading `+`, 6-20 chars.
pub fn validate_phone(phone: &str) -> ValidationResult<String> {
    let phone = validate_required("customer_phone", phone, 20)?;
    let digits = phone.strip_prefix('+').unwrap_or(&phone);

    if digits.len() < 6 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::InvalidFormat {
            field: "customer_phone".to_string(),
            reason: "must contain 6-20 digits".to_string(),
        });
    }

    Ok(phone)
}

/// Minimal email shape check: one `@` with text on both sides and a dot in
/// the domain.
pub fn validate_email(email: &str) -> ValidationResult<String> {
    let email = validate_required("email", email, 255)?;

    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.contains('@')
        }
        None => false,
    };

    if !valid {
        return Err(ValidationError::InvalidFormat {
            field: "email".to_string(),
            reason: "must be a valid email address".to_string(),
        });
    }

    Ok(email.to_ascii_lowercase())
}

/// Normalizes a promo code: trimmed, uppercased, alphanumeric plus `-`/`_`.
///
/// ## Example
/// ```rust
/// use resto_core::validation::normalize_promo_code;
///
/// assert_eq!(normalize_promo_code(" hemat20 ").unwrap(), "HEMAT20");
/// assert!(normalize_promo_code("no spaces").is_err());
/// ```
pub fn normalize_promo_code(code: &str) -> ValidationResult<String> {
    let code = validate_required("code", code, 50)?;

    if !code
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "code".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(code.to_ascii_uppercase())
}

/// Passwords must be at least 6 characters.
pub fn validate_password(password: &str) -> ValidationResult<()> {
    if password.chars().count() < 6 {
        return Err(ValidationError::OutOfRange {
            field: "password".to_string(),
            min: 6,
            max: 128,
        });
    }
    if password.chars().count() > 128 {
        return Err(ValidationError::TooLong {
            field: "password".to_string(),
            max: 128,
        });
    }
    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line quantity: 1..=MAX_ITEM_QUANTITY.
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a non-negative amount in cents.
///
/// ## Example
/// ```rust
/// use resto_core::validation::validate_amount_cents;
///
/// assert!(validate_amount_cents("price", 1_000_000).is_ok());
/// assert!(validate_amount_cents("price", 0).is_ok());
/// assert!(validate_amount_cents("price", -100).is_err());
/// assert!(validate_amount_cents("price", i64::MAX).is_err());
/// ```
pub fn validate_amount_cents(field: &str, cents: i64) -> ValidationResult<()> {
    if !(0..=MAX_AMOUNT_CENTS).contains(&cents) {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_AMOUNT_CENTS,
        });
    }

    Ok(())
}

/// Validates the number of lines in a checkout.
pub fn validate_line_count(lines: usize) -> ValidationResult<()> {
    if lines == 0 {
        return Err(ValidationError::Required {
            field: "items".to_string(),
        });
    }

    if lines > MAX_ORDER_LINES {
        return Err(ValidationError::OutOfRange {
            field: "items".to_string(),
            min: 1,
            max: MAX_ORDER_LINES as i64,
        });
    }

    Ok(())
}

// =============================================================================
// Identifier & Date Validators
// =============================================================================

/// Validates a UUID string format.
///
/// ## Example
/// ```rust
/// use resto_core::validation::validate_uuid;
///
/// assert!(validate_uuid("menu_id", "550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_uuid("menu_id", "not-a-uuid").is_err());
/// ```
pub fn validate_uuid(field: &str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    uuid::Uuid::parse_str(id.trim()).map_err(|_| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

/// Parses a calendar date in `YYYY-MM-DD` form.
///
/// ## Example
/// ```rust
/// use resto_core::validation::parse_date;
///
/// assert!(parse_date("2026-01-30").is_ok());
/// assert!(parse_date("30/01/2026").is_err());
/// assert!(parse_date("2026-02-30").is_err());
/// ```
pub fn parse_date(raw: &str) -> ValidationResult<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| ValidationError::InvalidFormat {
        field: "date".to_string(),
        reason: "must be YYYY-MM-DD".to_string(),
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
