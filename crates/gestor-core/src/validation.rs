//! # Validation Module
//!
//! Input validation for Gestor.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP handler (axum)                                          │
//! │  ├── Type validation (serde deserialization)                           │
//! │  └── THIS MODULE: field rules (CUIT, SKU, periods, passwords)          │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Business rules (billing, reversal)                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  └── UNIQUE (username, sku, voucher number, offline id)                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDate;

use crate::error::ValidationError;
use crate::MAX_ITEM_QUANTITY;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

fn required(field: &str, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    Ok(())
}

fn max_len(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    if value.trim().chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }
    Ok(())
}

/// Validates a SKU.
///
/// ## Rules
/// - 1 to 50 characters
/// - Alphanumeric, hyphens and underscores only
///
/// ```rust
/// use gestor_core::validation::validate_sku;
///
/// assert!(validate_sku("YERBA-1KG").is_ok());
/// assert!(validate_sku("").is_err());
/// assert!(validate_sku("yerba mate").is_err());
/// ```
pub fn validate_sku(sku: &str) -> ValidationResult<()> {
    required("sku", sku)?;
    max_len("sku", sku, 50)?;

    if !sku
        .trim()
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "sku".to_string(),
            reason: "only letters, digits, '-' and '_' are allowed".to_string(),
        });
    }
    Ok(())
}

/// Validates a display name (products, clients, branches, users).
pub fn validate_name(field: &str, name: &str) -> ValidationResult<()> {
    required(field, name)?;
    max_len(field, name, 200)
}

/// Validates a login username: 3-50 characters, no whitespace.
pub fn validate_username(username: &str) -> ValidationResult<()> {
    required("username", username)?;
    if username.chars().count() < 3 {
        return Err(ValidationError::TooShort {
            field: "username".to_string(),
            min: 3,
        });
    }
    max_len("username", username, 50)?;
    if username.chars().any(char::is_whitespace) {
        return Err(ValidationError::InvalidFormat {
            field: "username".to_string(),
            reason: "must not contain spaces".to_string(),
        });
    }
    Ok(())
}

/// Validates a new password: at least 8 characters.
pub fn validate_password(password: &str) -> ValidationResult<()> {
    if password.chars().count() < 8 {
        return Err(ValidationError::TooShort {
            field: "password".to_string(),
            min: 8,
        });
    }
    max_len("password", password, 128)
}

/// Validates a CUIT/CUIL: 11 digits (dashes allowed) with a valid check digit.
///
/// ## Check Digit
/// ```text
///   digits   2  0  1  2  3  4  5  6  7  8  [d]
///   weights  5  4  3  2  7  6  5  4  3  2
///   d = 11 - (Σ digit×weight mod 11), 11 → 0, 10 → invalid
/// ```
///
/// ```rust
/// use gestor_core::validation::validate_cuit;
///
/// assert!(validate_cuit("20-12345678-6").is_ok());
/// assert!(validate_cuit("20123456781").is_err());
/// ```
pub fn validate_cuit(cuit: &str) -> ValidationResult<String> {
    let digits: String = cuit.chars().filter(|c| *c != '-').collect();
    let invalid = |reason: &str| ValidationError::InvalidFormat {
        field: "cuit".to_string(),
        reason: reason.to_string(),
    };

    if digits.len() != 11 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid("must be 11 digits"));
    }

    const WEIGHTS: [u32; 10] = [5, 4, 3, 2, 7, 6, 5, 4, 3, 2];
    let values: Vec<u32> = digits.bytes().map(|b| (b - b'0') as u32).collect();
    let sum: u32 = values.iter().zip(WEIGHTS.iter()).map(|(d, w)| d * w).sum();

    let expected = match 11 - (sum % 11) {
        11 => 0,
        10 => return Err(invalid("invalid check digit")),
        d => d,
    };

    if values[10] != expected {
        return Err(invalid("invalid check digit"));
    }
    Ok(digits)
}

/// Validates a client tax id: either a CUIT or a 7-8 digit DNI.
pub fn validate_tax_id(tax_id: &str) -> ValidationResult<String> {
    let digits: String = tax_id.chars().filter(|c| *c != '-' && *c != '.').collect();
    if (7..=8).contains(&digits.len()) && digits.bytes().all(|b| b.is_ascii_digit()) {
        return Ok(digits);
    }
    validate_cuit(tax_id)
}

/// Validates a commission period (`YYYY-MM`).
pub fn validate_commission_period(period: &str) -> ValidationResult<()> {
    let ok = period.len() == 7
        && NaiveDate::parse_from_str(&format!("{period}-01"), "%Y-%m-%d").is_ok();
    if !ok {
        return Err(ValidationError::InvalidFormat {
            field: "commission_period".to_string(),
            reason: "expected YYYY-MM".to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates an item quantity (1 to MAX_ITEM_QUANTITY).
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

/// Validates a price in centavos (zero allowed for gifts/samples).
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }
    Ok(())
}

/// Validates a payment amount: must be strictly positive.
pub fn validate_payment_amount(cents: i64) -> ValidationResult<()> {
    if cents <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "amount".to_string(),
        });
    }
    Ok(())
}

/// Validates an IVA rate against the rates AFIP accepts.
pub fn validate_tax_rate_bps(bps: u32) -> ValidationResult<()> {
    const ALLOWED: [u32; 6] = [0, 250, 500, 1050, 2100, 2700];
    if !ALLOWED.contains(&bps) {
        return Err(ValidationError::NotAllowed {
            field: "tax_rate_bps".to_string(),
            allowed: ALLOWED.iter().map(|b| b.to_string()).collect(),
        });
    }
    Ok(())
}

/// Validates a commission rate: 0% to 100%.
pub fn validate_commission_bps(bps: u32) -> ValidationResult<()> {
    if bps > 10_000 {
        return Err(ValidationError::OutOfRange {
            field: "commission_bps".to_string(),
            min: 0,
            max: 10_000,
        });
    }
    Ok(())
}

/// Validates an AFIP point of sale number (1 to 99999).
pub fn validate_point_of_sale(pos: i64) -> ValidationResult<()> {
    if !(1..=99_999).contains(&pos) {
        return Err(ValidationError::OutOfRange {
            field: "point_of_sale".to_string(),
            min: 1,
            max: 99_999,
        });
    }
    Ok(())
}

/// Validates a report date range (`from` ≤ `to`).
pub fn validate_date_range(from: NaiveDate, to: NaiveDate) -> ValidationResult<()> {
    if from > to {
        return Err(ValidationError::InvalidFormat {
            field: "from".to_string(),
            reason: "must not be after 'to'".to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
