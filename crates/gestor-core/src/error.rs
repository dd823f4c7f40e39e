//! # Error Types
//!
//! Domain-specific error types for gestor-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  gestor-core errors (this file)                                        │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  gestor-db errors (separate crate)                                     │
//! │  └── DbError          - Database failures, wraps CoreError             │
//! │                                                                         │
//! │  gestor-api errors (in app)                                            │
//! │  └── ApiError         - What the client sees (status + JSON body)      │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → HTTP         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations.
///
/// Every variant maps to `422 Unprocessable Entity` in the API except the
/// `*NotFound` variants (404) and [`CoreError::Validation`] (400).
#[derive(Debug, Error)]
pub enum CoreError {
    /// Product cannot be found or is inactive.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Invoice cannot be found.
    #[error("Invoice not found: {0}")]
    InvoiceNotFound(String),

    /// Insufficient stock to complete an order.
    ///
    /// ## When This Occurs
    /// - Product has track_inventory=true and allow_negative_stock=false
    /// - Requested quantity is above the current stock
    #[error("Insufficient stock for {sku}: available {available}, requested {requested}")]
    InsufficientStock {
        sku: String,
        available: i64,
        requested: i64,
    },

    /// Client cannot be found.
    #[error("Client not found: {0}")]
    ClientNotFound(String),

    /// Credit notes are only issued by reversing an existing invoice.
    #[error("Voucher type {voucher_type} can only be issued as a credit note for an invoice")]
    ReversalNotIssuable { voucher_type: String },

    /// The invoice was already voided by an earlier credit note.
    #[error("Invoice {number} is already voided")]
    AlreadyVoided { number: String },

    /// The voucher type has no reversal counterpart (credit notes).
    #[error("Voucher type {voucher_type} cannot be reversed")]
    UnsupportedReversal { voucher_type: String },

    /// A fiscal voucher without CAE cannot be reversed.
    #[error("Invoice {number} has no CAE and cannot be reversed")]
    MissingAuthorization { number: String },

    /// The previous voucher number does not follow `PREFIX-NNNN`.
    #[error("Malformed voucher number: {number}")]
    MalformedNumber { number: String },

    /// The invoice status does not allow the requested operation.
    #[error("Invoice {number} is {status}, cannot perform operation")]
    InvalidInvoiceStatus { number: String, status: String },

    /// Credit notes do not accept payments.
    #[error("Voucher {number} is a credit note and does not accept payments")]
    PaymentOnReversal { number: String },

    /// Payment would take the paid amount past the invoice total.
    #[error("Payment of {requested} exceeds outstanding balance of {balance}")]
    PaymentExceedsBalance { balance: String, requested: String },

    /// Payment amount is invalid.
    #[error("Invalid payment amount: {reason}")]
    InvalidPaymentAmount { reason: String },

    /// An order or voucher needs at least one line item.
    #[error("An order must contain at least one item")]
    EmptyOrder,

    /// Order has exceeded maximum allowed line items.
    #[error("An order cannot have more than {max} items")]
    TooManyItems { max: usize },

    /// Item quantity exceeds maximum allowed.
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    /// AFIP authorization failed (maps to 502).
    #[error(transparent)]
    Afip(#[from] crate::afip::AfipError),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too short.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., bad CUIT check digit, bad period).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
