//! # gestor-core: Pure Business Logic for Gestor
//!
//! This crate holds the invoicing rules of Gestor as pure functions with
//! zero I/O dependencies. The database layer and the HTTP app call into it;
//! it never calls out.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Gestor Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  Web client (browser, offline cache)            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ HTTP/JSON + auth cookie                │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    gestor-api (axum handlers)                   │   │
//! │  │    orders, invoices, credit notes, payments, reports, pdf       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ gestor-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌───────────┐ ┌──────────┐         │   │
//! │  │   │  types   │ │ voucher  │ │ numbering │ │ reversal │         │   │
//! │  │   │ Invoice  │ │ FA → NCA │ │ FA-0001   │ │   plan   │         │   │
//! │  │   └──────────┘ └──────────┘ └───────────┘ └──────────┘         │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌───────────┐ ┌──────────┐         │   │
//! │  │   │  money   │ │ billing  │ │  reports  │ │validation│         │   │
//! │  │   └──────────┘ └──────────┘ └───────────┘ └──────────┘         │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    gestor-db (Database Layer)                   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Invoice, Product, Client, Payment, ...)
//! - [`afip`] - The AFIP authorization trait
//! - [`voucher`] - Voucher types, prefixes and the reversal table
//! - [`numbering`] - Sequential `PREFIX-NNNN` numbers
//! - [`reversal`] - Credit-note planning for an existing invoice
//! - [`billing`] - Line pricing, totals and payment settlement
//! - [`reports`] - Commission, payment-method and product aggregation
//! - [`money`] - Integer money with ARS display
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation (CUIT, usernames, periods, ...)
//!
//! ## Example Usage
//!
//! ```rust
//! use gestor_core::numbering::next_number;
//! use gestor_core::voucher::VoucherType;
//!
//! let prefix = VoucherType::FacturaA.prefix();
//! let first = next_number(prefix, None).unwrap();
//! assert_eq!(first.number, "FA-0001");
//!
//! let second = next_number(prefix, Some(&first.number)).unwrap();
//! assert_eq!(second.number, "FA-0002");
//! assert_eq!(VoucherType::FacturaA.reversal(), Some(VoucherType::NotaCreditoA));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod afip;
pub mod billing;
pub mod error;
pub mod money;
pub mod numbering;
pub mod reports;
pub mod reversal;
pub mod types;
pub mod validation;
pub mod voucher;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use afip::{AfipClient, AfipError, AuthorizationRequest};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;
pub use voucher::VoucherType;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum line items accepted on a single order or voucher.
pub const MAX_ORDER_ITEMS: usize = 200;

/// Maximum quantity of a single line item.
///
/// Guards against typing 10000 instead of 10 on the order screen.
pub const MAX_ITEM_QUANTITY: i64 = 9_999;

/// Width the numeric suffix of a voucher number is padded to.
pub const NUMBER_WIDTH: usize = 4;

/// Default AFIP point of sale (series) when a branch has none configured.
pub const DEFAULT_POINT_OF_SALE: i64 = 1;
