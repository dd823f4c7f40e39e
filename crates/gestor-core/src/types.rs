//! # Domain Types
//!
//! Core domain types used throughout Gestor.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │     Client      │   │     Invoice     │   │    Payment      │       │
//! │  │  ─────────────  │◄──│  ─────────────  │◄──│  ─────────────  │       │
//! │  │  tax_id (CUIT)  │   │  number FA-0001 │   │  invoice_id     │       │
//! │  │  tax_condition  │   │  voucher_type   │   │  method         │       │
//! │  └─────────────────┘   │  status / cae   │   │  amount_cents   │       │
//! │                        │  voided_invoice │   └─────────────────┘       │
//! │  ┌─────────────────┐   └────────┬────────┘                              │
//! │  │    Product      │            │ 1..n                                  │
//! │  │  ─────────────  │   ┌────────▼────────┐   ┌─────────────────┐       │
//! │  │  sku, stock     │◄──│   InvoiceItem   │   │  User / Branch  │       │
//! │  │  tax_rate_bps   │   │  (snapshot)     │   │  role, comm bps │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every entity carries a UUID `id`; invoices also carry a business number.
//! JSON uses camelCase field names for the web client.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::voucher::VoucherType;

// =============================================================================
// Tax Rate
// =============================================================================

/// IVA rate in basis points (2100 = 21%).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    /// General IVA rate (21%).
    pub const GENERAL: TaxRate = TaxRate(2100);
    /// Reduced IVA rate (10.5%).
    pub const REDUCED: TaxRate = TaxRate(1050);

    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::GENERAL
    }
}

// =============================================================================
// Enumerations
// =============================================================================

/// IVA condition of a client (or of the issuing company).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum TaxCondition {
    ResponsableInscripto,
    Monotributo,
    Exento,
    ConsumidorFinal,
}

impl TaxCondition {
    /// Label printed on vouchers.
    pub const fn label(&self) -> &'static str {
        match self {
            TaxCondition::ResponsableInscripto => "IVA Responsable Inscripto",
            TaxCondition::Monotributo => "Responsable Monotributo",
            TaxCondition::Exento => "IVA Exento",
            TaxCondition::ConsumidorFinal => "Consumidor Final",
        }
    }
}

impl Default for TaxCondition {
    fn default() -> Self {
        TaxCondition::ConsumidorFinal
    }
}

/// Access level of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum Role {
    Superadmin,
    Admin,
    Vendedor,
}

impl Role {
    /// `ADMIN` and `SUPERADMIN` both pass admin checks.
    pub const fn is_admin(&self) -> bool {
        matches!(self, Role::Admin | Role::Superadmin)
    }

    pub const fn is_superadmin(&self) -> bool {
        matches!(self, Role::Superadmin)
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Role::Superadmin => "SUPERADMIN",
            Role::Admin => "ADMIN",
            Role::Vendedor => "VENDEDOR",
        }
    }
}

/// Lifecycle status of an invoice.
///
/// ```text
///   PENDIENTE ──(payments reach total)──► PAGADA
///       │                                   │
///       └──────────(credit note)────────────┴──► ANULADA (terminal)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[serde(rename_all = "UPPERCASE")]
#[ts(export)]
pub enum InvoiceStatus {
    Pendiente,
    Pagada,
    Anulada,
}

impl InvoiceStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Pendiente => "PENDIENTE",
            InvoiceStatus::Pagada => "PAGADA",
            InvoiceStatus::Anulada => "ANULADA",
        }
    }
}

impl Default for InvoiceStatus {
    fn default() -> Self {
        InvoiceStatus::Pendiente
    }
}

/// How a payment was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum PaymentMethod {
    Efectivo,
    TarjetaDebito,
    TarjetaCredito,
    Transferencia,
    CuentaCorriente,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 5] = [
        PaymentMethod::Efectivo,
        PaymentMethod::TarjetaDebito,
        PaymentMethod::TarjetaCredito,
        PaymentMethod::Transferencia,
        PaymentMethod::CuentaCorriente,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Efectivo => "EFECTIVO",
            PaymentMethod::TarjetaDebito => "TARJETA_DEBITO",
            PaymentMethod::TarjetaCredito => "TARJETA_CREDITO",
            PaymentMethod::Transferencia => "TRANSFERENCIA",
            PaymentMethod::CuentaCorriente => "CUENTA_CORRIENTE",
        }
    }
}

/// State of a queued print ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[serde(rename_all = "UPPERCASE")]
#[ts(export)]
pub enum PrintStatus {
    Pendiente,
    Impreso,
}

// =============================================================================
// Product
// =============================================================================

/// A product available for sale.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Product {
    pub id: String,

    /// Stock Keeping Unit - business identifier.
    pub sku: String,

    pub name: String,
    pub description: Option<String>,

    /// Net price in centavos (IVA is added on top).
    pub price_cents: i64,

    /// Cost in centavos (for margin reports).
    pub cost_cents: Option<i64>,

    /// IVA rate in basis points (2100 = 21%).
    pub tax_rate_bps: u32,

    pub track_inventory: bool,

    /// Allow selling when stock would go below zero.
    pub allow_negative_stock: bool,

    pub current_stock: i64,

    /// Soft-delete flag.
    pub is_active: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    #[inline]
    pub fn tax_rate(&self) -> TaxRate {
        TaxRate::from_bps(self.tax_rate_bps)
    }

    /// Checks if `quantity` units can be sold right now.
    pub fn can_sell(&self, quantity: i64) -> bool {
        if !self.track_inventory || self.allow_negative_stock {
            return true;
        }
        self.current_stock >= quantity
    }
}

// =============================================================================
// Client
// =============================================================================

/// A customer that vouchers are issued to.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Client {
    pub id: String,
    pub name: String,
    /// CUIT (11 digits) or DNI.
    pub tax_id: Option<String>,
    pub tax_condition: TaxCondition,
    pub address: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// User & Branch
// =============================================================================

/// A user of the system. Vendors are users with the `VENDEDOR` role.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct User {
    pub id: String,
    pub username: String,
    /// Argon2 PHC string. Never serialized.
    #[serde(skip)]
    #[ts(skip)]
    pub password_hash: String,
    pub name: String,
    pub role: Role,
    pub branch_id: Option<String>,
    /// Commission on paid sales, in basis points.
    pub commission_bps: u32,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// A branch (sucursal). Each one bills on its own AFIP point of sale.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Branch {
    pub id: String,
    pub name: String,
    pub address: Option<String>,
    pub point_of_sale: i64,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Invoice
// =============================================================================

/// An issued voucher: invoice, remito or credit note.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Invoice {
    pub id: String,
    /// Human-readable number, `PREFIX-NNNN`.
    pub number: String,
    /// Numeric suffix of `number`.
    pub sequence: i64,
    pub voucher_type: VoucherType,
    pub point_of_sale: i64,
    pub client_id: Option<String>,
    /// Vendor who issued the voucher.
    pub user_id: String,
    pub branch_id: Option<String>,
    #[ts(as = "String")]
    pub issue_date: NaiveDate,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
    pub paid_cents: i64,
    pub status: InvoiceStatus,
    pub cae: Option<String>,
    #[ts(as = "Option<String>")]
    pub cae_expires_on: Option<NaiveDate>,
    /// The invoice a credit note reverses.
    #[serde(rename = "facturaAnuladaId")]
    pub voided_invoice_id: Option<String>,
    pub reason: Option<String>,
    /// Client-generated id for orders replayed from the offline cache.
    pub offline_id: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Invoice {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    #[inline]
    pub fn paid(&self) -> Money {
        Money::from_cents(self.paid_cents)
    }

    /// Amount still owed.
    #[inline]
    pub fn balance(&self) -> Money {
        self.total() - self.paid()
    }

    #[inline]
    pub fn is_voided(&self) -> bool {
        self.status == InvoiceStatus::Anulada
    }
}

/// A line of an invoice. Product data is frozen at issue time.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct InvoiceItem {
    pub id: String,
    pub invoice_id: String,
    pub product_id: String,
    pub sku_snapshot: String,
    pub name_snapshot: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub tax_rate_bps: u32,
    /// unit_price × quantity, before IVA.
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl InvoiceItem {
    /// Line total including IVA.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.subtotal_cents + self.tax_cents)
    }
}

/// An invoice together with its lines, as returned by detail endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct InvoiceWithItems {
    #[serde(flatten)]
    pub invoice: Invoice,
    pub items: Vec<InvoiceItem>,
}

// =============================================================================
// Payment
// =============================================================================

/// A payment towards an invoice. Invoices may be paid in several parts.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Payment {
    pub id: String,
    pub invoice_id: String,
    pub method: PaymentMethod,
    pub amount_cents: i64,
    /// External reference (card auth code, transfer id).
    pub reference: Option<String>,
    /// Commission period the payment is attributed to (`YYYY-MM`).
    pub commission_period: Option<String>,
    pub user_id: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Payment {
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

// =============================================================================
// Cash Closure
// =============================================================================

/// A cash-register closure for a branch.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CashClosure {
    pub id: String,
    pub branch_id: Option<String>,
    pub user_id: String,
    #[ts(as = "Option<String>")]
    pub period_start: Option<DateTime<Utc>>,
    #[ts(as = "String")]
    pub period_end: DateTime<Utc>,
    pub cash_cents: i64,
    pub debit_cents: i64,
    pub credit_cents: i64,
    pub transfer_cents: i64,
    pub current_account_cents: i64,
    pub total_cents: i64,
    pub counted_cash_cents: i64,
    /// counted − expected cash; negative means the drawer is short.
    pub difference_cents: i64,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// AFIP
// =============================================================================

/// A stored AFIP certificate. The PEM blobs stay in the database.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct AfipCertificate {
    pub id: String,
    pub cuit: String,
    pub alias: String,
    #[ts(as = "Option<String>")]
    pub expires_on: Option<NaiveDate>,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Result of an AFIP authorization: the CAE and its expiry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Authorization {
    pub cae: String,
    #[ts(as = "String")]
    pub expires_on: NaiveDate,
}

// =============================================================================
// Print Ticket
// =============================================================================

/// A ticket that could not be delivered to the local print helper.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PrintTicket {
    pub id: String,
    pub invoice_id: String,
    /// Ticket body as JSON, exactly what was sent to the helper.
    pub payload: String,
    pub status: PrintStatus,
    pub attempts: i64,
    pub last_error: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub printed_at: Option<DateTime<Utc>>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn product(track: bool, allow_negative: bool, stock: i64) -> Product {
        Product {
            id: "p1".into(),
            sku: "YERBA-1KG".into(),
            name: "Yerba 1kg".into(),
            description: None,
            price_cents: 350_000,
            cost_cents: None,
            tax_rate_bps: 2100,
            track_inventory: track,
            allow_negative_stock: allow_negative,
            current_stock: stock,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_can_sell() {
        assert!(product(true, false, 5).can_sell(5));
        assert!(!product(true, false, 5).can_sell(6));
        assert!(product(true, true, 0).can_sell(10));
        assert!(product(false, false, 0).can_sell(10));
    }

    #[test]
    fn test_role_checks() {
        assert!(Role::Superadmin.is_admin());
        assert!(Role::Admin.is_admin());
        assert!(!Role::Vendedor.is_admin());
        assert!(!Role::Admin.is_superadmin());
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(serde_json::to_string(&InvoiceStatus::Anulada).unwrap(), "\"ANULADA\"");
        assert_eq!(
            serde_json::to_string(&PaymentMethod::TarjetaCredito).unwrap(),
            "\"TARJETA_CREDITO\""
        );
        assert_eq!(
            serde_json::to_string(&TaxCondition::ResponsableInscripto).unwrap(),
            "\"RESPONSABLE_INSCRIPTO\""
        );
        assert_eq!(serde_json::to_string(&Role::Vendedor).unwrap(), "\"VENDEDOR\"");
    }

    #[test]
    fn test_default_tax_rate_is_general_iva() {
        assert_eq!(TaxRate::default().bps(), 2100);
        assert!((TaxRate::REDUCED.percentage() - 10.5).abs() < 0.001);
    }
}
