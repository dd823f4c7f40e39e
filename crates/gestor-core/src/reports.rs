//! # Reports
//!
//! Aggregations over rows the database layer selects for a date range.
//! The SQL only filters by date; which rows count is decided here.
//!
//! ```text
//! ┌──────────────────────────┬──────────────────────────────────────────────┐
//! │ Report                   │ Counts                                       │
//! ├──────────────────────────┼──────────────────────────────────────────────┤
//! │ commissions              │ PAGADA invoices, no credit notes             │
//! │ sales_by_payment_method  │ payments on non-voided invoices              │
//! │ sales_by_product         │ lines of non-voided invoices, no credit notes│
//! │ CashSummary              │ payments since the last closure              │
//! └──────────────────────────┴──────────────────────────────────────────────┘
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::{InvoiceStatus, PaymentMethod};
use crate::voucher::VoucherType;

// =============================================================================
// Commissions
// =============================================================================

/// One invoice as seen by the commission report.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleRow {
    pub user_id: String,
    pub vendor_name: String,
    pub commission_bps: u32,
    pub voucher_type: VoucherType,
    pub status: InvoiceStatus,
    pub total_cents: i64,
}

/// Commission owed to one vendor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct VendorCommission {
    pub user_id: String,
    pub vendor_name: String,
    pub invoice_count: i64,
    pub total_cents: i64,
    pub commission_bps: u32,
    pub commission_cents: i64,
}

/// Sums paid ordinary invoices per vendor and applies each vendor's rate.
///
/// The commission is computed once on the vendor total, rounded half up.
pub fn commissions(rows: &[SaleRow]) -> Vec<VendorCommission> {
    let mut by_vendor: BTreeMap<&str, VendorCommission> = BTreeMap::new();

    for row in rows
        .iter()
        .filter(|r| r.status == InvoiceStatus::Pagada && !r.voucher_type.is_reversal())
    {
        let entry = by_vendor
            .entry(row.user_id.as_str())
            .or_insert_with(|| VendorCommission {
                user_id: row.user_id.clone(),
                vendor_name: row.vendor_name.clone(),
                invoice_count: 0,
                total_cents: 0,
                commission_bps: row.commission_bps,
                commission_cents: 0,
            });
        entry.invoice_count += 1;
        entry.total_cents += row.total_cents;
    }

    let mut result: Vec<VendorCommission> = by_vendor
        .into_values()
        .map(|mut c| {
            c.commission_cents = Money::from_cents(c.total_cents)
                .percentage(c.commission_bps)
                .cents();
            c
        })
        .collect();
    result.sort_by(|a, b| a.vendor_name.cmp(&b.vendor_name));
    result
}

// =============================================================================
// Payment Methods
// =============================================================================

#[derive(Debug, Clone)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PaymentRow {
    pub method: PaymentMethod,
    pub amount_cents: i64,
    pub invoice_status: InvoiceStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PaymentMethodTotal {
    pub method: PaymentMethod,
    pub payment_count: i64,
    pub total_cents: i64,
}

/// Sums payments per method, skipping voided invoices.
pub fn sales_by_payment_method(rows: &[PaymentRow]) -> Vec<PaymentMethodTotal> {
    let mut by_method: BTreeMap<PaymentMethod, PaymentMethodTotal> = BTreeMap::new();

    for row in rows.iter().filter(|r| r.invoice_status != InvoiceStatus::Anulada) {
        let entry = by_method.entry(row.method).or_insert(PaymentMethodTotal {
            method: row.method,
            payment_count: 0,
            total_cents: 0,
        });
        entry.payment_count += 1;
        entry.total_cents += row.amount_cents;
    }

    by_method.into_values().collect()
}

// =============================================================================
// Products
// =============================================================================

#[derive(Debug, Clone)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ProductSaleRow {
    pub product_id: String,
    pub sku: String,
    pub name: String,
    pub quantity: i64,
    pub subtotal_cents: i64,
    pub voucher_type: VoucherType,
    pub status: InvoiceStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ProductSales {
    pub product_id: String,
    pub sku: String,
    pub name: String,
    pub quantity: i64,
    pub total_cents: i64,
}

/// Quantity and net amount per product, best sellers first.
pub fn sales_by_product(rows: &[ProductSaleRow]) -> Vec<ProductSales> {
    let mut by_product: BTreeMap<&str, ProductSales> = BTreeMap::new();

    for row in rows
        .iter()
        .filter(|r| r.status != InvoiceStatus::Anulada && !r.voucher_type.is_reversal())
    {
        let entry = by_product
            .entry(row.product_id.as_str())
            .or_insert_with(|| ProductSales {
                product_id: row.product_id.clone(),
                sku: row.sku.clone(),
                name: row.name.clone(),
                quantity: 0,
                total_cents: 0,
            });
        entry.quantity += row.quantity;
        entry.total_cents += row.subtotal_cents;
    }

    let mut result: Vec<ProductSales> = by_product.into_values().collect();
    result.sort_by(|a, b| b.total_cents.cmp(&a.total_cents).then(a.sku.cmp(&b.sku)));
    result
}

// =============================================================================
// Cash Closure Summary
// =============================================================================

/// Payment totals per method for a cash closure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CashSummary {
    pub cash_cents: i64,
    pub debit_cents: i64,
    pub credit_cents: i64,
    pub transfer_cents: i64,
    pub current_account_cents: i64,
    pub total_cents: i64,
}

impl CashSummary {
    /// Builds the summary from payment rows, skipping voided invoices.
    pub fn from_payments(rows: &[PaymentRow]) -> Self {
        let mut summary = CashSummary::default();
        for row in rows.iter().filter(|r| r.invoice_status != InvoiceStatus::Anulada) {
            let slot = match row.method {
                PaymentMethod::Efectivo => &mut summary.cash_cents,
                PaymentMethod::TarjetaDebito => &mut summary.debit_cents,
                PaymentMethod::TarjetaCredito => &mut summary.credit_cents,
                PaymentMethod::Transferencia => &mut summary.transfer_cents,
                PaymentMethod::CuentaCorriente => &mut summary.current_account_cents,
            };
            *slot += row.amount_cents;
            summary.total_cents += row.amount_cents;
        }
        summary
    }

    /// counted − expected cash.
    pub fn difference(&self, counted_cash_cents: i64) -> i64 {
        counted_cash_cents - self.cash_cents
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sale(user: &str, vt: VoucherType, status: InvoiceStatus, total: i64) -> SaleRow {
        SaleRow {
            user_id: user.into(),
            vendor_name: format!("Vendedor {user}"),
            commission_bps: 500,
            voucher_type: vt,
            status,
            total_cents: total,
        }
    }

    fn payment(method: PaymentMethod, amount: i64, status: InvoiceStatus) -> PaymentRow {
        PaymentRow {
            method,
            amount_cents: amount,
            invoice_status: status,
        }
    }

    #[test]
    fn test_commissions_only_count_paid_ordinary_invoices() {
        let rows = vec![
            sale("a", VoucherType::FacturaB, InvoiceStatus::Pagada, 100_000),
            sale("a", VoucherType::FacturaA, InvoiceStatus::Pagada, 23_450),
            sale("a", VoucherType::FacturaB, InvoiceStatus::Pendiente, 999_999),
            sale("a", VoucherType::FacturaB, InvoiceStatus::Anulada, 999_999),
            sale("a", VoucherType::NotaCreditoB, InvoiceStatus::Pagada, 999_999),
            sale("b", VoucherType::Remito, InvoiceStatus::Pagada, 10_000),
        ];

        let result = commissions(&rows);
        assert_eq!(result.len(), 2);

        let a = &result[0];
        assert_eq!(a.user_id, "a");
        assert_eq!(a.invoice_count, 2);
        assert_eq!(a.total_cents, 123_450);
        // 5% of 123_450 = 6_172.5 → 6_173
        assert_eq!(a.commission_cents, 6_173);

        assert_eq!(result[1].commission_cents, 500);
    }

    #[test]
    fn test_sales_by_payment_method() {
        let rows = vec![
            payment(PaymentMethod::Efectivo, 1_000, InvoiceStatus::Pagada),
            payment(PaymentMethod::Efectivo, 500, InvoiceStatus::Pendiente),
            payment(PaymentMethod::Transferencia, 7_000, InvoiceStatus::Pagada),
            payment(PaymentMethod::Efectivo, 9_999, InvoiceStatus::Anulada),
        ];
        let result = sales_by_payment_method(&rows);
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].method, PaymentMethod::Efectivo);
        assert_eq!(result[0].payment_count, 2);
        assert_eq!(result[0].total_cents, 1_500);
        assert_eq!(result[1].total_cents, 7_000);
    }

    #[test]
    fn test_sales_by_product_sorted_by_amount() {
        let line = |id: &str, qty: i64, amount: i64, vt, status| ProductSaleRow {
            product_id: id.into(),
            sku: id.to_uppercase(),
            name: id.into(),
            quantity: qty,
            subtotal_cents: amount,
            voucher_type: vt,
            status,
        };
        let rows = vec![
            line("yerba", 2, 2_000, VoucherType::FacturaB, InvoiceStatus::Pagada),
            line("azucar", 5, 5_000, VoucherType::FacturaA, InvoiceStatus::Pendiente),
            line("yerba", 1, 1_000, VoucherType::FacturaB, InvoiceStatus::Pagada),
            line("yerba", 9, 9_000, VoucherType::NotaCreditoB, InvoiceStatus::Pagada),
            line("azucar", 9, 9_000, VoucherType::FacturaA, InvoiceStatus::Anulada),
        ];
        let result = sales_by_product(&rows);
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].product_id, "azucar");
        assert_eq!(result[0].quantity, 5);
        assert_eq!(result[1].quantity, 3);
        assert_eq!(result[1].total_cents, 3_000);
    }

    #[test]
    fn test_cash_summary_and_difference() {
        let rows = vec![
            payment(PaymentMethod::Efectivo, 10_000, InvoiceStatus::Pagada),
            payment(PaymentMethod::TarjetaDebito, 3_000, InvoiceStatus::Pagada),
            payment(PaymentMethod::CuentaCorriente, 2_000, InvoiceStatus::Pendiente),
            payment(PaymentMethod::Efectivo, 4_000, InvoiceStatus::Anulada),
        ];
        let s = CashSummary::from_payments(&rows);
        assert_eq!(s.cash_cents, 10_000);
        assert_eq!(s.debit_cents, 3_000);
        assert_eq!(s.current_account_cents, 2_000);
        assert_eq!(s.total_cents, 15_000);
        assert_eq!(s.difference(9_500), -500);
        assert_eq!(s.difference(10_000), 0);
    }
}
