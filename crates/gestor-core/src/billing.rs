//! # Billing
//!
//! Prices order lines, totals them and settles payments against an invoice.
//!
//! ## Order Pricing Flow
//! ```text
//! OrderLine { product, qty, price override? }
//!      │
//!      ▼
//! price_line()  ── stock check (Product::can_sell) ── quantity limits
//!      │
//!      ▼
//! PricedLine { subtotal = unit × qty, tax = subtotal × IVA }
//!      │
//!      ▼
//! totals(&lines) ──► Totals { subtotal, tax, total }
//! ```
//!
//! ## Payment Settlement
//! ```text
//! paid + amount  <  total   ──► PENDIENTE
//! paid + amount  == total   ──► PAGADA
//! paid + amount  >  total   ──► PaymentExceedsBalance
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{Invoice, InvoiceStatus, Product};
use crate::validation::{validate_price_cents, validate_quantity};
use crate::{MAX_ITEM_QUANTITY, MAX_ORDER_ITEMS};

// =============================================================================
// Line Pricing
// =============================================================================

/// A line ready to be written as an invoice item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricedLine {
    pub product_id: String,
    pub sku: String,
    pub name: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub tax_rate_bps: u32,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    /// Whether stock must be decremented for this line.
    pub track_inventory: bool,
}

/// Prices `quantity` units of `product`.
///
/// `unit_price_override` replaces the catalog price (negotiated prices).
/// Stock is checked against the product as loaded inside the order
/// transaction.
pub fn price_line(
    product: &Product,
    quantity: i64,
    unit_price_override: Option<i64>,
) -> CoreResult<PricedLine> {
    if !product.is_active {
        return Err(CoreError::ProductNotFound(product.id.clone()));
    }
    if quantity > MAX_ITEM_QUANTITY {
        return Err(CoreError::QuantityTooLarge {
            requested: quantity,
            max: MAX_ITEM_QUANTITY,
        });
    }
    validate_quantity(quantity)?;
    if !product.can_sell(quantity) {
        return Err(CoreError::InsufficientStock {
            sku: product.sku.clone(),
            available: product.current_stock,
            requested: quantity,
        });
    }

    let unit_price = match unit_price_override {
        Some(cents) => {
            validate_price_cents(cents)?;
            Money::from_cents(cents)
        }
        None => product.price(),
    };

    let subtotal = unit_price.multiply_quantity(quantity);
    let tax = subtotal.calculate_tax(product.tax_rate());

    Ok(PricedLine {
        product_id: product.id.clone(),
        sku: product.sku.clone(),
        name: product.name.clone(),
        quantity,
        unit_price_cents: unit_price.cents(),
        tax_rate_bps: product.tax_rate_bps,
        subtotal_cents: subtotal.cents(),
        tax_cents: tax.cents(),
        track_inventory: product.track_inventory,
    })
}

/// Checks the number of lines on an order.
pub fn check_line_count(count: usize) -> CoreResult<()> {
    if count == 0 {
        return Err(CoreError::EmptyOrder);
    }
    if count > MAX_ORDER_ITEMS {
        return Err(CoreError::TooManyItems {
            max: MAX_ORDER_ITEMS,
        });
    }
    Ok(())
}

// =============================================================================
// Totals
// =============================================================================

/// Invoice-level amounts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    pub subtotal: Money,
    pub tax: Money,
    pub total: Money,
}

/// Sums priced lines. IVA is computed per line, then added up.
pub fn totals(lines: &[PricedLine]) -> Totals {
    let subtotal: Money = lines.iter().map(|l| Money::from_cents(l.subtotal_cents)).sum();
    let tax: Money = lines.iter().map(|l| Money::from_cents(l.tax_cents)).sum();
    Totals {
        subtotal,
        tax,
        total: subtotal + tax,
    }
}

// =============================================================================
// Payments
// =============================================================================

/// New paid amount and status after applying a payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settlement {
    pub paid: Money,
    pub status: InvoiceStatus,
}

/// Applies `amount` to `invoice`.
///
/// Voided invoices and credit notes reject payments; the paid amount may
/// never exceed the invoice total.
pub fn settle_payment(invoice: &Invoice, amount: Money) -> CoreResult<Settlement> {
    if !amount.is_positive() {
        return Err(CoreError::InvalidPaymentAmount {
            reason: "amount must be greater than zero".to_string(),
        });
    }
    if invoice.voucher_type.is_reversal() {
        return Err(CoreError::PaymentOnReversal {
            number: invoice.number.clone(),
        });
    }
    if invoice.is_voided() {
        return Err(CoreError::InvalidInvoiceStatus {
            number: invoice.number.clone(),
            status: invoice.status.as_str().to_string(),
        });
    }

    let balance = invoice.balance();
    if amount > balance {
        return Err(CoreError::PaymentExceedsBalance {
            balance: balance.to_string(),
            requested: amount.to_string(),
        });
    }

    let paid = invoice.paid() + amount;
    let status = status_for(paid, invoice.total());
    Ok(Settlement { paid, status })
}

/// Status of a non-voided invoice given what has been paid.
pub fn status_for(paid: Money, total: Money) -> InvoiceStatus {
    if paid >= total {
        InvoiceStatus::Pagada
    } else {
        InvoiceStatus::Pendiente
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
