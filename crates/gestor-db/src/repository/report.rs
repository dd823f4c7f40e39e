//! # Report Repository
//!
//! Fetches the raw rows behind the commission and sales reports. The
//! aggregation itself lives in `gestor_core::reports` so it can be tested
//! without a database.
//!
//! ```text
//! invoices ⋈ users          ──► SaleRow        ──► commissions()
//! payments ⋈ invoices       ──► PaymentRow     ──► sales_by_payment_method()
//! invoice_items ⋈ invoices  ──► ProductSaleRow ──► sales_by_product()
//! ```
//!
//! All ranges filter on the invoice issue date, both ends inclusive.

use chrono::NaiveDate;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use gestor_core::reports::{
    commissions, sales_by_payment_method, sales_by_product, PaymentMethodTotal, PaymentRow,
    ProductSaleRow, ProductSales, SaleRow, VendorCommission,
};
use gestor_core::validation::validate_date_range;

#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ReportRepository { pool }
    }

    pub async fn sale_rows(&self, from: NaiveDate, to: NaiveDate) -> DbResult<Vec<SaleRow>> {
        let rows = sqlx::query_as::<_, SaleRow>(
            r#"
            SELECT i.user_id, u.name AS vendor_name, u.commission_bps,
                   i.voucher_type, i.status, i.total_cents
            FROM invoices i
            JOIN users u ON u.id = i.user_id
            WHERE i.issue_date BETWEEN ?1 AND ?2
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn payment_rows(&self, from: NaiveDate, to: NaiveDate) -> DbResult<Vec<PaymentRow>> {
        let rows = sqlx::query_as::<_, PaymentRow>(
            r#"
            SELECT p.method, p.amount_cents, i.status AS invoice_status
            FROM payments p
            JOIN invoices i ON i.id = p.invoice_id
            WHERE i.issue_date BETWEEN ?1 AND ?2
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn product_rows(&self, from: NaiveDate, to: NaiveDate) -> DbResult<Vec<ProductSaleRow>> {
        let rows = sqlx::query_as::<_, ProductSaleRow>(
            r#"
            SELECT it.product_id, it.sku_snapshot AS sku, it.name_snapshot AS name,
                   it.quantity, it.subtotal_cents, i.voucher_type, i.status
            FROM invoice_items it
            JOIN invoices i ON i.id = it.invoice_id
            WHERE i.issue_date BETWEEN ?1 AND ?2
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Commission owed per vendor for paid invoices issued in range.
    pub async fn commissions(&self, from: NaiveDate, to: NaiveDate) -> DbResult<Vec<VendorCommission>> {
        validate_date_range(from, to)?;
        let rows = self.sale_rows(from, to).await?;
        debug!(rows = rows.len(), %from, %to, "Computing commissions");
        Ok(commissions(&rows))
    }

    pub async fn payment_methods(&self, from: NaiveDate, to: NaiveDate) -> DbResult<Vec<PaymentMethodTotal>> {
        validate_date_range(from, to)?;
        let rows = self.payment_rows(from, to).await?;
        Ok(sales_by_payment_method(&rows))
    }

    pub async fn products(&self, from: NaiveDate, to: NaiveDate) -> DbResult<Vec<ProductSales>> {
        validate_date_range(from, to)?;
        let rows = self.product_rows(from, to).await?;
        Ok(sales_by_product(&rows))
    }
}
