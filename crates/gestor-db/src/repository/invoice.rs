//! # Invoice Repository
//!
//! Issues vouchers, reverses them with credit notes and records payments.
//! Every write here is a single SQLite transaction.
//!
//! ## Issuing a Voucher
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN                                                                  │
//! │    offline_id seen before? ──yes──► ROLLBACK, return existing          │
//! │    resolve voucher type (explicit, else by client tax condition)       │
//! │    for each line: load product ► price_line ► stock -= qty             │
//! │    totals, payments ≤ total                                            │
//! │    last number in series ► next_number                                 │
//! │    fiscal? ► AfipClient::authorize ► CAE                               │
//! │    INSERT invoice, items, payments                                     │
//! │  COMMIT                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Reversing an Invoice
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN                                                                  │
//! │    load original + items ► plan_reversal (voided? type? CAE?)          │
//! │    next number in the credit-note series                               │
//! │    fiscal? ► authorize                                                 │
//! │    INSERT credit note (facturaAnuladaId = original) + copied items     │
//! │    stock += qty for every tracked line                                 │
//! │    UPDATE original SET status = 'ANULADA' WHERE status <> 'ANULADA'    │
//! │      └── 0 rows ► ROLLBACK, AlreadyVoided                              │
//! │  COMMIT                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Numbering reads and the insert share the transaction; the UNIQUE index on
//! `(voucher_type, point_of_sale, number)` rejects a concurrent duplicate.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};

use super::{begin_write, new_id};
use super::product::{apply_stock_delta, fetch_product};
use crate::error::{DbError, DbResult};
use gestor_core::billing::{check_line_count, price_line, settle_payment, status_for, totals, PricedLine};
use gestor_core::numbering::next_number;
use gestor_core::reversal::plan_reversal;
use gestor_core::validation::{validate_commission_period, validate_payment_amount};
use gestor_core::{
    AfipClient, AuthorizationRequest, CoreError, Invoice, InvoiceItem, InvoiceStatus,
    InvoiceWithItems, Money, Payment, PaymentMethod, VoucherType,
};

const INVOICE_COLUMNS: &str = "id, number, sequence, voucher_type, point_of_sale, client_id, \
     user_id, branch_id, issue_date, subtotal_cents, tax_cents, total_cents, paid_cents, status, \
     cae, cae_expires_on, voided_invoice_id, reason, offline_id, created_at, updated_at";

const ITEM_COLUMNS: &str = "id, invoice_id, product_id, sku_snapshot, name_snapshot, quantity, \
     unit_price_cents, tax_rate_bps, subtotal_cents, tax_cents, created_at";

const PAYMENT_COLUMNS: &str =
    "id, invoice_id, method, amount_cents, reference, commission_period, user_id, created_at";

// =============================================================================
// Inputs
// =============================================================================

/// One requested line of an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub product_id: String,
    pub quantity: i64,
    /// Negotiated unit price; catalog price when absent.
    #[serde(default)]
    pub unit_price_cents: Option<i64>,
}

/// A payment recorded with an order or added later.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPayment {
    pub method: PaymentMethod,
    pub amount_cents: i64,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub commission_period: Option<String>,
}

/// A voucher to issue.
#[derive(Debug, Clone)]
pub struct NewVoucher {
    /// `None` picks A or B from the client's tax condition.
    pub voucher_type: Option<VoucherType>,
    pub point_of_sale: i64,
    pub client_id: Option<String>,
    pub user_id: String,
    pub branch_id: Option<String>,
    pub issue_date: NaiveDate,
    pub items: Vec<OrderLine>,
    pub payments: Vec<NewPayment>,
    pub reason: Option<String>,
    pub offline_id: Option<String>,
}

/// Result of [`InvoiceRepository::issue`].
#[derive(Debug, Clone)]
pub enum IssueOutcome {
    Created(InvoiceWithItems),
    /// The offline id had already been synced; nothing was written.
    Duplicate(InvoiceWithItems),
}

impl IssueOutcome {
    pub fn is_duplicate(&self) -> bool {
        matches!(self, IssueOutcome::Duplicate(_))
    }

    pub fn into_inner(self) -> InvoiceWithItems {
        match self {
            IssueOutcome::Created(inv) | IssueOutcome::Duplicate(inv) => inv,
        }
    }
}

/// Filters for listing invoices. All fields are optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceFilter {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub status: Option<InvoiceStatus>,
    pub voucher_type: Option<VoucherType>,
    pub client_id: Option<String>,
    pub user_id: Option<String>,
    pub branch_id: Option<String>,
    pub limit: Option<u32>,
}

// =============================================================================
// Repository
// =============================================================================

#[derive(Debug, Clone)]
pub struct InvoiceRepository {
    pool: SqlitePool,
}

impl InvoiceRepository {
    pub fn new(pool: SqlitePool) -> Self {
        InvoiceRepository { pool }
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Invoice>> {
        let mut conn = self.pool.acquire().await?;
        fetch_invoice(&mut conn, id).await
    }

    /// Loads an invoice with its lines in issue order.
    pub async fn get_with_items(&self, id: &str) -> DbResult<Option<InvoiceWithItems>> {
        let mut conn = self.pool.acquire().await?;
        let Some(invoice) = fetch_invoice(&mut conn, id).await? else {
            return Ok(None);
        };
        let items = fetch_items(&mut conn, id).await?;
        Ok(Some(InvoiceWithItems { invoice, items }))
    }

    pub async fn find_by_offline_id(&self, offline_id: &str) -> DbResult<Option<Invoice>> {
        let mut conn = self.pool.acquire().await?;
        fetch_by_offline_id(&mut conn, offline_id).await
    }

    /// The credit note that reversed `original_id`, if any.
    pub async fn find_reversal(&self, original_id: &str) -> DbResult<Option<Invoice>> {
        let sql = format!("SELECT {INVOICE_COLUMNS} FROM invoices WHERE voided_invoice_id = ?1");
        let invoice = sqlx::query_as::<_, Invoice>(&sql)
            .bind(original_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(invoice)
    }

    pub async fn payments(&self, invoice_id: &str) -> DbResult<Vec<Payment>> {
        let sql = format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE invoice_id = ?1 ORDER BY created_at"
        );
        let payments = sqlx::query_as::<_, Payment>(&sql)
            .bind(invoice_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(payments)
    }

    /// Lists invoices, newest first.
    pub async fn list(&self, filter: &InvoiceFilter) -> DbResult<Vec<Invoice>> {
        debug!(?filter, "Listing invoices");

        let mut qb: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {INVOICE_COLUMNS} FROM invoices WHERE 1 = 1"));

        if let Some(from) = filter.from {
            qb.push(" AND issue_date >= ").push_bind(from);
        }
        if let Some(to) = filter.to {
            qb.push(" AND issue_date <= ").push_bind(to);
        }
        if let Some(status) = filter.status {
            qb.push(" AND status = ").push_bind(status);
        }
        if let Some(voucher_type) = filter.voucher_type {
            qb.push(" AND voucher_type = ").push_bind(voucher_type);
        }
        if let Some(client_id) = &filter.client_id {
            qb.push(" AND client_id = ").push_bind(client_id.clone());
        }
        if let Some(user_id) = &filter.user_id {
            qb.push(" AND user_id = ").push_bind(user_id.clone());
        }
        if let Some(branch_id) = &filter.branch_id {
            qb.push(" AND branch_id = ").push_bind(branch_id.clone());
        }

        qb.push(" ORDER BY issue_date DESC, created_at DESC LIMIT ")
            .push_bind(filter.limit.unwrap_or(100).min(1000));

        let invoices = qb.build_query_as::<Invoice>().fetch_all(&self.pool).await?;
        Ok(invoices)
    }

    // =========================================================================
    // Issue
    // =========================================================================

    /// Issues a voucher: stock, numbering, CAE, lines and payments in one
    /// transaction.
    ///
    /// ## Returns
    /// * `IssueOutcome::Duplicate` - `offline_id` was already synced
    /// * `Err(DbError::Domain(..))` - a business rule failed; nothing written
    /// * `Err(DbError::UniqueViolation)` - lost a numbering race
    /// * `Err(DbError::Conflict)` - another writer held the lock too long
    pub async fn issue(&self, new: NewVoucher, afip: &dyn AfipClient) -> DbResult<IssueOutcome> {
        let mut tx = begin_write(&self.pool).await?;

        if let Some(offline_id) = new.offline_id.as_deref() {
            if let Some(existing) = fetch_by_offline_id(&mut tx, offline_id).await? {
                let items = fetch_items(&mut tx, &existing.id).await?;
                tx.rollback().await?;
                debug!(offline_id = %offline_id, number = %existing.number, "Offline order already synced");
                return Ok(IssueOutcome::Duplicate(InvoiceWithItems {
                    invoice: existing,
                    items,
                }));
            }
        }

        let client = match new.client_id.as_deref() {
            Some(id) => Some(
                fetch_client_ref(&mut tx, id)
                    .await?
                    .ok_or_else(|| CoreError::ClientNotFound(id.to_string()))?,
            ),
            None => None,
        };

        let voucher_type = new
            .voucher_type
            .unwrap_or_else(|| VoucherType::default_for(client.as_ref().map(|c| c.tax_condition)));
        if voucher_type.is_reversal() {
            return Err(CoreError::ReversalNotIssuable {
                voucher_type: voucher_type.to_string(),
            }
            .into());
        }

        check_line_count(new.items.len())?;

        // Products are re-read per line so a repeated product sees the
        // stock left by the previous line.
        let mut lines: Vec<PricedLine> = Vec::with_capacity(new.items.len());
        for requested in &new.items {
            let product = fetch_product(&mut tx, &requested.product_id)
                .await?
                .ok_or_else(|| CoreError::ProductNotFound(requested.product_id.clone()))?;
            let line = price_line(&product, requested.quantity, requested.unit_price_cents)?;
            if line.track_inventory {
                apply_stock_delta(&mut tx, &line.product_id, -line.quantity).await?;
            }
            lines.push(line);
        }

        let totals = totals(&lines);

        let mut paid = Money::zero();
        for payment in &new.payments {
            validate_payment_amount(payment.amount_cents)?;
            if let Some(period) = payment.commission_period.as_deref() {
                validate_commission_period(period)?;
            }
            paid += Money::from_cents(payment.amount_cents);
        }
        if paid > totals.total {
            return Err(CoreError::PaymentExceedsBalance {
                balance: totals.total.to_string(),
                requested: paid.to_string(),
            }
            .into());
        }

        let last = last_number(&mut tx, voucher_type, new.point_of_sale).await?;
        let assignment = next_number(voucher_type.prefix(), last.as_deref())?;

        let authorization = if voucher_type.is_fiscal() {
            let request = AuthorizationRequest {
                voucher_type,
                point_of_sale: new.point_of_sale,
                sequence: assignment.sequence,
                issue_date: new.issue_date,
                total_cents: totals.total.cents(),
                receiver_tax_id: client.as_ref().and_then(|c| c.tax_id.clone()),
            };
            Some(afip.authorize(&request).map_err(CoreError::from)?)
        } else {
            None
        };

        let now = Utc::now();
        let invoice = Invoice {
            id: new_id(),
            number: assignment.number,
            sequence: assignment.sequence,
            voucher_type,
            point_of_sale: new.point_of_sale,
            client_id: new.client_id,
            user_id: new.user_id,
            branch_id: new.branch_id,
            issue_date: new.issue_date,
            subtotal_cents: totals.subtotal.cents(),
            tax_cents: totals.tax.cents(),
            total_cents: totals.total.cents(),
            paid_cents: paid.cents(),
            status: status_for(paid, totals.total),
            cae: authorization.as_ref().map(|a| a.cae.clone()),
            cae_expires_on: authorization.as_ref().map(|a| a.expires_on),
            voided_invoice_id: None,
            reason: new.reason,
            offline_id: new.offline_id,
            created_at: now,
            updated_at: now,
        };
        insert_invoice(&mut tx, &invoice).await?;

        let mut items = Vec::with_capacity(lines.len());
        for (position, line) in lines.into_iter().enumerate() {
            let item = InvoiceItem {
                id: new_id(),
                invoice_id: invoice.id.clone(),
                product_id: line.product_id,
                sku_snapshot: line.sku,
                name_snapshot: line.name,
                quantity: line.quantity,
                unit_price_cents: line.unit_price_cents,
                tax_rate_bps: line.tax_rate_bps,
                subtotal_cents: line.subtotal_cents,
                tax_cents: line.tax_cents,
                created_at: now,
            };
            insert_item(&mut tx, &item, position as i64).await?;
            items.push(item);
        }

        for payment in new.payments {
            let payment = Payment {
                id: new_id(),
                invoice_id: invoice.id.clone(),
                method: payment.method,
                amount_cents: payment.amount_cents,
                reference: payment.reference,
                commission_period: payment.commission_period,
                user_id: invoice.user_id.clone(),
                created_at: now,
            };
            insert_payment(&mut tx, &payment).await?;
        }

        tx.commit().await?;

        info!(
            number = %invoice.number,
            voucher_type = %voucher_type,
            total = %invoice.total(),
            "Voucher issued"
        );
        Ok(IssueOutcome::Created(InvoiceWithItems { invoice, items }))
    }

    // =========================================================================
    // Reverse
    // =========================================================================

    /// Issues the credit note for `original_id`, restores stock and voids
    /// the original. The original's totals and paid amount are untouched.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - no such invoice
    /// * `Err(DbError::Domain(AlreadyVoided | UnsupportedReversal | MissingAuthorization))`
    pub async fn reverse(
        &self,
        original_id: &str,
        reason: Option<String>,
        user_id: &str,
        issue_date: NaiveDate,
        afip: &dyn AfipClient,
    ) -> DbResult<InvoiceWithItems> {
        let mut tx = begin_write(&self.pool).await?;

        let original = fetch_invoice(&mut tx, original_id)
            .await?
            .ok_or_else(|| DbError::not_found("Invoice", original_id))?;
        let original_items = fetch_items(&mut tx, original_id).await?;

        let plan = plan_reversal(&original, &original_items)?;

        let last = last_number(&mut tx, plan.voucher_type, plan.point_of_sale).await?;
        let assignment = next_number(plan.voucher_type.prefix(), last.as_deref())?;

        let authorization = if plan.requires_authorization() {
            let receiver_tax_id = match plan.client_id.as_deref() {
                Some(id) => fetch_client_ref(&mut tx, id).await?.and_then(|c| c.tax_id),
                None => None,
            };
            let request = AuthorizationRequest {
                voucher_type: plan.voucher_type,
                point_of_sale: plan.point_of_sale,
                sequence: assignment.sequence,
                issue_date,
                total_cents: plan.total_cents,
                receiver_tax_id,
            };
            Some(afip.authorize(&request).map_err(CoreError::from)?)
        } else {
            None
        };

        let now = Utc::now();
        let credit_note = Invoice {
            id: new_id(),
            number: assignment.number,
            sequence: assignment.sequence,
            voucher_type: plan.voucher_type,
            point_of_sale: plan.point_of_sale,
            client_id: plan.client_id.clone(),
            user_id: user_id.to_string(),
            branch_id: plan.branch_id.clone(),
            issue_date,
            subtotal_cents: plan.subtotal_cents,
            tax_cents: plan.tax_cents,
            total_cents: plan.total_cents,
            paid_cents: plan.total_cents,
            status: InvoiceStatus::Pagada,
            cae: authorization.as_ref().map(|a| a.cae.clone()),
            cae_expires_on: authorization.as_ref().map(|a| a.expires_on),
            voided_invoice_id: Some(plan.original_id.clone()),
            reason,
            offline_id: None,
            created_at: now,
            updated_at: now,
        };
        insert_invoice(&mut tx, &credit_note)
            .await
            .map_err(|e| second_credit_note(e, &original.number))?;

        let mut items = Vec::with_capacity(plan.items.len());
        for (position, source) in plan.items.iter().enumerate() {
            let item = InvoiceItem {
                id: new_id(),
                invoice_id: credit_note.id.clone(),
                created_at: now,
                ..source.clone()
            };
            insert_item(&mut tx, &item, position as i64).await?;
            items.push(item);
        }

        for restoration in &plan.stock_restorations {
            restore_stock(&mut tx, &restoration.product_id, restoration.quantity).await?;
        }

        let flipped = sqlx::query(
            "UPDATE invoices SET status = 'ANULADA', updated_at = ?2 \
             WHERE id = ?1 AND status <> 'ANULADA'",
        )
        .bind(&plan.original_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if flipped.rows_affected() == 0 {
            tx.rollback().await?;
            warn!(number = %original.number, "Concurrent reversal detected, rolled back");
            return Err(CoreError::AlreadyVoided {
                number: original.number,
            }
            .into());
        }

        tx.commit().await?;

        info!(
            original = %original.number,
            credit_note = %credit_note.number,
            "Invoice reversed"
        );
        Ok(InvoiceWithItems {
            invoice: credit_note,
            items,
        })
    }

    // =========================================================================
    // Payments
    // =========================================================================

    /// Records a payment and updates the invoice's paid amount and status.
    pub async fn add_payment(
        &self,
        invoice_id: &str,
        payment: NewPayment,
        user_id: &str,
    ) -> DbResult<(Invoice, Payment)> {
        if let Some(period) = payment.commission_period.as_deref() {
            validate_commission_period(period)?;
        }

        let mut tx = begin_write(&self.pool).await?;

        let mut invoice = fetch_invoice(&mut tx, invoice_id)
            .await?
            .ok_or_else(|| DbError::not_found("Invoice", invoice_id))?;

        let settlement = settle_payment(&invoice, Money::from_cents(payment.amount_cents))?;

        let now = Utc::now();
        let payment = Payment {
            id: new_id(),
            invoice_id: invoice.id.clone(),
            method: payment.method,
            amount_cents: payment.amount_cents,
            reference: payment.reference,
            commission_period: payment.commission_period,
            user_id: user_id.to_string(),
            created_at: now,
        };
        insert_payment(&mut tx, &payment).await?;

        let updated = sqlx::query(
            "UPDATE invoices SET paid_cents = ?2, status = ?3, updated_at = ?4 \
             WHERE id = ?1 AND paid_cents = ?5 AND status <> 'ANULADA'",
        )
        .bind(&invoice.id)
        .bind(settlement.paid.cents())
        .bind(settlement.status)
        .bind(now)
        .bind(invoice.paid_cents)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(DbError::Conflict(format!(
                "invoice {} changed while recording the payment",
                invoice.number
            )));
        }

        tx.commit().await?;

        invoice.paid_cents = settlement.paid.cents();
        invoice.status = settlement.status;
        invoice.updated_at = now;

        info!(number = %invoice.number, amount = %payment.amount(), status = %invoice.status.as_str(), "Payment recorded");
        Ok((invoice, payment))
    }
}

// =============================================================================
// Transaction Helpers
// =============================================================================

/// The fields of a client the invoicing flow needs.
#[derive(Debug, sqlx::FromRow)]
struct ClientRef {
    tax_id: Option<String>,
    tax_condition: gestor_core::TaxCondition,
}

async fn fetch_client_ref(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<ClientRef>> {
    let client = sqlx::query_as::<_, ClientRef>(
        "SELECT tax_id, tax_condition FROM clients WHERE id = ?1",
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;
    Ok(client)
}

async fn fetch_invoice(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Invoice>> {
    let sql = format!("SELECT {INVOICE_COLUMNS} FROM invoices WHERE id = ?1");
    let invoice = sqlx::query_as::<_, Invoice>(&sql)
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(invoice)
}

async fn fetch_by_offline_id(conn: &mut SqliteConnection, offline_id: &str) -> DbResult<Option<Invoice>> {
    let sql = format!("SELECT {INVOICE_COLUMNS} FROM invoices WHERE offline_id = ?1");
    let invoice = sqlx::query_as::<_, Invoice>(&sql)
        .bind(offline_id)
        .fetch_optional(conn)
        .await?;
    Ok(invoice)
}

async fn fetch_items(conn: &mut SqliteConnection, invoice_id: &str) -> DbResult<Vec<InvoiceItem>> {
    let sql = format!(
        "SELECT {ITEM_COLUMNS} FROM invoice_items WHERE invoice_id = ?1 ORDER BY position"
    );
    let items = sqlx::query_as::<_, InvoiceItem>(&sql)
        .bind(invoice_id)
        .fetch_all(conn)
        .await?;
    Ok(items)
}

/// Number of the highest-sequence voucher in a series.
async fn last_number(
    conn: &mut SqliteConnection,
    voucher_type: VoucherType,
    point_of_sale: i64,
) -> DbResult<Option<String>> {
    let number: Option<String> = sqlx::query_scalar(
        "SELECT number FROM invoices WHERE voucher_type = ?1 AND point_of_sale = ?2 \
         ORDER BY sequence DESC LIMIT 1",
    )
    .bind(voucher_type)
    .bind(point_of_sale)
    .fetch_optional(conn)
    .await?;
    Ok(number)
}

/// The one-credit-note index fired: another reversal of `number` committed
/// first.
fn second_credit_note(err: DbError, number: &str) -> DbError {
    match err {
        DbError::UniqueViolation { ref field, .. } if field == "credit note" => {
            DbError::Domain(CoreError::AlreadyVoided {
                number: number.to_string(),
            })
        }
        other => other,
    }
}

async fn insert_invoice(conn: &mut SqliteConnection, invoice: &Invoice) -> DbResult<()> {
    let sql = format!(
        "INSERT INTO invoices ({INVOICE_COLUMNS}) VALUES \
         (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21)"
    );
    sqlx::query(&sql)
        .bind(&invoice.id)
        .bind(&invoice.number)
        .bind(invoice.sequence)
        .bind(invoice.voucher_type)
        .bind(invoice.point_of_sale)
        .bind(&invoice.client_id)
        .bind(&invoice.user_id)
        .bind(&invoice.branch_id)
        .bind(invoice.issue_date)
        .bind(invoice.subtotal_cents)
        .bind(invoice.tax_cents)
        .bind(invoice.total_cents)
        .bind(invoice.paid_cents)
        .bind(invoice.status)
        .bind(&invoice.cae)
        .bind(invoice.cae_expires_on)
        .bind(&invoice.voided_invoice_id)
        .bind(&invoice.reason)
        .bind(&invoice.offline_id)
        .bind(invoice.created_at)
        .bind(invoice.updated_at)
        .execute(conn)
        .await?;
    Ok(())
}

async fn insert_item(conn: &mut SqliteConnection, item: &InvoiceItem, position: i64) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO invoice_items (
            id, invoice_id, product_id, sku_snapshot, name_snapshot, quantity,
            unit_price_cents, tax_rate_bps, subtotal_cents, tax_cents, position, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
        "#,
    )
    .bind(&item.id)
    .bind(&item.invoice_id)
    .bind(&item.product_id)
    .bind(&item.sku_snapshot)
    .bind(&item.name_snapshot)
    .bind(item.quantity)
    .bind(item.unit_price_cents)
    .bind(item.tax_rate_bps)
    .bind(item.subtotal_cents)
    .bind(item.tax_cents)
    .bind(position)
    .bind(item.created_at)
    .execute(conn)
    .await?;
    Ok(())
}

async fn insert_payment(conn: &mut SqliteConnection, payment: &Payment) -> DbResult<()> {
    let sql = format!("INSERT INTO payments ({PAYMENT_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)");
    sqlx::query(&sql)
        .bind(&payment.id)
        .bind(&payment.invoice_id)
        .bind(payment.method)
        .bind(payment.amount_cents)
        .bind(&payment.reference)
        .bind(&payment.commission_period)
        .bind(&payment.user_id)
        .bind(payment.created_at)
        .execute(conn)
        .await?;
    Ok(())
}

/// Gives back `quantity` units. Untracked products are left alone.
async fn restore_stock(conn: &mut SqliteConnection, product_id: &str, quantity: i64) -> DbResult<()> {
    sqlx::query(
        "UPDATE products SET current_stock = current_stock + ?2, updated_at = ?3 \
         WHERE id = ?1 AND track_inventory = 1",
    )
    .bind(product_id)
    .bind(quantity)
    .bind(Utc::now())
    .execute(conn)
    .await?;
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{client, db, product, vendor};
    use crate::Database;
    use gestor_core::{AfipError, Authorization, TaxCondition};

    struct FixedAfip;

    impl AfipClient for FixedAfip {
        fn authorize(&self, request: &AuthorizationRequest) -> Result<Authorization, AfipError> {
            Ok(Authorization {
                cae: format!("7{:013}", request.sequence),
                expires_on: request.issue_date + chrono::Duration::days(10),
            })
        }
    }

    struct DownAfip;

    impl AfipClient for DownAfip {
        fn authorize(&self, _request: &AuthorizationRequest) -> Result<Authorization, AfipError> {
            Err(AfipError::Unavailable("timeout".into()))
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 10).unwrap()
    }

    fn voucher(user_id: &str, voucher_type: Option<VoucherType>, items: Vec<(&String, i64)>) -> NewVoucher {
        NewVoucher {
            voucher_type,
            point_of_sale: 1,
            client_id: None,
            user_id: user_id.to_string(),
            branch_id: None,
            issue_date: today(),
            items: items
                .into_iter()
                .map(|(id, qty)| OrderLine {
                    product_id: id.clone(),
                    quantity: qty,
                    unit_price_cents: None,
                })
                .collect(),
            payments: vec![],
            reason: None,
            offline_id: None,
        }
    }

    async fn stock(db: &Database, id: &str) -> i64 {
        db.products().get_by_id(id).await.unwrap().unwrap().current_stock
    }

    #[tokio::test]
    async fn test_numbering_per_type_and_series() {
        let db = db().await;
        let u = vendor(&db, "ana", 0).await;
        let p = product(&db, "YERBA-1KG", 100_000, 100).await;

        let first = db
            .invoices()
            .issue(voucher(&u.id, Some(VoucherType::FacturaA), vec![(&p.id, 1)]), &FixedAfip)
            .await
            .unwrap()
            .into_inner();
        let second = db
            .invoices()
            .issue(voucher(&u.id, Some(VoucherType::FacturaA), vec![(&p.id, 1)]), &FixedAfip)
            .await
            .unwrap()
            .into_inner();
        let other_type = db
            .invoices()
            .issue(voucher(&u.id, Some(VoucherType::FacturaB), vec![(&p.id, 1)]), &FixedAfip)
            .await
            .unwrap()
            .into_inner();
        let mut other_series = voucher(&u.id, Some(VoucherType::FacturaA), vec![(&p.id, 1)]);
        other_series.point_of_sale = 2;
        let other_series = db
            .invoices()
            .issue(other_series, &FixedAfip)
            .await
            .unwrap()
            .into_inner();

        assert_eq!(first.invoice.number, "FA-0001");
        assert_eq!(second.invoice.number, "FA-0002");
        assert_eq!(other_type.invoice.number, "FB-0001");
        assert_eq!(other_series.invoice.number, "FA-0001");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_issues_on_a_file_database() {
        let path = std::env::temp_dir().join(format!("gestor-issue-{}.db", uuid::Uuid::new_v4()));
        let db = Database::new(crate::DbConfig::new(&path).max_connections(4)).await.unwrap();
        let u = vendor(&db, "ana", 0).await;
        let p = product(&db, "YERBA-1KG", 100_000, 100).await;

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let db = db.clone();
                let new = voucher(&u.id, Some(VoucherType::FacturaB), vec![(&p.id, 1)]);
                tokio::spawn(async move { db.invoices().issue(new, &FixedAfip).await })
            })
            .collect();

        let mut numbers = Vec::new();
        for handle in handles {
            match handle.await.unwrap() {
                Ok(outcome) => numbers.push(outcome.into_inner().invoice.sequence),
                Err(err) => assert!(err.is_retryable(), "{err:?}"),
            }
        }
        numbers.sort_unstable();

        // Writers queue on the lock instead of failing.
        assert_eq!(numbers, (1..=8).collect::<Vec<i64>>());
        assert_eq!(stock(&db, &p.id).await, 92);

        db.close().await;
        for suffix in ["", "-wal", "-shm"] {
            let _ = std::fs::remove_file(format!("{}{suffix}", path.display()));
        }
    }

    #[test]
    fn test_credit_note_index_clash_reads_as_already_voided() {
        let err = second_credit_note(DbError::duplicate("credit note", "unknown"), "FA-0004");
        match err {
            DbError::Domain(CoreError::AlreadyVoided { number }) => assert_eq!(number, "FA-0004"),
            other => panic!("unexpected {other:?}"),
        }

        let numbering = second_credit_note(DbError::duplicate("voucher number", "unknown"), "FA-0004");
        assert!(matches!(numbering, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_issue_totals_stock_and_cae() {
        let db = db().await;
        let u = vendor(&db, "ana", 0).await;
        let p = product(&db, "ACEITE-900", 150_000, 10).await;

        let mut new = voucher(&u.id, None, vec![(&p.id, 2), (&p.id, 1)]);
        new.payments = vec![NewPayment {
            method: PaymentMethod::Efectivo,
            amount_cents: 100_000,
            reference: None,
            commission_period: Some("2024-05".into()),
        }];
        let issued = db.invoices().issue(new, &FixedAfip).await.unwrap().into_inner();

        // Walk-in sale defaults to B.
        assert_eq!(issued.invoice.voucher_type, VoucherType::FacturaB);
        assert_eq!(issued.invoice.subtotal_cents, 450_000);
        assert_eq!(issued.invoice.tax_cents, 94_500);
        assert_eq!(issued.invoice.total_cents, 544_500);
        assert_eq!(issued.invoice.paid_cents, 100_000);
        assert_eq!(issued.invoice.status, InvoiceStatus::Pendiente);
        assert!(issued.invoice.cae.is_some());
        assert_eq!(issued.items.len(), 2);
        assert_eq!(stock(&db, &p.id).await, 7);
        assert_eq!(db.invoices().payments(&issued.invoice.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_client_condition_picks_factura_a() {
        let db = db().await;
        let u = vendor(&db, "ana", 0).await;
        let p = product(&db, "ACEITE-900", 150_000, 10).await;
        let c = client(&db, TaxCondition::ResponsableInscripto).await;

        let mut new = voucher(&u.id, None, vec![(&p.id, 1)]);
        new.client_id = Some(c.id);
        let issued = db.invoices().issue(new, &FixedAfip).await.unwrap().into_inner();
        assert_eq!(issued.invoice.voucher_type, VoucherType::FacturaA);
    }

    #[tokio::test]
    async fn test_oversell_rolls_back_everything() {
        let db = db().await;
        let u = vendor(&db, "ana", 0).await;
        let a = product(&db, "A-1", 1_000, 5).await;
        let b = product(&db, "B-1", 1_000, 1).await;

        let err = db
            .invoices()
            .issue(voucher(&u.id, None, vec![(&a.id, 3), (&b.id, 2)]), &FixedAfip)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::InsufficientStock { .. })));

        assert_eq!(stock(&db, &a.id).await, 5);
        assert!(db.invoices().list(&InvoiceFilter::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_afip_failure_writes_nothing() {
        let db = db().await;
        let u = vendor(&db, "ana", 0).await;
        let p = product(&db, "A-1", 1_000, 5).await;

        let err = db
            .invoices()
            .issue(voucher(&u.id, Some(VoucherType::FacturaB), vec![(&p.id, 1)]), &DownAfip)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::Afip(_))));
        assert_eq!(stock(&db, &p.id).await, 5);

        // Remitos never call AFIP.
        let remito = db
            .invoices()
            .issue(voucher(&u.id, Some(VoucherType::Remito), vec![(&p.id, 1)]), &DownAfip)
            .await
            .unwrap()
            .into_inner();
        assert_eq!(remito.invoice.number, "REM-0001");
        assert!(remito.invoice.cae.is_none());
    }

    #[tokio::test]
    async fn test_credit_note_types_not_issuable() {
        let db = db().await;
        let u = vendor(&db, "ana", 0).await;
        let p = product(&db, "A-1", 1_000, 5).await;

        let err = db
            .invoices()
            .issue(voucher(&u.id, Some(VoucherType::NotaCreditoB), vec![(&p.id, 1)]), &FixedAfip)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::ReversalNotIssuable { .. })));
    }

    #[tokio::test]
    async fn test_offline_id_dedupes() {
        let db = db().await;
        let u = vendor(&db, "ana", 0).await;
        let p = product(&db, "A-1", 1_000, 5).await;

        let mut new = voucher(&u.id, None, vec![(&p.id, 1)]);
        new.offline_id = Some("tab-1:42".into());

        let first = db.invoices().issue(new.clone(), &FixedAfip).await.unwrap();
        let second = db.invoices().issue(new, &FixedAfip).await.unwrap();

        assert!(!first.is_duplicate());
        assert!(second.is_duplicate());
        assert_eq!(first.into_inner().invoice.id, second.into_inner().invoice.id);
        assert_eq!(stock(&db, &p.id).await, 4);
    }

    #[tokio::test]
    async fn test_overpayment_at_issue_rejected() {
        let db = db().await;
        let u = vendor(&db, "ana", 0).await;
        let p = product(&db, "A-1", 1_000, 5).await;

        let mut new = voucher(&u.id, None, vec![(&p.id, 1)]);
        new.payments = vec![NewPayment {
            method: PaymentMethod::Efectivo,
            amount_cents: 1_211,
            reference: None,
            commission_period: None,
        }];
        assert!(matches!(
            db.invoices().issue(new, &FixedAfip).await,
            Err(DbError::Domain(CoreError::PaymentExceedsBalance { .. }))
        ));
    }

    #[tokio::test]
    async fn test_reversal_maps_type_restores_stock_and_voids() {
        let db = db().await;
        let u = vendor(&db, "ana", 0).await;
        let a = product(&db, "A-1", 1_000, 10).await;
        let b = product(&db, "B-1", 2_000, 10).await;

        for (original_type, expected) in [
            (VoucherType::FacturaA, VoucherType::NotaCreditoA),
            (VoucherType::FacturaB, VoucherType::NotaCreditoB),
            (VoucherType::FacturaC, VoucherType::NotaCreditoC),
            (VoucherType::Remito, VoucherType::NotaCreditoRemito),
        ] {
            let original = db
                .invoices()
                .issue(voucher(&u.id, Some(original_type), vec![(&a.id, 3), (&b.id, 2)]), &FixedAfip)
                .await
                .unwrap()
                .into_inner();
            assert_eq!(stock(&db, &a.id).await, 7);
            assert_eq!(stock(&db, &b.id).await, 8);

            let nc = db
                .invoices()
                .reverse(&original.invoice.id, Some("devolucion".into()), &u.id, today(), &FixedAfip)
                .await
                .unwrap();

            assert_eq!(nc.invoice.voucher_type, expected);
            assert_eq!(nc.invoice.number, format!("{}-0001", expected.prefix()));
            assert_eq!(nc.invoice.voided_invoice_id.as_deref(), Some(original.invoice.id.as_str()));
            assert_eq!(nc.invoice.total_cents, original.invoice.total_cents);
            assert_eq!(nc.items.len(), 2);
            assert_eq!(nc.invoice.cae.is_some(), expected.is_fiscal());

            let voided = db.invoices().get_by_id(&original.invoice.id).await.unwrap().unwrap();
            assert_eq!(voided.status, InvoiceStatus::Anulada);
            assert_eq!(voided.total_cents, original.invoice.total_cents);
            assert_eq!(voided.paid_cents, original.invoice.paid_cents);

            assert_eq!(stock(&db, &a.id).await, 10);
            assert_eq!(stock(&db, &b.id).await, 10);
        }
    }

    #[tokio::test]
    async fn test_double_reversal_rejected() {
        let db = db().await;
        let u = vendor(&db, "ana", 0).await;
        let p = product(&db, "A-1", 1_000, 10).await;

        let original = db
            .invoices()
            .issue(voucher(&u.id, Some(VoucherType::FacturaB), vec![(&p.id, 4)]), &FixedAfip)
            .await
            .unwrap()
            .into_inner();

        db.invoices()
            .reverse(&original.invoice.id, None, &u.id, today(), &FixedAfip)
            .await
            .unwrap();
        let err = db
            .invoices()
            .reverse(&original.invoice.id, None, &u.id, today(), &FixedAfip)
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::Domain(CoreError::AlreadyVoided { .. })));
        assert_eq!(stock(&db, &p.id).await, 10);
        assert!(db.invoices().find_reversal(&original.invoice.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_reversal_errors() {
        let db = db().await;
        let u = vendor(&db, "ana", 0).await;
        let p = product(&db, "A-1", 1_000, 10).await;

        assert!(matches!(
            db.invoices().reverse("missing", None, &u.id, today(), &FixedAfip).await,
            Err(DbError::NotFound { .. })
        ));

        let original = db
            .invoices()
            .issue(voucher(&u.id, Some(VoucherType::FacturaB), vec![(&p.id, 1)]), &FixedAfip)
            .await
            .unwrap()
            .into_inner();
        let nc = db
            .invoices()
            .reverse(&original.invoice.id, None, &u.id, today(), &FixedAfip)
            .await
            .unwrap();

        assert!(matches!(
            db.invoices().reverse(&nc.invoice.id, None, &u.id, today(), &FixedAfip).await,
            Err(DbError::Domain(CoreError::UnsupportedReversal { .. }))
        ));

        // A failing AFIP leaves the second invoice untouched.
        let second = db
            .invoices()
            .issue(voucher(&u.id, Some(VoucherType::FacturaB), vec![(&p.id, 1)]), &FixedAfip)
            .await
            .unwrap()
            .into_inner();
        assert!(db
            .invoices()
            .reverse(&second.invoice.id, None, &u.id, today(), &DownAfip)
            .await
            .is_err());
        let still = db.invoices().get_by_id(&second.invoice.id).await.unwrap().unwrap();
        assert_eq!(still.status, InvoiceStatus::Pendiente);
        assert_eq!(stock(&db, &p.id).await, 9);
    }

    #[tokio::test]
    async fn test_payments_settle_invoice() {
        let db = db().await;
        let u = vendor(&db, "ana", 0).await;
        let p = product(&db, "A-1", 10_000, 10).await;

        let inv = db
            .invoices()
            .issue(voucher(&u.id, None, vec![(&p.id, 1)]), &FixedAfip)
            .await
            .unwrap()
            .into_inner()
            .invoice;
        assert_eq!(inv.total_cents, 12_100);

        let pay = |amount| NewPayment {
            method: PaymentMethod::Transferencia,
            amount_cents: amount,
            reference: Some("op-1".into()),
            commission_period: None,
        };

        let (inv2, _) = db.invoices().add_payment(&inv.id, pay(2_100), &u.id).await.unwrap();
        assert_eq!(inv2.status, InvoiceStatus::Pendiente);

        assert!(matches!(
            db.invoices().add_payment(&inv.id, pay(10_001), &u.id).await,
            Err(DbError::Domain(CoreError::PaymentExceedsBalance { .. }))
        ));

        let (inv3, _) = db.invoices().add_payment(&inv.id, pay(10_000), &u.id).await.unwrap();
        assert_eq!(inv3.status, InvoiceStatus::Pagada);
        assert_eq!(inv3.paid_cents, 12_100);
        assert_eq!(db.invoices().payments(&inv.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_list_filters() {
        let db = db().await;
        let u = vendor(&db, "ana", 0).await;
        let p = product(&db, "A-1", 1_000, 10).await;

        db.invoices()
            .issue(voucher(&u.id, Some(VoucherType::FacturaB), vec![(&p.id, 1)]), &FixedAfip)
            .await
            .unwrap();
        db.invoices()
            .issue(voucher(&u.id, Some(VoucherType::Remito), vec![(&p.id, 1)]), &FixedAfip)
            .await
            .unwrap();

        let remitos = db
            .invoices()
            .list(&InvoiceFilter {
                voucher_type: Some(VoucherType::Remito),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(remitos.len(), 1);

        let none = db
            .invoices()
            .list(&InvoiceFilter {
                from: NaiveDate::from_ymd_opt(2024, 6, 1),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(none.is_empty());
    }
}
