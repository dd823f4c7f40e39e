//! # Cash Closure Repository
//!
//! A closure covers every payment taken at a branch since its previous
//! closure.
//!
//! ```text
//!  closure #1            closure #2                 now
//!      │                     │                       │
//!  ────┼─────────────────────┼───────────────────────┼──►
//!      │   payments → #2     │   payments → preview  │
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::info;

use super::{begin_write, new_id};
use crate::error::DbResult;
use gestor_core::reports::{CashSummary, PaymentRow};
use gestor_core::CashClosure;

const CLOSURE_COLUMNS: &str = "id, branch_id, user_id, period_start, period_end, cash_cents, \
     debit_cents, credit_cents, transfer_cents, current_account_cents, total_cents, \
     counted_cash_cents, difference_cents, notes, created_at";

/// What a closure would record if taken now.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CashClosurePreview {
    pub branch_id: Option<String>,
    pub period_start: Option<DateTime<Utc>>,
    pub period_end: DateTime<Utc>,
    pub summary: CashSummary,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCashClosure {
    pub branch_id: Option<String>,
    pub counted_cash_cents: i64,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CashClosureRepository {
    pool: SqlitePool,
}

impl CashClosureRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CashClosureRepository { pool }
    }

    pub async fn list(&self, branch_id: Option<&str>, limit: u32) -> DbResult<Vec<CashClosure>> {
        let sql = format!(
            "SELECT {CLOSURE_COLUMNS} FROM cash_closures \
             WHERE (?1 IS NULL OR branch_id = ?1) ORDER BY period_end DESC LIMIT ?2"
        );
        let closures = sqlx::query_as::<_, CashClosure>(&sql)
            .bind(branch_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(closures)
    }

    pub async fn preview(&self, branch_id: Option<&str>) -> DbResult<CashClosurePreview> {
        let mut conn = self.pool.acquire().await?;
        build_preview(&mut conn, branch_id, Utc::now()).await
    }

    /// Closes the register: sums payments since the last closure and stores
    /// them with the counted cash.
    pub async fn close(&self, new: NewCashClosure, user_id: &str) -> DbResult<CashClosure> {
        let mut tx = begin_write(&self.pool).await?;

        let now = Utc::now();
        let preview = build_preview(&mut tx, new.branch_id.as_deref(), now).await?;
        let summary = preview.summary;

        let closure = CashClosure {
            id: new_id(),
            branch_id: new.branch_id,
            user_id: user_id.to_string(),
            period_start: preview.period_start,
            period_end: preview.period_end,
            cash_cents: summary.cash_cents,
            debit_cents: summary.debit_cents,
            credit_cents: summary.credit_cents,
            transfer_cents: summary.transfer_cents,
            current_account_cents: summary.current_account_cents,
            total_cents: summary.total_cents,
            counted_cash_cents: new.counted_cash_cents,
            difference_cents: summary.difference(new.counted_cash_cents),
            notes: new.notes,
            created_at: now,
        };

        let sql = format!(
            "INSERT INTO cash_closures ({CLOSURE_COLUMNS}) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)"
        );
        sqlx::query(&sql)
            .bind(&closure.id)
            .bind(&closure.branch_id)
            .bind(&closure.user_id)
            .bind(closure.period_start)
            .bind(closure.period_end)
            .bind(closure.cash_cents)
            .bind(closure.debit_cents)
            .bind(closure.credit_cents)
            .bind(closure.transfer_cents)
            .bind(closure.current_account_cents)
            .bind(closure.total_cents)
            .bind(closure.counted_cash_cents)
            .bind(closure.difference_cents)
            .bind(&closure.notes)
            .bind(closure.created_at)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(
            branch = ?closure.branch_id,
            total = closure.total_cents,
            difference = closure.difference_cents,
            "Cash register closed"
        );
        Ok(closure)
    }
}

async fn build_preview(
    conn: &mut SqliteConnection,
    branch_id: Option<&str>,
    now: DateTime<Utc>,
) -> DbResult<CashClosurePreview> {
    let period_start: Option<DateTime<Utc>> = sqlx::query_scalar(
        "SELECT period_end FROM cash_closures WHERE branch_id IS ?1 \
         ORDER BY period_end DESC LIMIT 1",
    )
    .bind(branch_id)
    .fetch_optional(&mut *conn)
    .await?;

    let rows = sqlx::query_as::<_, PaymentRow>(
        r#"
        SELECT p.method, p.amount_cents, i.status AS invoice_status
        FROM payments p
        JOIN invoices i ON i.id = p.invoice_id
        WHERE i.branch_id IS ?1
          AND (?2 IS NULL OR p.created_at > ?2)
          AND p.created_at <= ?3
        "#,
    )
    .bind(branch_id)
    .bind(period_start)
    .bind(now)
    .fetch_all(&mut *conn)
    .await?;

    Ok(CashClosurePreview {
        branch_id: branch_id.map(str::to_string),
        period_start,
        period_end: now,
        summary: CashSummary::from_payments(&rows),
    })
}
