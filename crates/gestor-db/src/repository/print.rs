//! Pending print tickets.
//!
//! When the local print helper cannot be reached, the ticket body is kept
//! here until someone reprints it by hand and marks it done.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::warn;

use super::new_id;
use crate::error::{DbError, DbResult};
use gestor_core::{PrintStatus, PrintTicket};

const TICKET_COLUMNS: &str =
    "id, invoice_id, payload, status, attempts, last_error, created_at, printed_at";

#[derive(Debug, Clone)]
pub struct PrintTicketRepository {
    pool: SqlitePool,
}

impl PrintTicketRepository {
    pub fn new(pool: SqlitePool) -> Self {
        PrintTicketRepository { pool }
    }

    /// Stores a ticket that failed to print.
    pub async fn insert_pending(
        &self,
        invoice_id: &str,
        payload: &serde_json::Value,
        error: &str,
    ) -> DbResult<PrintTicket> {
        let ticket = PrintTicket {
            id: new_id(),
            invoice_id: invoice_id.to_string(),
            payload: payload.to_string(),
            status: PrintStatus::Pendiente,
            attempts: 1,
            last_error: Some(error.to_string()),
            created_at: Utc::now(),
            printed_at: None,
        };

        let sql = format!(
            "INSERT INTO print_tickets ({TICKET_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"
        );
        sqlx::query(&sql)
            .bind(&ticket.id)
            .bind(&ticket.invoice_id)
            .bind(&ticket.payload)
            .bind(ticket.status)
            .bind(ticket.attempts)
            .bind(&ticket.last_error)
            .bind(ticket.created_at)
            .bind(ticket.printed_at)
            .execute(&self.pool)
            .await?;

        warn!(invoice_id = %invoice_id, error = %error, "Ticket queued as pending");
        Ok(ticket)
    }

    pub async fn list_pending(&self) -> DbResult<Vec<PrintTicket>> {
        let sql = format!(
            "SELECT {TICKET_COLUMNS} FROM print_tickets WHERE status = 'PENDIENTE' ORDER BY created_at"
        );
        let tickets = sqlx::query_as::<_, PrintTicket>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(tickets)
    }

    pub async fn mark_printed(&self, id: &str) -> DbResult<PrintTicket> {
        let result = sqlx::query(
            "UPDATE print_tickets SET status = 'IMPRESO', printed_at = ?2 \
             WHERE id = ?1 AND status = 'PENDIENTE'",
        )
        .bind(id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("PrintTicket", id));
        }

        let sql = format!("SELECT {TICKET_COLUMNS} FROM print_tickets WHERE id = ?1");
        let ticket = sqlx::query_as::<_, PrintTicket>(&sql)
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(ticket)
    }
}
