//! # Ticket Printing
//!
//! Sends tickets to the local print helper over HTTP. When the helper
//! does not answer in time the ticket is stored as pending instead.
//!
//! ```text
//!  order committed
//!       │
//!       ▼
//!  POST helper_url (JSON ticket, timeout_ms)
//!       │
//!       ├── 2xx ─────────────────► Printed
//!       │
//!       └── error / timeout / 5xx ─► print_tickets (PENDIENTE) ─► Pending
//!                                     │  listed at GET /api/print/pending,
//!                                     │  never retried automatically
//!                                     └── insert fails ─► Failed (logged)
//! ```
//!
//! Dispatch runs after the voucher committed, so it never fails the
//! request: the worst case is a `FAILED` outcome in the response.

use std::time::Duration;

use serde::Serialize;
use serde_json::json;
use tracing::{debug, error, info};

use crate::config::{CompanySettings, PrintingSettings};
use gestor_core::{InvoiceWithItems, Money};
use gestor_db::Database;

/// What happened to a ticket.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PrintOutcome {
    Printed,
    #[serde(rename_all = "camelCase")]
    Pending { ticket_id: String, error: String },
    /// Neither printed nor stored; the voucher is still issued.
    Failed { error: String },
    Disabled,
}

/// Client for the local print helper.
#[derive(Debug, Clone)]
pub struct PrintClient {
    http: reqwest::Client,
    settings: PrintingSettings,
}

impl PrintClient {
    pub fn new(settings: PrintingSettings) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(settings.timeout_ms))
            .build()?;
        Ok(PrintClient { http, settings })
    }

    /// Prints the voucher's ticket, falling back to a pending ticket.
    pub async fn dispatch(
        &self,
        db: &Database,
        company: &CompanySettings,
        voucher: &InvoiceWithItems,
    ) -> PrintOutcome {
        if !self.settings.enabled {
            debug!(number = %voucher.invoice.number, "Printing disabled, skipping ticket");
            return PrintOutcome::Disabled;
        }

        let payload = ticket_payload(company, voucher);

        match self.send(&payload).await {
            Ok(()) => {
                info!(number = %voucher.invoice.number, "Ticket printed");
                PrintOutcome::Printed
            }
            Err(e) => {
                let reason = e.to_string();
                match db
                    .print_tickets()
                    .insert_pending(&voucher.invoice.id, &payload, &reason)
                    .await
                {
                    Ok(ticket) => PrintOutcome::Pending {
                        ticket_id: ticket.id,
                        error: reason,
                    },
                    Err(db_err) => {
                        error!(
                            number = %voucher.invoice.number,
                            print_error = %reason,
                            error = %db_err,
                            "Could not store pending ticket"
                        );
                        PrintOutcome::Failed {
                            error: format!("{}; ticket not stored: {}", reason, db_err),
                        }
                    }
                }
            }
        }
    }

    async fn send(&self, payload: &serde_json::Value) -> Result<(), reqwest::Error> {
        self.http
            .post(&self.settings.helper_url)
            .json(payload)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

/// Ticket body sent to the helper and stored with pending tickets.
pub fn ticket_payload(company: &CompanySettings, voucher: &InvoiceWithItems) -> serde_json::Value {
    let invoice = &voucher.invoice;
    let lines: Vec<serde_json::Value> = voucher
        .items
        .iter()
        .map(|item| {
            json!({
                "sku": item.sku_snapshot,
                "name": item.name_snapshot,
                "quantity": item.quantity,
                "unitPrice": Money::from_cents(item.unit_price_cents).to_string(),
                "total": item.total().to_string(),
            })
        })
        .collect();

    json!({
        "company": company.name,
        "cuit": company.cuit,
        "title": invoice.voucher_type.title(),
        "letter": invoice.voucher_type.letter(),
        "number": invoice.number,
        "date": invoice.issue_date.format("%d/%m/%Y").to_string(),
        "lines": lines,
        "subtotal": Money::from_cents(invoice.subtotal_cents).to_string(),
        "tax": Money::from_cents(invoice.tax_cents).to_string(),
        "total": invoice.total().to_string(),
        "cae": invoice.cae,
        "caeExpiresOn": invoice.cae_expires_on.map(|d| d.format("%d/%m/%Y").to_string()),
    })
}
