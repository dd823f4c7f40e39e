//! Invoices, credit notes, payments, PDF and reprint.

use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::orders::{issue_order, OrderRequest};
use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::pdf::{render_voucher, VoucherDocument};
use crate::printing::PrintOutcome;
use crate::state::AppState;
use gestor_core::{Invoice, InvoiceWithItems, Payment};
use gestor_db::repository::{InvoiceFilter, NewPayment};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceDetail {
    #[serde(flatten)]
    pub voucher: InvoiceWithItems,
    pub payments: Vec<Payment>,
    /// The credit note that voided this invoice, if any.
    pub credit_note: Option<Invoice>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CreditNoteRequest {
    pub reason: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PaymentResponse {
    pub invoice: Invoice,
    pub payment: Payment,
}

async fn load_voucher(state: &AppState, id: &str) -> ApiResult<InvoiceWithItems> {
    state
        .db
        .invoices()
        .get_with_items(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Invoice", id))
}

pub async fn list(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(filter): Query<InvoiceFilter>,
) -> ApiResult<Json<Vec<Invoice>>> {
    Ok(Json(state.db.invoices().list(&filter).await?))
}

/// `POST /api/invoices`: issues a voucher directly, without printing.
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    Json(order): Json<OrderRequest>,
) -> ApiResult<(StatusCode, Json<InvoiceWithItems>)> {
    let outcome = issue_order(&state, &user, order).await?;
    let status = if outcome.is_duplicate() {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };
    Ok((status, Json(outcome.into_inner())))
}

pub async fn get(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<InvoiceDetail>> {
    let voucher = load_voucher(&state, &id).await?;
    let payments = state.db.invoices().payments(&id).await?;
    let credit_note = state.db.invoices().find_reversal(&id).await?;

    Ok(Json(InvoiceDetail {
        voucher,
        payments,
        credit_note,
    }))
}

/// `POST /api/invoices/{id}/payments`
pub async fn add_payment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(payment): Json<NewPayment>,
) -> ApiResult<(StatusCode, Json<PaymentResponse>)> {
    let (invoice, payment) = state.db.invoices().add_payment(&id, payment, &user.id).await?;
    Ok((StatusCode::CREATED, Json(PaymentResponse { invoice, payment })))
}

/// `POST /api/invoices/{id}/credit-note`: voids the invoice, admin only.
pub async fn credit_note(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    body: Option<Json<CreditNoteRequest>>,
) -> ApiResult<(StatusCode, Json<InvoiceWithItems>)> {
    user.require_admin()?;
    let reason = body.and_then(|Json(req)| req.reason);

    let credit_note = state
        .db
        .invoices()
        .reverse(&id, reason, &user.id, state.today(), state.afip.as_ref())
        .await?;

    info!(
        original = %id,
        credit_note = %credit_note.invoice.number,
        by = %user.username,
        "Invoice voided"
    );
    Ok((StatusCode::CREATED, Json(credit_note)))
}

/// `GET /api/invoices/{id}/pdf`
pub async fn pdf(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let voucher = load_voucher(&state, &id).await?;

    let client = match voucher.invoice.client_id.as_deref() {
        Some(client_id) => state.db.clients().get_by_id(client_id).await?,
        None => None,
    };
    let associated_number = match voucher.invoice.voided_invoice_id.as_deref() {
        Some(original_id) => state
            .db
            .invoices()
            .get_by_id(original_id)
            .await?
            .map(|original| original.number),
        None => None,
    };

    let company = state.settings.company.clone();
    let rows_per_page = state.settings.pdf.rows_per_page;
    let filename = format!("{}.pdf", voucher.invoice.number);

    let bytes = tokio::task::spawn_blocking(move || {
        let doc = VoucherDocument {
            company: &company,
            voucher: &voucher,
            client: client.as_ref(),
            associated_number: associated_number.as_deref(),
        };
        render_voucher(&doc, rows_per_page)
    })
    .await
    .map_err(|e| ApiError::Internal(format!("PDF task failed: {}", e)))??;

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("inline; filename=\"{}\"", filename),
            ),
        ],
        bytes,
    ))
}

/// `POST /api/invoices/{id}/print`: sends the ticket again.
pub async fn print(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<PrintOutcome>> {
    let voucher = load_voucher(&state, &id).await?;
    let outcome = state
        .printer
        .dispatch(&state.db, &state.settings.company, &voucher)
        .await;
    Ok(Json(outcome))
}
