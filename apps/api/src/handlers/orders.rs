//! # Orders and Offline Sync
//!
//! ```text
//!  POST /api/orders                      POST /api/orders/sync
//!       │                                      │  { orders: [ {offlineId, ...}, ... ] }
//!       ▼                                      ▼
//!  resolve point of sale               for each order (independently):
//!  InvoiceRepository::issue               issue(offline_id)
//!       │                                   ├── Created   ─► CREATED
//!       ▼                                   ├── Duplicate ─► DUPLICATE (existing voucher)
//!  PrintClient::dispatch                    └── Err       ─► FAILED (message), keep going
//!       │
//!       ├── helper down ─► pending ticket
//!       └── ticket not stored ─► FAILED, order still 201
//! ```

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::printing::PrintOutcome;
use crate::state::AppState;
use gestor_core::{Invoice, InvoiceWithItems, VoucherType};
use gestor_db::repository::{IssueOutcome, NewPayment, NewVoucher, OrderLine};

/// Orders accepted in one sync call.
pub const MAX_SYNC_BATCH: usize = 500;

/// An order as sent by the web client, online or replayed from its cache.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    pub client_id: Option<String>,
    /// Defaults by the client's tax condition.
    pub voucher_type: Option<VoucherType>,
    pub branch_id: Option<String>,
    pub items: Vec<OrderLine>,
    #[serde(default)]
    pub payments: Vec<NewPayment>,
    pub reason: Option<String>,
    pub offline_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub invoice: InvoiceWithItems,
    pub duplicate: bool,
    pub print: Option<PrintOutcome>,
}

#[derive(Debug, Deserialize)]
pub struct SyncRequest {
    pub orders: Vec<OrderRequest>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SyncStatus {
    Created,
    Duplicate,
    Failed,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResult {
    pub offline_id: Option<String>,
    pub status: SyncStatus,
    pub invoice: Option<Invoice>,
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SyncResponse {
    pub results: Vec<SyncResult>,
}

/// Issues the voucher for an order on behalf of `user`.
///
/// The point of sale comes from the order's branch, else the user's
/// branch, else the company default.
pub(crate) async fn issue_order(
    state: &AppState,
    user: &AuthUser,
    order: OrderRequest,
) -> ApiResult<IssueOutcome> {
    let branch_id = order.branch_id.or_else(|| user.branch_id.clone());

    let point_of_sale = match branch_id.as_deref() {
        Some(id) => {
            let branch = state
                .db
                .branches()
                .get_by_id(id)
                .await?
                .filter(|b| b.is_active)
                .ok_or_else(|| ApiError::not_found("Branch", id))?;
            branch.point_of_sale
        }
        None => state.settings.company.point_of_sale,
    };

    let voucher = NewVoucher {
        voucher_type: order.voucher_type,
        point_of_sale,
        client_id: order.client_id,
        user_id: user.id.clone(),
        branch_id,
        issue_date: state.today(),
        items: order.items,
        payments: order.payments,
        reason: order.reason,
        offline_id: order.offline_id,
    };

    Ok(state.db.invoices().issue(voucher, state.afip.as_ref()).await?)
}

/// `POST /api/orders`
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    Json(order): Json<OrderRequest>,
) -> ApiResult<(StatusCode, Json<OrderResponse>)> {
    let outcome = issue_order(&state, &user, order).await?;

    if outcome.is_duplicate() {
        return Ok((
            StatusCode::OK,
            Json(OrderResponse {
                invoice: outcome.into_inner(),
                duplicate: true,
                print: None,
            }),
        ));
    }

    let invoice = outcome.into_inner();
    let print = state
        .printer
        .dispatch(&state.db, &state.settings.company, &invoice)
        .await;

    Ok((
        StatusCode::CREATED,
        Json(OrderResponse {
            invoice,
            duplicate: false,
            print: Some(print),
        }),
    ))
}

/// `POST /api/orders/sync`: replays orders taken while offline.
///
/// Each order is its own transaction; one failure does not stop the batch.
pub async fn sync(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<SyncRequest>,
) -> ApiResult<Json<SyncResponse>> {
    if req.orders.len() > MAX_SYNC_BATCH {
        return Err(ApiError::BadRequest(format!(
            "at most {} orders per sync",
            MAX_SYNC_BATCH
        )));
    }

    let total = req.orders.len();
    let mut results = Vec::with_capacity(total);

    for order in req.orders {
        let offline_id = order.offline_id.clone();

        if offline_id.as_deref().map_or(true, |id| id.trim().is_empty()) {
            results.push(SyncResult {
                offline_id,
                status: SyncStatus::Failed,
                invoice: None,
                error: Some("offlineId is required".to_string()),
            });
            continue;
        }

        let result = match issue_order(&state, &user, order).await {
            Ok(IssueOutcome::Created(voucher)) => SyncResult {
                offline_id,
                status: SyncStatus::Created,
                invoice: Some(voucher.invoice),
                error: None,
            },
            Ok(IssueOutcome::Duplicate(voucher)) => SyncResult {
                offline_id,
                status: SyncStatus::Duplicate,
                invoice: Some(voucher.invoice),
                error: None,
            },
            Err(e) => {
                warn!(offline_id = ?offline_id, error = %e, "Offline order rejected");
                SyncResult {
                    offline_id,
                    status: SyncStatus::Failed,
                    invoice: None,
                    error: Some(e.client_message()),
                }
            }
        };
        results.push(result);
    }

    let created = results.iter().filter(|r| r.status == SyncStatus::Created).count();
    let failed = results.iter().filter(|r| r.status == SyncStatus::Failed).count();
    info!(total, created, failed, user = %user.username, "Offline orders synced");

    Ok(Json(SyncResponse { results }))
}
