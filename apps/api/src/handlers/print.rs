use axum::extract::{Path, State};
use axum::Json;

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::state::AppState;
use gestor_core::PrintTicket;

/// `GET /api/print/pending`
pub async fn pending(State(state): State<AppState>, _user: AuthUser) -> ApiResult<Json<Vec<PrintTicket>>> {
    Ok(Json(state.db.print_tickets().list_pending().await?))
}

/// `POST /api/print/pending/{id}/done`: the ticket was reprinted by hand.
pub async fn mark_done(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<PrintTicket>> {
    Ok(Json(state.db.print_tickets().mark_printed(&id).await?))
}
