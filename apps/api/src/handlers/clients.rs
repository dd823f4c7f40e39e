use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;

use super::SearchQuery;
use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use gestor_core::Client;
use gestor_db::repository::{ClientUpdate, NewClient};

pub async fn list(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<Vec<Client>>> {
    let clients = state.db.clients().list(query.text(), query.limit()).await?;
    Ok(Json(clients))
}

pub async fn get(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Client>> {
    let client = state
        .db
        .clients()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Client", &id))?;
    Ok(Json(client))
}

pub async fn create(
    State(state): State<AppState>,
    _user: AuthUser,
    Json(new): Json<NewClient>,
) -> ApiResult<(StatusCode, Json<Client>)> {
    let client = state.db.clients().insert(new).await?;
    Ok((StatusCode::CREATED, Json(client)))
}

pub async fn update(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<String>,
    Json(update): Json<ClientUpdate>,
) -> ApiResult<Json<Client>> {
    let client = state.db.clients().update(&id, update).await?;
    Ok(Json(client))
}

/// Soft delete, admin only. Issued vouchers keep pointing at the client.
pub async fn delete(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    user.require_admin()?;
    state.db.clients().deactivate(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
