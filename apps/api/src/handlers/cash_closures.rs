use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use super::clamp_limit;
use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::state::AppState;
use gestor_core::CashClosure;
use gestor_db::repository::{CashClosurePreview, NewCashClosure};

/// `?branchId=` (or `branch_id`); defaults to the caller's branch.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClosureQuery {
    #[serde(alias = "branch_id")]
    pub branch_id: Option<String>,
    pub limit: Option<u32>,
}

impl ClosureQuery {
    fn branch<'a>(&'a self, user: &'a AuthUser) -> Option<&'a str> {
        self.branch_id.as_deref().or(user.branch_id.as_deref())
    }
}

pub async fn list(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ClosureQuery>,
) -> ApiResult<Json<Vec<CashClosure>>> {
    let closures = state
        .db
        .cash_closures()
        .list(query.branch(&user), clamp_limit(query.limit))
        .await?;
    Ok(Json(closures))
}

pub async fn preview(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ClosureQuery>,
) -> ApiResult<Json<CashClosurePreview>> {
    Ok(Json(state.db.cash_closures().preview(query.branch(&user)).await?))
}

pub async fn close(
    State(state): State<AppState>,
    user: AuthUser,
    Json(mut new): Json<NewCashClosure>,
) -> ApiResult<(StatusCode, Json<CashClosure>)> {
    if new.branch_id.is_none() {
        new.branch_id = user.branch_id.clone();
    }
    let closure = state.db.cash_closures().close(new, &user.id).await?;
    Ok((StatusCode::CREATED, Json(closure)))
}
