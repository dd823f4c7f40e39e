use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::state::AppState;
use gestor_core::Branch;
use gestor_db::repository::{BranchUpdate, NewBranch};

pub async fn list(State(state): State<AppState>, _user: AuthUser) -> ApiResult<Json<Vec<Branch>>> {
    Ok(Json(state.db.branches().list().await?))
}

pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    Json(new): Json<NewBranch>,
) -> ApiResult<(StatusCode, Json<Branch>)> {
    user.require_admin()?;
    let branch = state.db.branches().insert(new).await?;
    Ok((StatusCode::CREATED, Json(branch)))
}

pub async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(update): Json<BranchUpdate>,
) -> ApiResult<Json<Branch>> {
    user.require_admin()?;
    Ok(Json(state.db.branches().update(&id, update).await?))
}
