use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use tracing::info;

use super::SearchQuery;
use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use gestor_core::Product;
use gestor_db::repository::{NewProduct, ProductUpdate};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockAdjustment {
    /// Positive to receive goods, negative for shrinkage.
    pub delta: i64,
    pub reason: Option<String>,
}

pub async fn list(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<Vec<Product>>> {
    let products = state.db.products().list(query.text(), query.limit()).await?;
    Ok(Json(products))
}

pub async fn get(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Product>> {
    let product = state
        .db
        .products()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product", &id))?;
    Ok(Json(product))
}

pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    Json(new): Json<NewProduct>,
) -> ApiResult<(StatusCode, Json<Product>)> {
    user.require_admin()?;
    let product = state.db.products().insert(new).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(update): Json<ProductUpdate>,
) -> ApiResult<Json<Product>> {
    user.require_admin()?;
    let product = state.db.products().update(&id, update).await?;
    Ok(Json(product))
}

pub async fn delete(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    user.require_admin()?;
    state.db.products().deactivate(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /api/products/{id}/stock`
pub async fn adjust_stock(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(adjustment): Json<StockAdjustment>,
) -> ApiResult<Json<Product>> {
    user.require_admin()?;
    if adjustment.delta == 0 {
        return Err(ApiError::BadRequest("delta must not be zero".to_string()));
    }

    let product = state.db.products().adjust_stock(&id, adjustment.delta).await?;
    info!(
        sku = %product.sku,
        delta = adjustment.delta,
        stock = product.current_stock,
        reason = adjustment.reason.as_deref().unwrap_or("-"),
        by = %user.username,
        "Stock adjusted"
    );
    Ok(Json(product))
}
