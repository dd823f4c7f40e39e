//! Admin reports over a date range of invoice issue dates.

use axum::extract::{Query, State};
use axum::Json;

use super::DateRange;
use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::state::AppState;
use gestor_core::reports::{PaymentMethodTotal, ProductSales, VendorCommission};

/// `GET /api/reports/commissions?from=&to=`
pub async fn commissions(
    State(state): State<AppState>,
    user: AuthUser,
    Query(range): Query<DateRange>,
) -> ApiResult<Json<Vec<VendorCommission>>> {
    user.require_admin()?;
    let (from, to) = range.required()?;
    Ok(Json(state.db.reports().commissions(from, to).await?))
}

/// `GET /api/reports/payment-methods?from=&to=`
pub async fn payment_methods(
    State(state): State<AppState>,
    user: AuthUser,
    Query(range): Query<DateRange>,
) -> ApiResult<Json<Vec<PaymentMethodTotal>>> {
    user.require_admin()?;
    let (from, to) = range.required()?;
    Ok(Json(state.db.reports().payment_methods(from, to).await?))
}

/// `GET /api/reports/products?from=&to=`
pub async fn products(
    State(state): State<AppState>,
    user: AuthUser,
    Query(range): Query<DateRange>,
) -> ApiResult<Json<Vec<ProductSales>>> {
    user.require_admin()?;
    let (from, to) = range.required()?;
    Ok(Json(state.db.reports().products(from, to).await?))
}
