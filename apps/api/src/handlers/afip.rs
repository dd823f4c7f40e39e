//! AFIP certificates (superadmin) and the authorization endpoint.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::state::AppState;
use gestor_core::{AfipCertificate, Authorization, AuthorizationRequest};
use gestor_db::repository::NewAfipCertificate;

pub async fn list_certificates(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<Vec<AfipCertificate>>> {
    user.require_superadmin()?;
    Ok(Json(state.db.afip_certificates().list().await?))
}

pub async fn create_certificate(
    State(state): State<AppState>,
    user: AuthUser,
    Json(new): Json<NewAfipCertificate>,
) -> ApiResult<(StatusCode, Json<AfipCertificate>)> {
    user.require_superadmin()?;
    let cert = state.db.afip_certificates().insert(new).await?;
    Ok((StatusCode::CREATED, Json(cert)))
}

pub async fn delete_certificate(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    user.require_superadmin()?;
    state.db.afip_certificates().delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn activate_certificate(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<AfipCertificate>> {
    user.require_superadmin()?;
    Ok(Json(state.db.afip_certificates().activate(&id).await?))
}

/// `POST /api/afip/authorize`: requests a CAE without issuing a voucher.
pub async fn authorize(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<AuthorizationRequest>,
) -> ApiResult<Json<Authorization>> {
    user.require_admin()?;
    Ok(Json(state.afip.authorize(&request)?))
}
