//! Vendor (user) administration.
//!
//! Admins manage vendors; granting `ADMIN` or `SUPERADMIN` takes a
//! superadmin.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use crate::auth::{hash_password, AuthUser};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use gestor_core::validation::validate_password;
use gestor_core::{Role, User};
use gestor_db::repository::{NewUser, UserUpdate};

#[derive(Debug, Deserialize)]
pub struct VendorQuery {
    pub role: Option<Role>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateVendorRequest {
    pub username: String,
    pub password: String,
    pub name: String,
    #[serde(default = "default_role")]
    pub role: Role,
    pub branch_id: Option<String>,
    #[serde(default)]
    pub commission_bps: u32,
}

fn default_role() -> Role {
    Role::Vendedor
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateVendorRequest {
    pub name: Option<String>,
    pub password: Option<String>,
    pub role: Option<Role>,
    pub branch_id: Option<String>,
    pub commission_bps: Option<u32>,
    pub is_active: Option<bool>,
}

fn check_role_grant(caller: &AuthUser, role: Role) -> Result<(), ApiError> {
    if role.is_admin() {
        caller.require_superadmin()
    } else {
        Ok(())
    }
}

pub async fn list(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<VendorQuery>,
) -> ApiResult<Json<Vec<User>>> {
    user.require_admin()?;
    let users = state.db.users().list(query.role).await?;
    Ok(Json(users))
}

pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<CreateVendorRequest>,
) -> ApiResult<(StatusCode, Json<User>)> {
    user.require_admin()?;
    check_role_grant(&user, req.role)?;
    validate_password(&req.password)?;

    let created = state
        .db
        .users()
        .insert(NewUser {
            username: req.username,
            password_hash: hash_password(&req.password)?,
            name: req.name,
            role: req.role,
            branch_id: req.branch_id,
            commission_bps: req.commission_bps,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<UpdateVendorRequest>,
) -> ApiResult<Json<User>> {
    user.require_admin()?;
    if let Some(role) = req.role {
        check_role_grant(&user, role)?;
    }

    let password_hash = match req.password.as_deref() {
        Some(password) => {
            validate_password(password)?;
            Some(hash_password(password)?)
        }
        None => None,
    };

    let updated = state
        .db
        .users()
        .update(
            &id,
            UserUpdate {
                name: req.name,
                password_hash,
                role: req.role,
                branch_id: req.branch_id,
                commission_bps: req.commission_bps,
                is_active: req.is_active,
            },
        )
        .await?;
    Ok(Json(updated))
}

/// Deactivates the user; their vouchers and commissions stay.
pub async fn delete(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    user.require_admin()?;
    if id == user.id {
        return Err(ApiError::Unprocessable("You cannot deactivate yourself".to_string()));
    }
    state.db.users().deactivate(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
