//! Login, logout, first-user bootstrap and `me`.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::auth::{hash_password, verify_password, AuthUser};
use crate::config::AuthSettings;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use gestor_core::validation::{validate_name, validate_password, validate_username};
use gestor_core::Role;
use gestor_db::repository::NewUser;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct BootstrapRequest {
    pub username: String,
    pub password: String,
    pub name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub user: AuthUser,
    /// Also set as the HttpOnly cookie; returned for non-browser clients.
    pub token: String,
    pub expires_in: i64,
}

fn session_cookie(settings: &AuthSettings, token: String) -> Cookie<'static> {
    Cookie::build((settings.cookie_name.clone(), token))
        .path("/")
        .http_only(true)
        .secure(settings.cookie_secure)
        .same_site(SameSite::Lax)
        .build()
}

/// `POST /api/auth/bootstrap`: creates the first SUPERADMIN.
pub async fn bootstrap(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<BootstrapRequest>,
) -> ApiResult<impl IntoResponse> {
    validate_username(&req.username)?;
    validate_password(&req.password)?;
    validate_name("name", &req.name)?;

    let new = NewUser {
        username: req.username,
        password_hash: hash_password(&req.password)?,
        name: req.name,
        role: Role::Superadmin,
        branch_id: None,
        commission_bps: 0,
    };

    let user = state
        .db
        .users()
        .bootstrap(new)
        .await?
        .ok_or_else(|| ApiError::Conflict("Users already exist; log in instead".to_string()))?;

    let token = state.jwt.issue(&user)?;
    let jar = jar.add(session_cookie(&state.settings.auth, token.clone()));

    Ok((
        StatusCode::CREATED,
        jar,
        Json(SessionResponse {
            user: user.into(),
            token,
            expires_in: state.jwt.lifetime_secs(),
        }),
    ))
}

/// `POST /api/auth/login`
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    let user = state.db.users().get_by_username(&req.username).await?;

    let user = match user {
        Some(u) if u.is_active && verify_password(&req.password, &u.password_hash) => u,
        _ => {
            warn!(username = %req.username, "Failed login");
            return Err(ApiError::Unauthenticated(
                "Invalid username or password".to_string(),
            ));
        }
    };

    let token = state.jwt.issue(&user)?;
    info!(username = %user.username, role = user.role.as_str(), "User logged in");

    let jar = jar.add(session_cookie(&state.settings.auth, token.clone()));
    Ok((
        jar,
        Json(SessionResponse {
            user: user.into(),
            token,
            expires_in: state.jwt.lifetime_secs(),
        }),
    ))
}

/// `POST /api/auth/logout`: clears the cookie.
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    let removal = Cookie::build((state.settings.auth.cookie_name.clone(), "")).path("/");
    (jar.remove(removal), StatusCode::NO_CONTENT)
}

/// `GET /api/auth/me`
pub async fn me(user: AuthUser) -> Json<AuthUser> {
    Json(user)
}
