//! # User Repository
//!
//! Users and vendors. Password hashing happens in the API layer; this
//! repository only stores the PHC string.
//!
//! ## First-User Bootstrap
//! ```text
//! POST /api/auth/bootstrap
//!      │
//!      ▼
//! BEGIN ── SELECT COUNT(*) FROM users ── 0? ── INSERT SUPERADMIN ── COMMIT
//!                                        │
//!                                        └── >0 → None (endpoint answers 409)
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use super::{begin_write, new_id};
use crate::error::{DbError, DbResult};
use gestor_core::validation::{validate_commission_bps, validate_name, validate_username};
use gestor_core::{Role, User};

const USER_COLUMNS: &str = "id, username, password_hash, name, role, branch_id, commission_bps, \
     is_active, created_at, updated_at";

/// A user to insert. `password_hash` must already be hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub name: String,
    pub role: Role,
    pub branch_id: Option<String>,
    pub commission_bps: u32,
}

#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub password_hash: Option<String>,
    pub role: Option<Role>,
    pub branch_id: Option<String>,
    pub commission_bps: Option<u32>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// Looks up a user for login. Usernames are stored lowercase.
    pub async fn get_by_username(&self, username: &str) -> DbResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(username.trim().to_lowercase())
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// Lists users, optionally only those with `role`.
    pub async fn list(&self, role: Option<Role>) -> DbResult<Vec<User>> {
        let users = match role {
            Some(role) => {
                let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE role = ?1 ORDER BY name");
                sqlx::query_as::<_, User>(&sql)
                    .bind(role)
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY name");
                sqlx::query_as::<_, User>(&sql).fetch_all(&self.pool).await?
            }
        };
        Ok(users)
    }

    /// Inserts a user.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - username taken
    pub async fn insert(&self, new: NewUser) -> DbResult<User> {
        let mut conn = self.pool.acquire().await?;
        insert_user(&mut conn, new).await
    }

    /// Creates the first SUPERADMIN. Returns `None` once any user exists.
    pub async fn bootstrap(&self, mut new: NewUser) -> DbResult<Option<User>> {
        new.role = Role::Superadmin;

        let mut tx = begin_write(&self.pool).await?;
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&mut *tx)
            .await?;
        if count > 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        let user = insert_user(&mut tx, new).await?;
        tx.commit().await?;

        info!(username = %user.username, "Bootstrapped first superadmin");
        Ok(Some(user))
    }

    pub async fn update(&self, id: &str, update: UserUpdate) -> DbResult<User> {
        if let Some(name) = &update.name {
            validate_name("name", name)?;
        }
        if let Some(bps) = update.commission_bps {
            validate_commission_bps(bps)?;
        }

        debug!(id = %id, "Updating user");

        let result = sqlx::query(
            r#"
            UPDATE users SET
                name = COALESCE(?2, name),
                password_hash = COALESCE(?3, password_hash),
                role = COALESCE(?4, role),
                branch_id = COALESCE(?5, branch_id),
                commission_bps = COALESCE(?6, commission_bps),
                is_active = COALESCE(?7, is_active),
                updated_at = ?8
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(update.name.as_deref().map(str::trim))
        .bind(update.password_hash)
        .bind(update.role)
        .bind(update.branch_id)
        .bind(update.commission_bps)
        .bind(update.is_active)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("User", id))
    }

    pub async fn deactivate(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("UPDATE users SET is_active = 0, updated_at = ?2 WHERE id = ?1")
            .bind(id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }
        Ok(())
    }
}

async fn insert_user(conn: &mut SqliteConnection, new: NewUser) -> DbResult<User> {
    validate_username(&new.username)?;
    validate_name("name", &new.name)?;
    validate_commission_bps(new.commission_bps)?;

    let now = Utc::now();
    let user = User {
        id: new_id(),
        username: new.username.trim().to_lowercase(),
        password_hash: new.password_hash,
        name: new.name.trim().to_string(),
        role: new.role,
        branch_id: new.branch_id,
        commission_bps: new.commission_bps,
        is_active: true,
        created_at: now,
        updated_at: now,
    };

    let sql = format!(
        "INSERT INTO users ({USER_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"
    );
    sqlx::query(&sql)
        .bind(&user.id)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.name)
        .bind(user.role)
        .bind(&user.branch_id)
        .bind(user.commission_bps)
        .bind(user.is_active)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(conn)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::duplicate("username", &user.username),
            other => other,
        })?;

    debug!(username = %user.username, role = %user.role.as_str(), "User inserted");
    Ok(user)
}
