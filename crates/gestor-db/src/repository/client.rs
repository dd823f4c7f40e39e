//! # Client Repository
//!
//! CRUD for the clients vouchers are issued to. Deleting a client only
//! deactivates it; invoices keep their reference.

use chrono::Utc;
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::debug;

use super::{like_pattern, new_id};
use crate::error::{DbError, DbResult};
use gestor_core::validation::{validate_name, validate_tax_id};
use gestor_core::{Client, TaxCondition};

const CLIENT_COLUMNS: &str = "id, name, tax_id, tax_condition, address, email, phone, \
     is_active, created_at, updated_at";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewClient {
    pub name: String,
    pub tax_id: Option<String>,
    #[serde(default)]
    pub tax_condition: TaxCondition,
    pub address: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientUpdate {
    pub name: Option<String>,
    pub tax_id: Option<String>,
    pub tax_condition: Option<TaxCondition>,
    pub address: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct ClientRepository {
    pool: SqlitePool,
}

impl ClientRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ClientRepository { pool }
    }

    /// Lists active clients by name, optionally matching name or tax id.
    pub async fn list(&self, query: Option<&str>, limit: u32) -> DbResult<Vec<Client>> {
        debug!(query = ?query, "Listing clients");

        let clients = match query.map(str::trim).filter(|q| !q.is_empty()) {
            Some(q) => {
                let sql = format!(
                    "SELECT {CLIENT_COLUMNS} FROM clients \
                     WHERE is_active = 1 AND (name LIKE ?1 ESCAPE '\\' OR tax_id LIKE ?1 ESCAPE '\\') \
                     ORDER BY name LIMIT ?2"
                );
                sqlx::query_as::<_, Client>(&sql)
                    .bind(like_pattern(q))
                    .bind(limit)
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                let sql = format!(
                    "SELECT {CLIENT_COLUMNS} FROM clients WHERE is_active = 1 ORDER BY name LIMIT ?1"
                );
                sqlx::query_as::<_, Client>(&sql)
                    .bind(limit)
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        Ok(clients)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Client>> {
        let sql = format!("SELECT {CLIENT_COLUMNS} FROM clients WHERE id = ?1");
        let client = sqlx::query_as::<_, Client>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(client)
    }

    /// Inserts a client. A tax id, when given, must be a valid DNI or CUIT;
    /// it is stored as bare digits.
    pub async fn insert(&self, new: NewClient) -> DbResult<Client> {
        validate_name("name", &new.name)?;
        let tax_id = normalize_tax_id(new.tax_id.as_deref())?;

        debug!(name = %new.name, "Inserting client");

        let now = Utc::now();
        let client = Client {
            id: new_id(),
            name: new.name.trim().to_string(),
            tax_id,
            tax_condition: new.tax_condition,
            address: new.address,
            email: new.email,
            phone: new.phone,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        let sql = format!(
            "INSERT INTO clients ({CLIENT_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"
        );
        sqlx::query(&sql)
            .bind(&client.id)
            .bind(&client.name)
            .bind(&client.tax_id)
            .bind(client.tax_condition)
            .bind(&client.address)
            .bind(&client.email)
            .bind(&client.phone)
            .bind(client.is_active)
            .bind(client.created_at)
            .bind(client.updated_at)
            .execute(&self.pool)
            .await?;

        Ok(client)
    }

    pub async fn update(&self, id: &str, update: ClientUpdate) -> DbResult<Client> {
        if let Some(name) = &update.name {
            validate_name("name", name)?;
        }
        let tax_id = normalize_tax_id(update.tax_id.as_deref())?;

        let result = sqlx::query(
            r#"
            UPDATE clients SET
                name = COALESCE(?2, name),
                tax_id = COALESCE(?3, tax_id),
                tax_condition = COALESCE(?4, tax_condition),
                address = COALESCE(?5, address),
                email = COALESCE(?6, email),
                phone = COALESCE(?7, phone),
                is_active = COALESCE(?8, is_active),
                updated_at = ?9
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(update.name.as_deref().map(str::trim))
        .bind(tax_id)
        .bind(update.tax_condition)
        .bind(update.address)
        .bind(update.email)
        .bind(update.phone)
        .bind(update.is_active)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Client", id));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Client", id))
    }

    pub async fn deactivate(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("UPDATE clients SET is_active = 0, updated_at = ?2 WHERE id = ?1")
            .bind(id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Client", id));
        }
        Ok(())
    }
}

fn normalize_tax_id(tax_id: Option<&str>) -> DbResult<Option<String>> {
    match tax_id.map(str::trim).filter(|t| !t.is_empty()) {
        Some(raw) => Ok(Some(validate_tax_id(raw)?)),
        None => Ok(None),
    }
}
