//! Branch (sucursal) repository.

use chrono::Utc;
use serde::Deserialize;
use sqlx::SqlitePool;

use super::new_id;
use crate::error::{DbError, DbResult};
use gestor_core::validation::{validate_name, validate_point_of_sale};
use gestor_core::Branch;

const BRANCH_COLUMNS: &str = "id, name, address, point_of_sale, is_active, created_at";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBranch {
    pub name: String,
    pub address: Option<String>,
    pub point_of_sale: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchUpdate {
    pub name: Option<String>,
    pub address: Option<String>,
    pub point_of_sale: Option<i64>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct BranchRepository {
    pool: SqlitePool,
}

impl BranchRepository {
    pub fn new(pool: SqlitePool) -> Self {
        BranchRepository { pool }
    }

    pub async fn list(&self) -> DbResult<Vec<Branch>> {
        let sql = format!("SELECT {BRANCH_COLUMNS} FROM branches ORDER BY name");
        let branches = sqlx::query_as::<_, Branch>(&sql).fetch_all(&self.pool).await?;
        Ok(branches)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Branch>> {
        let sql = format!("SELECT {BRANCH_COLUMNS} FROM branches WHERE id = ?1");
        let branch = sqlx::query_as::<_, Branch>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(branch)
    }

    pub async fn insert(&self, new: NewBranch) -> DbResult<Branch> {
        validate_name("name", &new.name)?;
        validate_point_of_sale(new.point_of_sale)?;

        let branch = Branch {
            id: new_id(),
            name: new.name.trim().to_string(),
            address: new.address,
            point_of_sale: new.point_of_sale,
            is_active: true,
            created_at: Utc::now(),
        };

        let sql = format!("INSERT INTO branches ({BRANCH_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6)");
        sqlx::query(&sql)
            .bind(&branch.id)
            .bind(&branch.name)
            .bind(&branch.address)
            .bind(branch.point_of_sale)
            .bind(branch.is_active)
            .bind(branch.created_at)
            .execute(&self.pool)
            .await?;

        Ok(branch)
    }

    pub async fn update(&self, id: &str, update: BranchUpdate) -> DbResult<Branch> {
        if let Some(name) = &update.name {
            validate_name("name", name)?;
        }
        if let Some(pos) = update.point_of_sale {
            validate_point_of_sale(pos)?;
        }

        let result = sqlx::query(
            r#"
            UPDATE branches SET
                name = COALESCE(?2, name),
                address = COALESCE(?3, address),
                point_of_sale = COALESCE(?4, point_of_sale),
                is_active = COALESCE(?5, is_active)
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(update.name.as_deref().map(str::trim))
        .bind(update.address)
        .bind(update.point_of_sale)
        .bind(update.is_active)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Branch", id));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Branch", id))
    }
}
