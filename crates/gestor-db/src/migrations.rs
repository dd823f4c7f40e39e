//! # Schema Migrations
//!
//! The schema ships inside the binary (`migrations/sqlite/NNN_*.sql`) and is
//! applied on every start; sqlx records each file's checksum in
//! `_sqlx_migrations`, so an edited migration fails loudly.
//!
//! ```text
//!  001_initial_schema.sql   users, branches, products, clients,
//!                           invoices (+ series and one-credit-note indexes),
//!                           invoice_items, payments, cash_closures,
//!                           afip_certificates, print_tickets
//! ```
//!
//! Changes go in a new numbered file; applied files are never edited.

use sqlx::SqlitePool;
use tracing::info;

use crate::error::DbResult;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    MIGRATOR.run(pool).await?;
    info!(migrations = MIGRATOR.migrations.len(), "Schema up to date");
    Ok(())
}

/// `(total, applied)`; a database never migrated reports zero applied.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<(usize, usize)> {
    let total = MIGRATOR.migrations.len();

    let tracked: Option<String> = sqlx::query_scalar(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name = '_sqlx_migrations'",
    )
    .fetch_optional(pool)
    .await?;
    if tracked.is_none() {
        return Ok((total, 0));
    }

    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = 1")
        .fetch_one(pool)
        .await?;
    Ok((total, applied as usize))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};

    #[tokio::test]
    async fn unmigrated_database_reports_nothing_applied() {
        let db = Database::new(DbConfig::in_memory().skip_migrations()).await.unwrap();

        let (total, applied) = migration_status(db.pool()).await.unwrap();
        assert!(total > 0);
        assert_eq!(applied, 0);

        run_migrations(db.pool()).await.unwrap();
        // Running twice is a no-op.
        run_migrations(db.pool()).await.unwrap();
        assert_eq!(migration_status(db.pool()).await.unwrap(), (total, total));
    }
}
