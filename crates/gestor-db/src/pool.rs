//! # Database Handle
//!
//! Opens the Gestor SQLite file, applies the schema and hands out one
//! repository per table family.
//!
//! ```text
//!  [database] path / max_connections
//!       │
//!       ▼
//!  DbConfig ──► connect_options()          file: WAL, NORMAL sync
//!       │         foreign_keys = on        :memory: one shared connection
//!       │         busy_timeout
//!       ▼
//!  SqlitePool ──► migrations ──► Database
//!                                   ├── invoices()       issue / reverse / pay
//!                                   ├── products() clients() users() branches()
//!                                   ├── reports() cash_closures()
//!                                   └── afip_certificates() print_tickets()
//! ```
//!
//! Orders serialize on SQLite's single writer: write transactions take the
//! lock with `BEGIN IMMEDIATE` and `busy_timeout` makes a
//! second order wait for the lock instead of failing with `SQLITE_BUSY`.

use std::path::PathBuf;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::{
    AfipCertificateRepository, BranchRepository, CashClosureRepository, ClientRepository,
    InvoiceRepository, PrintTicketRepository, ProductRepository, ReportRepository,
    UserRepository,
};

const IN_MEMORY: &str = ":memory:";

// =============================================================================
// Configuration
// =============================================================================

/// Where the database lives and how the pool behaves.
///
/// ```rust,ignore
/// let config = DbConfig::new("./data/gestor.db").max_connections(8);
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub database_path: PathBuf,
    pub max_connections: u32,
    /// How long a request waits for a free pooled connection.
    pub acquire_timeout: Duration,
    /// How long a write waits for the SQLite lock.
    pub busy_timeout: Duration,
    pub run_migrations: bool,
}

impl DbConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 5,
            acquire_timeout: Duration::from_secs(30),
            busy_timeout: Duration::from_secs(5),
            run_migrations: true,
        }
    }

    /// Private database for one test.
    ///
    /// The pool holds exactly one connection, since each `:memory:`
    /// connection would otherwise see its own empty database. Work inside
    /// a transaction must go through the transaction: a second acquire
    /// would wait forever.
    pub fn in_memory() -> Self {
        DbConfig {
            database_path: PathBuf::from(IN_MEMORY),
            max_connections: 1,
            acquire_timeout: Duration::from_secs(5),
            busy_timeout: Duration::from_secs(1),
            run_migrations: true,
        }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max.max(1);
        self
    }

    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    /// Opens an existing schema as-is (used by tools that inspect a copy).
    pub fn skip_migrations(mut self) -> Self {
        self.run_migrations = false;
        self
    }

    pub fn is_in_memory(&self) -> bool {
        self.database_path.as_os_str() == IN_MEMORY
    }

    fn connect_options(&self) -> SqliteConnectOptions {
        let options = if self.is_in_memory() {
            SqliteConnectOptions::new().in_memory(true)
        } else {
            SqliteConnectOptions::new()
                .filename(&self.database_path)
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal)
                .synchronous(SqliteSynchronous::Normal)
        };

        // Invoice items, payments and credit notes all point at invoices.
        options.foreign_keys(true).busy_timeout(self.busy_timeout)
    }
}

// =============================================================================
// Database
// =============================================================================

/// Cloneable handle over the pool; the API keeps one in its state.
///
/// ```rust,ignore
/// let voucher = db.invoices().get_with_items(&id).await?;
/// ```
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Connects and, unless disabled, brings the schema up to date.
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(path = %config.database_path.display(), "Opening database");

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(if config.is_in_memory() { 1 } else { 0 })
            .acquire_timeout(config.acquire_timeout)
            // An in-memory database disappears with its last connection.
            .idle_timeout(if config.is_in_memory() {
                None
            } else {
                Some(Duration::from_secs(600))
            })
            .max_lifetime(if config.is_in_memory() {
                None
            } else {
                Some(Duration::from_secs(1800))
            })
            .connect_with(config.connect_options())
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        debug!(max_connections = config.max_connections, "Pool ready");

        let db = Database { pool };
        if config.run_migrations {
            migrations::run_migrations(&db.pool).await?;
        }
        Ok(db)
    }

    /// Raw pool, for queries no repository covers.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn products(&self) -> ProductRepository {
        ProductRepository::new(self.pool.clone())
    }

    pub fn clients(&self) -> ClientRepository {
        ClientRepository::new(self.pool.clone())
    }

    pub fn users(&self) -> UserRepository {
        UserRepository::new(self.pool.clone())
    }

    pub fn branches(&self) -> BranchRepository {
        BranchRepository::new(self.pool.clone())
    }

    /// Issuance, reversal and payments.
    pub fn invoices(&self) -> InvoiceRepository {
        InvoiceRepository::new(self.pool.clone())
    }

    pub fn reports(&self) -> ReportRepository {
        ReportRepository::new(self.pool.clone())
    }

    pub fn cash_closures(&self) -> CashClosureRepository {
        CashClosureRepository::new(self.pool.clone())
    }

    pub fn afip_certificates(&self) -> AfipCertificateRepository {
        AfipCertificateRepository::new(self.pool.clone())
    }

    pub fn print_tickets(&self) -> PrintTicketRepository {
        PrintTicketRepository::new(self.pool.clone())
    }

    /// `(total, applied)` migration counts.
    pub async fn migration_status(&self) -> DbResult<(usize, usize)> {
        migrations::migration_status(&self.pool).await
    }

    /// `true` when a trivial query goes through; backs `GET /health`.
    pub async fn health_check(&self) -> bool {
        sqlx::query_scalar::<_, i64>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .is_ok()
    }

    /// Waits for checked-out connections and closes the pool.
    pub async fn close(&self) {
        info!("Closing database");
        self.pool.close().await;
    }
}
