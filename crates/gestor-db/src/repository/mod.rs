//! # Repository Module
//!
//! Database repository implementations for Gestor.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  axum handler                                                          │
//! │       │  db.invoices().reverse(&id, reason, &user, today, afip)        │
//! │       ▼                                                                 │
//! │  InvoiceRepository                                                     │
//! │  ├── issue / reverse / add_payment   (write transactions)              │
//! │  └── get / list / items              (reads)                           │
//! │       │                                                                 │
//! │       │  SQL (runtime-checked, rows mapped with FromRow)               │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Functions that must run inside another repository's transaction take a
//! `&mut SqliteConnection` and are `pub(crate)`; callers pass `&mut *tx`.
//!
//! Write transactions open with `BEGIN IMMEDIATE` through [`begin_write`]:
//! the write lock is taken up front, so a second writer waits out
//! `busy_timeout` instead of failing when it upgrades from a read.
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`] - Catalog CRUD and stock adjustments
//! - [`ClientRepository`] - Clients
//! - [`UserRepository`] - Users/vendors and first-user bootstrap
//! - [`BranchRepository`] - Branches and their points of sale
//! - [`InvoiceRepository`] - Issuance, credit notes, payments
//! - [`ReportRepository`] - Rows for commission and sales reports
//! - [`CashClosureRepository`] - Cash-register closures
//! - [`AfipCertificateRepository`] - Stored AFIP certificates
//! - [`PrintTicketRepository`] - Pending print tickets

use sqlx::{Sqlite, SqlitePool, Transaction};

use crate::error::DbResult;

pub mod afip;
pub mod branch;
pub mod cash_closure;
pub mod client;
pub mod invoice;
pub mod print;
pub mod product;
pub mod report;
pub mod user;

pub use afip::{AfipCertificateRepository, NewAfipCertificate};
pub use branch::{BranchRepository, BranchUpdate, NewBranch};
pub use cash_closure::{CashClosureRepository, CashClosurePreview, NewCashClosure};
pub use client::{ClientRepository, ClientUpdate, NewClient};
pub use invoice::{
    InvoiceFilter, InvoiceRepository, IssueOutcome, NewPayment, NewVoucher, OrderLine,
};
pub use print::PrintTicketRepository;
pub use product::{NewProduct, ProductRepository, ProductUpdate};
pub use report::ReportRepository;
pub use user::{NewUser, UserRepository, UserUpdate};

/// Opens a transaction holding SQLite's write lock from its first statement.
pub(crate) async fn begin_write(pool: &SqlitePool) -> DbResult<Transaction<'static, Sqlite>> {
    Ok(pool.begin_with("BEGIN IMMEDIATE").await?)
}

/// Generates a new entity id.
pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Turns a free-text search into a LIKE pattern.
pub(crate) fn like_pattern(query: &str) -> String {
    let escaped = query
        .trim()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Fixtures shared by the repository tests.

    use crate::{Database, DbConfig};
    use gestor_core::{Product, Role, TaxCondition, User};

    use super::{NewClient, NewProduct, NewUser};

    pub async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    pub async fn vendor(db: &Database, username: &str, commission_bps: u32) -> User {
        db.users()
            .insert(NewUser {
                username: username.to_string(),
                password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".to_string(),
                name: format!("Vendedor {username}"),
                role: Role::Vendedor,
                branch_id: None,
                commission_bps,
            })
            .await
            .unwrap()
    }

    pub async fn product(db: &Database, sku: &str, price_cents: i64, stock: i64) -> Product {
        db.products()
            .insert(NewProduct {
                sku: sku.to_string(),
                name: format!("Producto {sku}"),
                description: None,
                price_cents,
                cost_cents: None,
                tax_rate_bps: 2100,
                track_inventory: true,
                allow_negative_stock: false,
                current_stock: stock,
            })
            .await
            .unwrap()
    }

    pub async fn client(db: &Database, condition: TaxCondition) -> gestor_core::Client {
        db.clients()
            .insert(NewClient {
                name: "Almacen Don Jose".to_string(),
                tax_id: Some("20123456786".to_string()),
                tax_condition: condition,
                address: Some("Av. Siempreviva 742".to_string()),
                email: None,
                phone: None,
            })
            .await
            .unwrap()
    }
}
