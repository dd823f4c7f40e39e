//! # Gestor API
//!
//! HTTP/JSON server for invoicing, credit notes, orders and reports.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           Gestor API Server                             │
//! │                                                                         │
//! │  browser ──► axum Router (/api) ──► handlers ──► gestor-db ──► SQLite  │
//! │  (cookie)         │                    │                                │
//! │              TraceLayer           ┌────┴─────────────────────┐          │
//! │              CorsLayer            │ AfipClient (simulated)   │          │
//! │                                   │ PDF + AFIP QR            │          │
//! │                                   │ print helper (reqwest)   │          │
//! │                                   └──────────────────────────┘          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`config`] - Layered settings (defaults, `gestor.toml`, `GESTOR__*`)
//! - [`error`] - [`ApiError`] and its HTTP mapping
//! - [`auth`] - JWT sessions, password hashing, [`auth::AuthUser`]
//! - [`afip`] - Simulated CAE issuance
//! - [`pdf`] - Voucher PDF with the AFIP QR
//! - [`printing`] - Print helper client with the pending-ticket fallback
//! - [`handlers`] - One module per resource
//! - [`startup`] - Router assembly and server loop

pub mod afip;
pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod pdf;
pub mod printing;
pub mod startup;
pub mod state;

// Re-exports
pub use config::Settings;
pub use error::{ApiError, ApiResult};
pub use startup::build_router;
pub use state::AppState;
