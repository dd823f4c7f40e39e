//! # AFIP Authorization Seam
//!
//! The interface between voucher issuance and the tax authority. Issuance
//! code only sees [`AfipClient`]; the app decides which implementation
//! backs it (a simulator today).
//!
//! ```text
//!  InvoiceRepository::issue / ::reverse
//!        │  AuthorizationRequest { type, pto vta, number, date, total, doc }
//!        ▼
//!  dyn AfipClient ──► Authorization { cae, expires_on }
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::Authorization;
use crate::voucher::VoucherType;

/// Data AFIP needs to authorize one voucher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationRequest {
    pub voucher_type: VoucherType,
    pub point_of_sale: i64,
    pub sequence: i64,
    pub issue_date: NaiveDate,
    pub total_cents: i64,
    /// Receiver CUIT/DNI, `None` for an unidentified final consumer.
    pub receiver_tax_id: Option<String>,
}

/// AFIP refused or could not process a request.
#[derive(Debug, Error)]
pub enum AfipError {
    #[error("Voucher type {0} is not authorized by AFIP")]
    NotFiscal(VoucherType),

    #[error("AFIP rejected the voucher: {0}")]
    Rejected(String),

    #[error("AFIP unavailable: {0}")]
    Unavailable(String),
}

/// Obtains a CAE for a fiscal voucher.
///
/// Called while the issuing transaction is open, so implementations must
/// not touch the database.
pub trait AfipClient: Send + Sync {
    fn authorize(&self, request: &AuthorizationRequest) -> Result<Authorization, AfipError>;
}
