//! HTTP handlers, one module per resource.
//!
//! Handlers stay thin: extract, check the caller's role, call a repository
//! (which owns the transaction), shape the JSON.

pub mod afip;
pub mod auth;
pub mod branches;
pub mod cash_closures;
pub mod clients;
pub mod health;
pub mod invoices;
pub mod orders;
pub mod print;
pub mod products;
pub mod reports;
pub mod vendors;

use chrono::NaiveDate;
use serde::Deserialize;

use crate::error::ApiError;

const DEFAULT_LIMIT: u32 = 50;
const MAX_LIMIT: u32 = 500;

/// `?q=yerba&limit=20`
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
    pub limit: Option<u32>,
}

impl SearchQuery {
    pub fn limit(&self) -> u32 {
        clamp_limit(self.limit)
    }

    /// Search text, `None` when blank.
    pub fn text(&self) -> Option<&str> {
        self.q.as_deref().map(str::trim).filter(|q| !q.is_empty())
    }
}

pub fn clamp_limit(limit: Option<u32>) -> u32 {
    limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
}

/// `?from=2024-03-01&to=2024-03-31`
#[derive(Debug, Deserialize)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    pub fn required(&self) -> Result<(NaiveDate, NaiveDate), ApiError> {
        match (self.from, self.to) {
            (Some(from), Some(to)) => Ok((from, to)),
            _ => Err(ApiError::BadRequest(
                "from and to are required (YYYY-MM-DD)".to_string(),
            )),
        }
    }
}
