//! Simulated AFIP web service.
//!
//! Hands out a random 14-digit CAE valid for a configurable number of days
//! from the voucher's issue date. No WSAA login or WSFE call is made.

use chrono::Duration;
use rand::Rng;
use tracing::info;

use gestor_core::{AfipClient, AfipError, AuthorizationRequest, Authorization};

/// Length of a CAE.
pub const CAE_DIGITS: usize = 14;

#[derive(Debug, Clone)]
pub struct SimulatedAfip {
    validity_days: i64,
}

impl SimulatedAfip {
    pub fn new(validity_days: i64) -> Self {
        SimulatedAfip { validity_days }
    }
}

impl AfipClient for SimulatedAfip {
    fn authorize(&self, request: &AuthorizationRequest) -> Result<Authorization, AfipError> {
        if !request.voucher_type.is_fiscal() {
            return Err(AfipError::NotFiscal(request.voucher_type));
        }
        if request.total_cents < 0 {
            return Err(AfipError::Rejected("negative voucher total".to_string()));
        }

        let mut rng = rand::thread_rng();
        // First digit is never zero.
        let mut cae = String::with_capacity(CAE_DIGITS);
        cae.push(char::from(b'0' + rng.gen_range(1..=9u8)));
        for _ in 1..CAE_DIGITS {
            cae.push(char::from(b'0' + rng.gen_range(0..=9u8)));
        }

        let expires_on = request.issue_date + Duration::days(self.validity_days);

        info!(
            voucher_type = %request.voucher_type,
            point_of_sale = request.point_of_sale,
            sequence = request.sequence,
            cae = %cae,
            "Simulated CAE issued"
        );

        Ok(Authorization { cae, expires_on })
    }
}
