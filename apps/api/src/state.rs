//! Shared application state.

use std::sync::Arc;

use chrono::{Local, NaiveDate};

use crate::afip::SimulatedAfip;
use crate::auth::JwtManager;
use crate::config::Settings;
use crate::printing::PrintClient;
use gestor_core::AfipClient;
use gestor_db::Database;

/// Cloned into every handler; everything inside is reference counted.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub settings: Arc<Settings>,
    pub jwt: Arc<JwtManager>,
    pub afip: Arc<dyn AfipClient>,
    pub printer: PrintClient,
}

impl AppState {
    /// Builds the state with the simulated AFIP client.
    pub fn new(db: Database, settings: Settings) -> Result<Self, reqwest::Error> {
        let afip = Arc::new(SimulatedAfip::new(settings.afip.cae_validity_days));
        Self::with_afip(db, settings, afip)
    }

    pub fn with_afip(
        db: Database,
        settings: Settings,
        afip: Arc<dyn AfipClient>,
    ) -> Result<Self, reqwest::Error> {
        let jwt = JwtManager::new(&settings.auth.jwt_secret, settings.auth.token_lifetime_secs);
        let printer = PrintClient::new(settings.printing.clone())?;
        Ok(AppState {
            db,
            settings: Arc::new(settings),
            jwt: Arc::new(jwt),
            afip,
            printer,
        })
    }

    /// Issue date for vouchers created now.
    pub fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}
