//! API configuration module.
//!
//! Configuration is layered with the `config` crate:
//!
//! ```text
//!  built-in defaults ──► gestor.toml (optional) ──► GESTOR__* env vars
//!                                                    e.g. GESTOR__SERVER__PORT=8080
//!                                                         GESTOR__AUTH__JWT_SECRET=...
//!                                                         GESTOR__SERVER__CORS_ORIGINS=a,b
//! ```

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use gestor_core::{TaxCondition, DEFAULT_POINT_OF_SALE};

/// Full server configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub auth: AuthSettings,
    pub company: CompanySettings,
    pub afip: AfipSettings,
    pub printing: PrintingSettings,
    pub pdf: PdfSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Browser origins allowed to call the API with the session cookie,
    /// e.g. `http://localhost:5173`. Empty means same-origin only.
    pub cors_origins: Vec<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        ServerSettings {
            host: "0.0.0.0".to_string(),
            port: 3000,
            cors_origins: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// SQLite file; `:memory:` for a throwaway database.
    pub path: String,
    pub max_connections: u32,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: "./gestor.db".to_string(),
            max_connections: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    /// HS256 signing secret. Must be overridden in production.
    pub jwt_secret: String,
    /// Token lifetime in seconds.
    pub token_lifetime_secs: i64,
    pub cookie_name: String,
    /// Sets the `Secure` attribute; enable behind HTTPS.
    pub cookie_secure: bool,
}

impl Default for AuthSettings {
    fn default() -> Self {
        AuthSettings {
            jwt_secret: "gestor-dev-secret-change-in-production".to_string(),
            token_lifetime_secs: 12 * 60 * 60,
            cookie_name: "token".to_string(),
            cookie_secure: false,
        }
    }
}

/// The issuing company, printed on every voucher.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompanySettings {
    pub name: String,
    pub cuit: String,
    pub address: String,
    pub tax_condition: TaxCondition,
    /// Used when neither the request nor the user's branch names one.
    pub point_of_sale: i64,
}

impl Default for CompanySettings {
    fn default() -> Self {
        CompanySettings {
            name: "Mi Empresa SRL".to_string(),
            cuit: "30712345671".to_string(),
            address: "Av. Siempre Viva 742, CABA".to_string(),
            tax_condition: TaxCondition::ResponsableInscripto,
            point_of_sale: DEFAULT_POINT_OF_SALE,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AfipSettings {
    /// Days a simulated CAE stays valid after the issue date.
    pub cae_validity_days: i64,
}

impl Default for AfipSettings {
    fn default() -> Self {
        AfipSettings {
            cae_validity_days: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PrintingSettings {
    pub enabled: bool,
    /// Endpoint of the local print helper.
    pub helper_url: String,
    pub timeout_ms: u64,
}

impl Default for PrintingSettings {
    fn default() -> Self {
        PrintingSettings {
            enabled: true,
            helper_url: "http://127.0.0.1:9100/print".to_string(),
            timeout_ms: 2_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfSettings {
    /// Line items per page before a continuation page starts.
    pub rows_per_page: usize,
}

impl Default for PdfSettings {
    fn default() -> Self {
        PdfSettings { rows_per_page: 20 }
    }
}

impl Settings {
    /// Loads `gestor.toml` (if present) and `GESTOR__` environment overrides.
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from("gestor")
    }

    /// Like [`Settings::load`] with a different file stem.
    pub fn load_from(file_stem: &str) -> Result<Self, config::ConfigError> {
        let settings: Settings = Config::builder()
            .add_source(File::with_name(file_stem).required(false))
            .add_source(
                Environment::with_prefix("GESTOR")
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("server.cors_origins")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), config::ConfigError> {
        if self.auth.jwt_secret.len() < 16 {
            return Err(config::ConfigError::Message(
                "auth.jwt_secret must be at least 16 characters".to_string(),
            ));
        }
        if !(1..=crate::pdf::MAX_ROWS_PER_PAGE).contains(&self.pdf.rows_per_page) {
            return Err(config::ConfigError::Message(format!(
                "pdf.rows_per_page must be between 1 and {}",
                crate::pdf::MAX_ROWS_PER_PAGE
            )));
        }
        for origin in &self.server.cors_origins {
            if origin == "*" || axum::http::HeaderValue::from_str(origin).is_err() {
                return Err(config::ConfigError::Message(format!(
                    "server.cors_origins: '{}' is not an allowed origin",
                    origin
                )));
            }
        }
        if self.afip.cae_validity_days < 1 {
            return Err(config::ConfigError::Message(
                "afip.cae_validity_days must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.bind_address(), "0.0.0.0:3000");
        assert_eq!(settings.pdf.rows_per_page, 20);
        assert_eq!(settings.afip.cae_validity_days, 10);
        assert_eq!(settings.auth.cookie_name, "token");
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let settings = Settings::load_from("does-not-exist-gestor").unwrap();
        assert_eq!(settings.company.point_of_sale, DEFAULT_POINT_OF_SALE);
    }

    #[test]
    fn test_rejects_short_secret() {
        let mut settings = Settings::default();
        settings.auth.jwt_secret = "short".to_string();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_wildcard_cors_origin_is_rejected() {
        let mut settings = Settings::default();
        settings.server.cors_origins = vec!["http://localhost:5173".into()];
        assert!(settings.validate().is_ok());

        settings.server.cors_origins.push("*".into());
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_rows_per_page_must_fit_the_page() {
        let mut settings = Settings::default();
        for rows in [0, crate::pdf::MAX_ROWS_PER_PAGE + 1, 60] {
            settings.pdf.rows_per_page = rows;
            assert!(settings.validate().is_err(), "{rows}");
        }
        settings.pdf.rows_per_page = crate::pdf::MAX_ROWS_PER_PAGE;
        assert!(settings.validate().is_ok());
    }
}
