//! Router assembly and server startup.

use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post, put};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::{ServerSettings, Settings};
use crate::handlers::{
    afip, auth, branches, cash_closures, clients, health, invoices, orders, print, products,
    reports, vendors,
};
use crate::state::AppState;
use gestor_db::{Database, DbConfig};

/// Builds the full router. Role checks live in the handlers.
pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        // Auth
        .route("/auth/bootstrap", post(auth::bootstrap))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me))
        // Catalog
        .route("/clients", get(clients::list).post(clients::create))
        .route(
            "/clients/:id",
            get(clients::get).put(clients::update).delete(clients::delete),
        )
        .route("/products", get(products::list).post(products::create))
        .route(
            "/products/:id",
            get(products::get).put(products::update).delete(products::delete),
        )
        .route("/products/:id/stock", post(products::adjust_stock))
        .route("/vendors", get(vendors::list).post(vendors::create))
        .route("/vendors/:id", put(vendors::update).delete(vendors::delete))
        .route("/branches", get(branches::list).post(branches::create))
        .route("/branches/:id", put(branches::update))
        // Invoicing
        .route("/invoices", get(invoices::list).post(invoices::create))
        .route("/invoices/:id", get(invoices::get))
        .route("/invoices/:id/payments", post(invoices::add_payment))
        .route("/invoices/:id/credit-note", post(invoices::credit_note))
        .route("/invoices/:id/pdf", get(invoices::pdf))
        .route("/invoices/:id/print", post(invoices::print))
        .route("/orders", post(orders::create))
        .route("/orders/sync", post(orders::sync))
        // Cash & reports
        .route("/cash-closures", get(cash_closures::list).post(cash_closures::close))
        .route("/cash-closures/preview", get(cash_closures::preview))
        .route("/reports/commissions", get(reports::commissions))
        .route("/reports/payment-methods", get(reports::payment_methods))
        .route("/reports/products", get(reports::products))
        // AFIP
        .route(
            "/afip/certificates",
            get(afip::list_certificates).post(afip::create_certificate),
        )
        .route("/afip/certificates/:id", axum::routing::delete(afip::delete_certificate))
        .route("/afip/certificates/:id/activate", post(afip::activate_certificate))
        .route("/afip/authorize", post(afip::authorize))
        // Printing
        .route("/print/pending", get(print::pending))
        .route("/print/pending/:id/done", post(print::mark_done));

    let cors = cors_layer(&state.settings.server);

    Router::new()
        .route("/health", get(health::health))
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Credentialed CORS for the configured origins only.
fn cors_layer(server: &ServerSettings) -> CorsLayer {
    let origins: Vec<HeaderValue> = server
        .cors_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

/// Opens the database, builds the state and serves until shutdown.
pub async fn run(settings: Settings) -> anyhow::Result<()> {
    let db = Database::new(
        DbConfig::new(&settings.database.path).max_connections(settings.database.max_connections),
    )
    .await?;
    let (total, applied) = db.migration_status().await?;
    info!(applied, total, path = %settings.database.path, "Database ready");

    let address = settings.bind_address();
    let state = AppState::new(db.clone(), settings)?;
    let app = build_router(state);

    let listener = TcpListener::bind(&address).await?;
    info!(%address, "Gestor API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown...");
}
