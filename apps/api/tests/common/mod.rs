//! Shared harness for the HTTP tests: an in-memory database behind the
//! real router, driven with `oneshot`.

#![allow(dead_code)]

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::util::ServiceExt;

use gestor_api::{build_router, AppState, Settings};
use gestor_db::{Database, DbConfig};

pub const ADMIN_USER: &str = "admin";
pub const ADMIN_PASSWORD: &str = "superadmin-123";
pub const VENDOR_PASSWORD: &str = "vendedor-123";

/// Port 9 (discard) on loopback: nothing listens there in the test env.
pub const UNREACHABLE_HELPER: &str = "http://127.0.0.1:9/print";

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub bytes: Vec<u8>,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        if self.bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&self.bytes).expect("response body is not JSON")
        }
    }
}

pub fn test_settings() -> Settings {
    let mut settings = Settings::default();
    settings.printing.enabled = false;
    settings.auth.jwt_secret = "integration-test-secret-0123456789".to_string();
    settings
}

/// App with printing disabled.
pub async fn spawn_app() -> TestApp {
    spawn_app_with(test_settings()).await
}

/// App whose print helper never answers.
pub async fn spawn_app_with_dead_printer() -> TestApp {
    let mut settings = test_settings();
    settings.printing.enabled = true;
    settings.printing.helper_url = UNREACHABLE_HELPER.to_string();
    settings.printing.timeout_ms = 500;
    spawn_app_with(settings).await
}

pub async fn spawn_app_with(settings: Settings) -> TestApp {
    let db = Database::new(DbConfig::in_memory())
        .await
        .expect("in-memory database");
    let state = AppState::new(db, settings).expect("app state");
    TestApp {
        router: build_router(state.clone()),
        state,
    }
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body")
            .to_vec();
        TestResponse {
            status,
            headers,
            bytes,
        }
    }

    /// JSON request authenticated with a bearer token.
    pub async fn call(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request");
        self.send(request).await
    }

    pub async fn get(&self, uri: &str, token: &str) -> TestResponse {
        self.call(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> TestResponse {
        self.call(Method::POST, uri, Some(token), Some(body)).await
    }

    /// Creates the first superadmin and returns its token.
    pub async fn bootstrap_admin(&self) -> String {
        let response = self
            .call(
                Method::POST,
                "/api/auth/bootstrap",
                None,
                Some(json!({
                    "username": ADMIN_USER,
                    "password": ADMIN_PASSWORD,
                    "name": "Administrador",
                })),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED);
        token_of(&response)
    }

    pub async fn login(&self, username: &str, password: &str) -> TestResponse {
        self.call(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "username": username, "password": password })),
        )
        .await
    }

    /// Creates a vendor and returns `(user id, token)`.
    pub async fn create_vendor(
        &self,
        admin_token: &str,
        username: &str,
        role: &str,
        commission_bps: u32,
    ) -> (String, String) {
        let response = self
            .post(
                "/api/vendors",
                admin_token,
                json!({
                    "username": username,
                    "password": VENDOR_PASSWORD,
                    "name": format!("Vendedor {}", username),
                    "role": role,
                    "commissionBps": commission_bps,
                }),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.json());
        let id = response.json()["id"].as_str().expect("user id").to_string();

        let login = self.login(username, VENDOR_PASSWORD).await;
        assert_eq!(login.status, StatusCode::OK);
        (id, token_of(&login))
    }

    /// Product at $100,00 + 21% IVA.
    pub async fn create_product(&self, admin_token: &str, sku: &str, stock: i64) -> String {
        let response = self
            .post(
                "/api/products",
                admin_token,
                json!({
                    "sku": sku,
                    "name": format!("Producto {}", sku),
                    "priceCents": 10_000,
                    "currentStock": stock,
                }),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.json());
        response.json()["id"].as_str().expect("product id").to_string()
    }

    /// Responsable Inscripto client, so orders default to Factura A.
    pub async fn create_client(&self, token: &str) -> String {
        let response = self
            .post(
                "/api/clients",
                token,
                json!({
                    "name": "Distribuidora del Sur SA",
                    "taxId": "30-71234567-1",
                    "taxCondition": "RESPONSABLE_INSCRIPTO",
                }),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.json());
        response.json()["id"].as_str().expect("client id").to_string()
    }

    pub async fn stock_of(&self, token: &str, product_id: &str) -> i64 {
        let response = self.get(&format!("/api/products/{}", product_id), token).await;
        assert_eq!(response.status, StatusCode::OK);
        response.json()["currentStock"].as_i64().expect("stock")
    }
}

pub fn token_of(response: &TestResponse) -> String {
    response.json()["token"]
        .as_str()
        .expect("token in session response")
        .to_string()
}

pub fn order(client_id: &str, product_id: &str, quantity: i64) -> Value {
    json!({
        "clientId": client_id,
        "items": [{ "productId": product_id, "quantity": quantity }],
    })
}
