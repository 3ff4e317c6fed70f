use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

use shopdesk::auth::TokenGenerator;
use shopdesk::config::{InvoiceConfig, ServerConfig};
use shopdesk::server::{AppState, create_router};
use shopdesk::store::{SqliteStore, Store};
use shopdesk::types::Role;

pub const ADMIN_PASSWORD: &str = "admin-password";
pub const STAFF_PASSWORD: &str = "staff-password";

const BODY_LIMIT: usize = 16 * 1024 * 1024;

/// The full router wired to a throwaway database, driven in-process.
pub struct TestApp {
    pub temp_dir: TempDir,
    pub store: Arc<SqliteStore>,
    router: Router,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub content_disposition: Option<String>,
    pub body: Vec<u8>,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("response is not JSON")
    }

    pub fn data(&self) -> Value {
        self.json()["data"].clone()
    }

    pub fn error(&self) -> String {
        self.json()["error"].as_str().unwrap_or_default().to_string()
    }
}

impl TestApp {
    /// Fonts point at an empty directory, so invoice rendering reports 503.
    pub fn start() -> Self {
        Self::build(None)
    }

    /// Invoices render with the DejaVu Sans Mono fixture fonts.
    pub fn start_with_fonts() -> Self {
        Self::build(Some(
            Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/fonts"),
        ))
    }

    fn build(fixture_fonts: Option<PathBuf>) -> Self {
        let temp_dir = TempDir::new().expect("create temp dir");
        let data_dir = temp_dir.path();

        let store = SqliteStore::new(data_dir.join("shopdesk.db")).expect("open store");
        store.initialize().expect("initialize store");

        let generator = TokenGenerator::new();
        store
            .create_account(
                "admin",
                &generator.hash(ADMIN_PASSWORD).unwrap(),
                Role::Admin,
            )
            .unwrap();
        store
            .create_account(
                "clerk",
                &generator.hash(STAFF_PASSWORD).unwrap(),
                Role::Staff,
            )
            .unwrap();

        let invoice = match fixture_fonts {
            Some(fonts_dir) => InvoiceConfig {
                fonts_dir,
                font_family: "DejaVuSansMono".to_string(),
                ..InvoiceConfig::default()
            },
            None => {
                let fonts_dir = data_dir.join("fonts");
                std::fs::create_dir_all(&fonts_dir).unwrap();
                InvoiceConfig {
                    fonts_dir,
                    ..InvoiceConfig::default()
                }
            }
        };
        let config = ServerConfig {
            data_dir: data_dir.to_path_buf(),
            invoice,
            ..ServerConfig::default()
        };

        let store = Arc::new(store);
        let state = Arc::new(AppState::new(store.clone(), config));

        Self {
            router: create_router(state),
            store,
            temp_dir,
        }
    }

    pub fn data_dir(&self) -> &Path {
        self.temp_dir.path()
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");

        let status = response.status();
        let header_value = |name: header::HeaderName| {
            response
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        let content_type = header_value(header::CONTENT_TYPE);
        let content_disposition = header_value(header::CONTENT_DISPOSITION);
        let body = to_bytes(response.into_body(), BODY_LIMIT)
            .await
            .expect("read body")
            .to_vec();

        TestResponse {
            status,
            content_type,
            content_disposition,
            body,
        }
    }

    fn builder(method: &str, path: &str, token: Option<&str>) -> axum::http::request::Builder {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> TestResponse {
        self.send(Self::builder("GET", path, token).body(Body::empty()).unwrap())
            .await
    }

    pub async fn post_json(&self, path: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.send(
            Self::builder("POST", path, token)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    pub async fn post_bytes(&self, path: &str, token: Option<&str>, body: Vec<u8>) -> TestResponse {
        self.send(
            Self::builder("POST", path, token)
                .header(header::CONTENT_TYPE, "text/csv")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
    }

    pub async fn delete(&self, path: &str, token: Option<&str>) -> TestResponse {
        self.send(Self::builder("DELETE", path, token).body(Body::empty()).unwrap())
            .await
    }

    pub async fn login(&self, username: &str, password: &str) -> String {
        let resp = self
            .post_json(
                "/api/v1/auth/login",
                None,
                json!({ "username": username, "password": password }),
            )
            .await;
        assert_eq!(resp.status, StatusCode::OK, "login failed: {}", resp.error());
        resp.data()["token"]
            .as_str()
            .expect("token in login response")
            .to_string()
    }

    pub async fn admin_token(&self) -> String {
        self.login("admin", ADMIN_PASSWORD).await
    }

    pub async fn staff_token(&self) -> String {
        self.login("clerk", STAFF_PASSWORD).await
    }

    pub async fn create_company(&self, token: &str, name: &str) -> i64 {
        let resp = self
            .post_json("/api/v1/companies", Some(token), json!({ "name": name }))
            .await;
        assert_eq!(resp.status, StatusCode::CREATED);
        resp.data()["id"].as_i64().expect("company id")
    }

    /// Stored lots, as returned by `GET /stock`.
    pub async fn stock(&self, token: &str) -> Vec<Value> {
        let resp = self.get("/api/v1/stock", Some(token)).await;
        assert_eq!(resp.status, StatusCode::OK);
        resp.data().as_array().cloned().unwrap_or_default()
    }

    pub fn actions(&self) -> Vec<String> {
        self.store
            .list_logs(1000)
            .unwrap()
            .into_iter()
            .map(|e| e.action)
            .collect()
    }
}
