use std::sync::Arc;
use std::time::Instant;

use axum::extract::Request;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::{
    Router,
    routing::{delete, get, post},
};

use super::{admin, companies, invoices, reports, sessions, stock};
use crate::auth::TokenGenerator;
use crate::config::ServerConfig;
use crate::store::Store;

pub struct AppState {
    pub store: Arc<dyn Store>,
    pub tokens: TokenGenerator,
    pub config: ServerConfig,
}

impl AppState {
    #[must_use]
    pub fn new(store: Arc<dyn Store>, config: ServerConfig) -> Self {
        Self {
            store,
            tokens: TokenGenerator::new(),
            config,
        }
    }
}

async fn health() -> &'static str {
    "OK"
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let response = next.run(request).await;

    tracing::info!(
        "{} {} {} {}ms",
        method,
        uri.path(),
        response.status().as_u16(),
        start.elapsed().as_millis()
    );

    response
}

fn api_router() -> Router<Arc<AppState>> {
    Router::new()
        // Session routes
        .route("/auth/login", post(sessions::login))
        .route("/auth/logout", post(sessions::logout))
        .route("/auth/me", get(sessions::me))
        // Company master
        .route("/companies", get(companies::list_companies))
        .route("/companies", post(companies::create_company))
        .route("/companies/{id}", delete(companies::delete_company))
        // Stock
        .route("/stock", get(stock::list_stock))
        .route("/stock", post(stock::submit_lot))
        .route("/stock/import", post(stock::import_stock))
        .route("/stock/{id}/image", get(stock::get_image))
        // Reports and documents
        .route("/dashboard", get(reports::dashboard))
        .route("/catalog", get(reports::catalog))
        .route("/invoices", post(invoices::create_invoice))
        // Admin only
        .route("/logs", get(admin::list_logs))
        .route("/admin/repair", post(admin::repair))
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", api_router())
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}
