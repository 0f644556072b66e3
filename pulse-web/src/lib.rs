//! pulse-web library - SessionPulse feedback collection & analytics service
//!
//! Serves the public submission form API, the admin management/analytics API,
//! live row-change events over SSE, and the AI-report proxy.

use std::sync::Arc;

use axum::{middleware, Router};
use pulse_common::config::ServiceConfig;
use sqlx::SqlitePool;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod analytics;
pub mod api;
pub mod db;
pub mod error;
pub mod export;
pub mod services;
pub mod sse;
pub mod store;

pub use api::auth::AdminTokens;
pub use sse::SseBroadcaster;
pub use store::ReadModel;

/// Events buffered by the SSE broadcaster
const SSE_CAPACITY: usize = 100;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Resolved service configuration
    pub config: Arc<ServiceConfig>,
    /// SSE event broadcaster
    pub broadcaster: SseBroadcaster,
    /// In-memory read model of sessions/responses
    pub read_model: ReadModel,
    /// Issued admin bearer tokens
    pub tokens: AdminTokens,
}

impl AppState {
    /// Create new application state
    pub fn new(db: SqlitePool, config: ServiceConfig) -> Self {
        Self {
            db,
            config: Arc::new(config),
            broadcaster: SseBroadcaster::new(SSE_CAPACITY),
            read_model: ReadModel::new(),
            tokens: AdminTokens::new(),
        }
    }
}

/// Build application router
///
/// Public routes: health, the share-token form endpoints, and admin login.
/// Everything else requires a valid admin bearer token.
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, post};

    let admin = Router::new()
        .route("/api/sessions", get(api::sessions::list).post(api::sessions::create))
        .route(
            "/api/sessions/:id",
            get(api::sessions::get)
                .put(api::sessions::update)
                .delete(api::sessions::delete),
        )
        .route("/api/responses", get(api::responses::list))
        .route("/api/responses/recent", get(api::responses::recent))
        .route("/api/sessions/:id/export.csv", get(api::export::csv))
        .route("/api/sessions/:id/export.json", get(api::export::json))
        .route("/api/analytics/overview", get(api::analytics::overview))
        .route("/api/analytics/sessions/:id", get(api::analytics::session))
        .route("/api/events", get(api::sse::event_stream))
        .route("/api/ai/report", post(api::ai::report))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::auth::require_admin,
        ));

    let public = Router::new()
        .route(
            "/api/feedback/:share_token",
            get(api::feedback::get_form).post(api::feedback::submit),
        )
        .route("/api/admin/login", post(api::auth::login))
        .merge(api::health::health_routes());

    Router::new()
        .merge(admin)
        .merge(public)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
