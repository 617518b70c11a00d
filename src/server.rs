//! # Server Configuration
//!
//! Composition root and HTTP server setup for the dealcast service. All
//! clients and services are constructed here and dependency-injected; there
//! are no lazily-initialized globals.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    extract::Request,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use migration::{Migrator, MigratorTrait};
use sea_orm::DatabaseConnection;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::AppConfig;
use crate::crypto::TokenCipher;
use crate::db;
use crate::handlers;
use crate::repositories::{ConnectionRepository, DealRepository, PostLogRepository};
use crate::social::PostManager;
use crate::social::captions::CaptionGenerator;
use crate::social::platforms::AdapterRegistry;
use crate::social::token_refresh::TokenRefreshService;
use crate::telemetry::{self, TraceContext};

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub post_manager: Arc<PostManager>,
}

/// Creates and configures the Axum application router
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/healthz", get(handlers::healthz))
        .route(
            "/deals/{deal_id}/social-post",
            post(handlers::trigger_social_post),
        )
        .layer(middleware::from_fn(trace_context_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Run every request inside a trace context so errors carry a correlation
/// id. Honors an inbound `x-request-id` header when the caller set one.
async fn trace_context_middleware(request: Request, next: Next) -> Response {
    let trace_id = request
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    telemetry::with_trace_context(TraceContext { trace_id }, next.run(request)).await
}

/// Build the full service graph from configuration and start serving.
pub async fn run_server(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let db = Arc::new(db::init_pool(&config).await?);
    Migrator::up(db.as_ref(), None).await?;

    // Missing or malformed key is a fatal configuration error, surfaced
    // before the server binds.
    let cipher = Arc::new(TokenCipher::from_hex_key(
        config
            .token_crypto_key
            .as_deref()
            .ok_or("DEALCAST_TOKEN_CRYPTO_KEY is required")?,
    )?);

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.http_timeout_seconds))
        .build()?;

    let connections = Arc::new(ConnectionRepository::new(db.clone(), cipher));
    let deals = Arc::new(DealRepository::new(db.clone()));
    let post_log = Arc::new(PostLogRepository::new(db.clone()));

    let captions = Arc::new(CaptionGenerator::new(
        client.clone(),
        config.gemini_api_key.clone(),
        config.gemini_api_base.clone(),
    ));
    let token_refresh = Arc::new(TokenRefreshService::from_config(
        client.clone(),
        connections.clone(),
        &config,
    ));
    let adapters = Arc::new(AdapterRegistry::for_production(client, &config));

    let post_manager = Arc::new(PostManager::new(
        deals,
        connections,
        post_log,
        captions,
        token_refresh,
        adapters,
        config.app_url.clone(),
    ));

    let state = AppState { db, post_manager };
    let app = create_app(state);

    let addr = config
        .bind_addr()
        .map_err(|e| format!("Invalid server address: {}", e))?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(addr = %addr, profile = %config.profile, "Server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
