//! HTTP API for the Stock Portfolio Monitor.
//!
//! Thin axum layer over the stores: bearer-token auth, per-email login
//! lockout, per-caller rate limiting, and a uniform JSON error envelope.

mod analytics_routes;
mod auth;
mod auth_routes;
mod error;
mod login_guard;
mod portfolio_routes;
mod rate_limit;
mod request_id;
mod search_routes;
mod watchlist_routes;

pub use auth::CurrentUser;
pub use error::AppError;
pub use login_guard::LoginGuard;
pub use rate_limit::RateLimiter;

use axum::{middleware, routing::get, Json, Router};
use portfolio_store::{
    PortfolioDb, PositionStore, PriceStore, SessionStore, SymbolStore, UserStore, WatchlistStore,
};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Success envelope for every API response body.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Shared application context, passed to every handler via axum state.
#[derive(Clone)]
pub struct AppState {
    pub db: PortfolioDb,
    pub users: UserStore,
    pub sessions: SessionStore,
    pub positions: PositionStore,
    pub prices: PriceStore,
    pub watchlist: WatchlistStore,
    pub symbols: SymbolStore,
    pub login_guard: Arc<LoginGuard>,
    pub rate_limiter: Arc<RateLimiter>,
    pub session_ttl_secs: i64,
}

impl AppState {
    pub fn new(
        db: PortfolioDb,
        login_guard: LoginGuard,
        rate_limiter: RateLimiter,
        session_ttl_secs: i64,
    ) -> Self {
        Self {
            users: UserStore::new(db.clone()),
            sessions: SessionStore::new(db.clone()),
            positions: PositionStore::new(db.clone()),
            prices: PriceStore::new(db.clone()),
            watchlist: WatchlistStore::new(db.clone()),
            symbols: SymbolStore::new(db.clone()),
            db,
            login_guard: Arc::new(login_guard),
            rate_limiter: Arc::new(rate_limiter),
            session_ttl_secs,
        }
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "stock-portfolio-monitor",
    }))
}

/// Assemble the full application router.
pub fn build_router(state: AppState) -> Router {
    let protected = Router::new()
        .merge(auth_routes::protected_routes())
        .merge(portfolio_routes::routes())
        .merge(watchlist_routes::routes())
        .merge(analytics_routes::routes())
        .merge(search_routes::routes())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::auth_middleware,
        ));

    Router::new()
        .route("/health", get(health))
        .merge(auth_routes::public_routes())
        .merge(protected)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit::rate_limit_middleware,
        ))
        .layer(middleware::from_fn(request_id::request_id_middleware))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

/// Start the server: load config from the environment, open the database,
/// spawn the maintenance task, and serve until shutdown.
pub async fn run_server() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:portfolio.db".to_string());
    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let session_ttl_secs: i64 = env_or("SESSION_TTL_SECS", 86_400);

    let db = PortfolioDb::new(&database_url).await?;
    tracing::info!("Database ready at {}", database_url);

    let state = AppState::new(
        db,
        LoginGuard::from_env(),
        RateLimiter::from_env(),
        session_ttl_secs,
    );

    spawn_maintenance_task(state.clone());

    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("Listening on {}", bind_addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

/// Hourly cleanup: expired sessions and stale guard/limiter entries.
fn spawn_maintenance_task(state: AppState) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(3600));
        loop {
            interval.tick().await;
            match state.sessions.purge_expired().await {
                Ok(purged) if purged > 0 => {
                    tracing::info!("Purged {} expired sessions", purged);
                }
                Ok(_) => {}
                Err(e) => tracing::warn!("Session purge failed: {}", e),
            }
            state.login_guard.cleanup();
            state.rate_limiter.cleanup();
        }
    });
}
