//! HTTP server bootstrap for Petfolio.
//!
//! This module wires together:
//! - configuration
//! - database connection pool and migrations
//! - core services (token codec, auth service, stores, listing caches)
//! - the Axum router

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use axum::http::{HeaderValue, Method};
use axum::routing::get;
use axum::Router;
use chrono::Duration;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use tower_http::cors::AllowOrigin;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

use crate::auth::{hash_password, AuthService, AuthState, TokenCodec};
use crate::domain::{Pet, UserRecord, ROLE_ADMIN, ROLE_USER};
use crate::infra::{
    CredentialStore, ListingCache, SqliteCredentialStore, SqlitePetStore, StoreError,
};

/// Server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite connection URL.
    pub database_url: String,
    /// Server listen address.
    pub listen_addr: SocketAddr,
    /// Maximum database connections.
    pub max_connections: u32,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite:petfolio.db?mode=rwc".to_string());

        let port: u16 = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);

        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());

        let listen_addr: SocketAddr = format!("{host}:{port}")
            .parse()
            .expect("Invalid listen address");

        let max_connections: u32 = std::env::var("MAX_DB_CONNECTIONS")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(10);

        Self {
            database_url,
            listen_addr,
            max_connections,
        }
    }
}

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService<SqliteCredentialStore>>,
    pub credentials: Arc<SqliteCredentialStore>,
    pub pets: Arc<SqlitePetStore>,
    pub pet_listings: Arc<ListingCache<Vec<Pet>>>,
    pub user_listings: Arc<ListingCache<Vec<UserRecord>>>,
    pub pool: SqlitePool,
}

/// Start the HTTP server.
pub async fn run() -> anyhow::Result<()> {
    init_tracing();

    info!("Starting Petfolio v{}", env!("CARGO_PKG_VERSION"));

    // Token configuration
    let secret = match std::env::var("JWT_SECRET") {
        Ok(s) if !s.trim().is_empty() => s,
        _ => anyhow::bail!("JWT_SECRET must be set to a non-empty HMAC secret"),
    };

    let ttl = std::env::var("TOKEN_TTL_SECS")
        .ok()
        .and_then(|v| v.parse::<i64>().ok())
        .filter(|v| *v > 0)
        .map(Duration::seconds)
        .unwrap_or_else(|| Duration::hours(1));
    let codec = Arc::new(TokenCodec::with_ttl(secret.as_bytes(), ttl));

    // Load configuration
    let config = Config::from_env();
    info!("Configuration loaded");
    info!("  Listen address: {}", config.listen_addr);
    info!("  Max connections: {}", config.max_connections);
    info!("  Token TTL: {}s", ttl.num_seconds());

    // Connect to SQLite
    info!("Connecting to database...");
    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await?;
    info!("Connected to database");

    let migrate_on_startup = std::env::var("DB_MIGRATE_ON_STARTUP")
        .ok()
        .map(|v| {
            !matches!(
                v.trim().to_ascii_lowercase().as_str(),
                "0" | "false" | "off"
            )
        })
        .unwrap_or(true);
    if migrate_on_startup {
        info!("Running database migrations...");
        crate::migrations::run(&pool).await?;
        info!("Database migrations applied");
    } else {
        info!("DB migrations skipped (DB_MIGRATE_ON_STARTUP=0)");
    }

    // Initialize services
    let credentials = Arc::new(SqliteCredentialStore::new(pool.clone()));
    let pets = Arc::new(SqlitePetStore::new(pool.clone()));
    let auth = Arc::new(AuthService::new(credentials.clone(), codec.clone()));

    // Roles and the default admin account
    let admin_password =
        std::env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "admin123".to_string());
    seed_initial_data(credentials.as_ref(), &admin_password).await?;

    // Create application state
    let state = AppState {
        auth,
        credentials,
        pets,
        pet_listings: Arc::new(ListingCache::new(256, StdDuration::from_secs(30))),
        user_listings: Arc::new(ListingCache::new(16, StdDuration::from_secs(30))),
        pool,
    };

    // Build router
    let app = build_router(AuthState { codec })?.with_state(state);

    // Start server
    info!("Starting HTTP server on {}", config.listen_addr);
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;

    info!("Petfolio is ready to accept connections");
    axum::serve(listener, app).await?;

    Ok(())
}

/// Ensure the role table and the default admin account exist.
///
/// The admin holds both roles, so it passes role-gated pet write routes as
/// well as admin-only listings.
pub async fn seed_initial_data(
    store: &SqliteCredentialStore,
    admin_password: &str,
) -> anyhow::Result<()> {
    store.ensure_role(ROLE_ADMIN).await?;
    store.ensure_role(ROLE_USER).await?;

    if store.find_by_username("admin").await?.is_none() {
        let password_hash =
            hash_password(admin_password).map_err(|e| anyhow::anyhow!(e.to_string()))?;
        match store.create_user("admin", &password_hash, ROLE_ADMIN).await {
            Ok(_) => {}
            // Another instance seeded it first
            Err(StoreError::Duplicate(_)) => return Ok(()),
            Err(e) => return Err(e.into()),
        }
        store.grant_role("admin", ROLE_USER).await?;
        info!("Seeded default admin account");
    }

    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(Level::INFO.to_string()));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();
}

/// Build the router with auth middleware, tracing, and optional CORS.
pub fn build_router(auth_state: AuthState) -> anyhow::Result<Router<AppState>> {
    let mut router = crate::api::router()
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .layer(axum::middleware::from_fn_with_state(
            auth_state,
            crate::auth::auth_middleware,
        ))
        .layer(TraceLayer::new_for_http());

    if let Some(cors_layer) = cors_layer_from_env()? {
        router = router.layer(cors_layer);
    }

    Ok(router)
}

fn cors_layer_from_env() -> anyhow::Result<Option<CorsLayer>> {
    let origins = match std::env::var("CORS_ALLOW_ORIGINS") {
        Ok(v) => v,
        Err(_) => return Ok(None),
    };

    let origins = origins.trim();
    if origins.is_empty() {
        return Ok(None);
    }

    let allow_origin = if origins == "*" {
        AllowOrigin::any()
    } else {
        let origins: Vec<HeaderValue> = origins
            .split(',')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse::<HeaderValue>()
                    .map_err(|e| anyhow::anyhow!("Invalid CORS origin {s:?}: {e}"))
            })
            .collect::<anyhow::Result<_>>()?;
        AllowOrigin::list(origins)
    };

    Ok(Some(
        CorsLayer::new()
            .allow_origin(allow_origin)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
            .allow_headers([
                axum::http::header::AUTHORIZATION,
                axum::http::header::CONTENT_TYPE,
            ]),
    ))
}

/// Health check endpoint.
async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "healthy",
        "service": "petfolio",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Readiness check endpoint.
async fn readiness_check(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> Result<axum::Json<serde_json::Value>, (axum::http::StatusCode, String)> {
    // Check database connectivity with a trivial query.
    match sqlx::query_scalar::<_, i64>("SELECT 1")
        .fetch_one(&state.pool)
        .await
    {
        Ok(_) => Ok(axum::Json(serde_json::json!({
            "status": "ready",
            "database": "connected",
        }))),
        Err(e) => Err((
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            format!("Database unavailable: {}", e),
        )),
    }
}
