//! Study portal HTTP server.

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use portal_api::{build_rate_limiter, build_router, ApiKeyAccessControl, AppState, ServerConfig};
use portal_clients::{FirebaseIdentityClient, FormRelayClient};
use portal_db::{log_pool_metrics, Database, FilesystemBackend, PgNoteRecordRepository, PoolConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with configurable output
    //
    // Environment variables:
    //   LOG_FORMAT  - "json" or "text" (default: "text")
    //   LOG_FILE    - path to log file (optional, enables file logging)
    //   LOG_ANSI    - "true"/"false" override ANSI colors (auto-detected by default)
    //   RUST_LOG    - standard env filter (default: "portal_api=debug,tower_http=debug")
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let log_file = std::env::var("LOG_FILE").ok();
    let log_ansi = std::env::var("LOG_ANSI")
        .ok()
        .map(|v| v == "true" || v == "1");

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "portal_api=debug,portal_db=info,tower_http=debug".into());

    let registry = tracing_subscriber::registry().with(env_filter);

    let _file_guard = if let Some(ref path) = log_file {
        let file_dir = std::path::Path::new(path)
            .parent()
            .unwrap_or(std::path::Path::new("."));
        let file_name = std::path::Path::new(path)
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or("portal-api.log");
        let file_appender = tracing_appender::rolling::daily(file_dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        if log_format == "json" {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(non_blocking),
                )
                .init();
        } else {
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(log_ansi.unwrap_or(false));
            registry.with(layer).init();
        }
        Some(guard)
    } else {
        if log_format == "json" {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        } else {
            let mut layer = tracing_subscriber::fmt::layer();
            if let Some(ansi) = log_ansi {
                layer = layer.with_ansi(ansi);
            }
            registry.with(layer).init();
        }
        None
    };

    info!(
        log_format = %log_format,
        log_file = log_file.as_deref().unwrap_or("(stdout)"),
        "Logging initialized"
    );

    let config = ServerConfig::from_env()?;

    // Database
    let db = Database::connect_with_config(
        &config.database_url,
        PoolConfig::new().connect_attempts(config.db_connect_attempts),
    )
    .await?;
    db.migrate().await?;
    info!("Database migrations applied");
    log_pool_metrics(db.pool());

    // Object store
    let storage = FilesystemBackend::new(
        config.file_storage_path.clone(),
        config.public_file_base_url.clone(),
    );
    storage
        .validate()
        .await
        .map_err(|e| anyhow::anyhow!("File storage unusable: {}", e))?;
    info!(path = %config.file_storage_path, "File storage ready");

    // Reviewer access
    let access = ApiKeyAccessControl::new(config.reviewer_key_digests.iter().cloned());
    if !access.is_configured() {
        warn!("REVIEWER_API_KEYS is empty; the review queue will refuse every request");
    }

    let mut state = AppState::new(
        Arc::new(PgNoteRecordRepository::new(db.pool.clone())),
        Arc::new(storage),
        Arc::new(access),
        config.submission_limits(),
    );

    match FirebaseIdentityClient::from_env()? {
        Some(client) => state = state.with_identity(Arc::new(client)),
        None => info!("IDENTITY_API_KEY not set; auth endpoints disabled"),
    }
    match FormRelayClient::from_env()? {
        Some(client) => state = state.with_relay(client),
        None => info!("RELAY_URL not set; relay endpoint disabled"),
    }

    if config.rate_limit_enabled {
        info!(
            requests = config.rate_limit_requests,
            period_secs = config.rate_limit_period_secs,
            "Rate limiting enabled"
        );
        state = state.with_rate_limiter(build_rate_limiter(
            config.rate_limit_requests,
            config.rate_limit_period_secs,
        ));
    }

    let app = build_router(state, &config);

    // Start server
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
