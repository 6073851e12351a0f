//! Database connection pool management.

use std::time::{Duration, Instant};

use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::{debug, info, warn};

use portal_core::{defaults, Error, Result};

/// Default maximum number of connections in the pool.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;

/// Default connection timeout in seconds.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default idle timeout in seconds.
pub const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 600;

/// Pool configuration options.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Maximum number of connections in the pool.
    pub max_connections: u32,
    /// Minimum number of connections to maintain.
    pub min_connections: u32,
    /// Connection timeout duration.
    pub connect_timeout: Duration,
    /// Idle connection timeout duration.
    pub idle_timeout: Duration,
    /// Attempts made before giving up on the initial connection.
    pub connect_attempts: u32,
    /// Pause between initial connection attempts.
    pub connect_backoff: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: DEFAULT_MAX_CONNECTIONS,
            min_connections: 1,
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            idle_timeout: Duration::from_secs(DEFAULT_IDLE_TIMEOUT_SECS),
            connect_attempts: defaults::DB_CONNECT_ATTEMPTS,
            connect_backoff: Duration::from_millis(defaults::DB_CONNECT_BACKOFF_MS),
        }
    }
}

impl PoolConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_connections(mut self, n: u32) -> Self {
        self.max_connections = n;
        self
    }

    pub fn min_connections(mut self, n: u32) -> Self {
        self.min_connections = n;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the number of initial connection attempts (clamped to 1..=3).
    pub fn connect_attempts(mut self, attempts: u32) -> Self {
        self.connect_attempts = attempts.clamp(1, 3);
        self
    }

    pub fn connect_backoff(mut self, backoff: Duration) -> Self {
        self.connect_backoff = backoff;
        self
    }
}

/// Create a new PostgreSQL connection pool with default configuration.
pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    create_pool_with_config(database_url, PoolConfig::default()).await
}

/// Create a new PostgreSQL connection pool, retrying the initial connection
/// up to `config.connect_attempts` times.
pub async fn create_pool_with_config(database_url: &str, config: PoolConfig) -> Result<PgPool> {
    let start = Instant::now();
    let attempts = config.connect_attempts.max(1);

    info!(
        subsystem = "database",
        component = "pool",
        op = "create",
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        connect_timeout_secs = config.connect_timeout.as_secs(),
        attempts,
        "Creating database connection pool"
    );

    let mut attempt = 1;
    let pool = loop {
        let options = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.connect_timeout)
            .idle_timeout(config.idle_timeout);

        match options.connect(database_url).await {
            Ok(pool) => break pool,
            Err(e) if attempt < attempts => {
                warn!(
                    subsystem = "database",
                    component = "pool",
                    attempt,
                    attempts,
                    error = %e,
                    "Database connection failed, retrying"
                );
                tokio::time::sleep(config.connect_backoff).await;
                attempt += 1;
            }
            Err(e) => return Err(Error::Database(e)),
        }
    };

    info!(
        subsystem = "database",
        component = "pool",
        op = "established",
        pool_size = pool.size(),
        pool_idle = pool.num_idle(),
        attempt,
        duration_ms = start.elapsed().as_millis() as u64,
        "Database connection pool established"
    );
    Ok(pool)
}

/// Log current pool health metrics.
pub fn log_pool_metrics(pool: &PgPool) {
    let size = pool.size();
    let idle = pool.num_idle();

    debug!(
        subsystem = "database",
        component = "pool",
        op = "metrics",
        pool_size = size,
        pool_idle = idle,
        "Pool health check"
    );

    if idle == 0 && size > 0 {
        warn!(
            subsystem = "database",
            component = "pool",
            pool_size = size,
            "Connection pool has no idle connections"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PoolConfig::default();
        assert_eq!(config.max_connections, DEFAULT_MAX_CONNECTIONS);
        assert_eq!(config.connect_attempts, 3);
    }

    #[test]
    fn test_pool_config_builder() {
        let config = PoolConfig::new()
            .max_connections(20)
            .min_connections(5)
            .connect_timeout(Duration::from_secs(60))
            .connect_backoff(Duration::from_millis(10));

        assert_eq!(config.max_connections, 20);
        assert_eq!(config.min_connections, 5);
        assert_eq!(config.connect_timeout, Duration::from_secs(60));
        assert_eq!(config.connect_backoff, Duration::from_millis(10));
    }

    #[test]
    fn test_connect_attempts_clamped() {
        assert_eq!(PoolConfig::new().connect_attempts(0).connect_attempts, 1);
        assert_eq!(PoolConfig::new().connect_attempts(10).connect_attempts, 3);
        assert_eq!(PoolConfig::new().connect_attempts(2).connect_attempts, 2);
    }

    #[tokio::test]
    async fn test_unreachable_database_gives_up_after_attempts() {
        let config = PoolConfig::new()
            .connect_attempts(2)
            .connect_timeout(Duration::from_millis(200))
            .connect_backoff(Duration::from_millis(1));
        let result = create_pool_with_config("postgres://nobody@127.0.0.1:1/none", config).await;
        assert!(matches!(result, Err(Error::Database(_))));
    }
}
