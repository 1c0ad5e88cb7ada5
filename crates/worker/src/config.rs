use std::time::Duration;

use hirely_db::DEFAULT_MAX_CONNECTIONS;
use hirely_lifecycle::LifecycleConfig;

/// Default seconds between auto-confirm sweeps.
pub const DEFAULT_INTERVAL_SECS: u64 = 900;

/// Worker configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub database_url: String,
    /// Pool size (default: `20`).
    pub max_connections: u32,
    /// Seconds between sweeps (default: `900`).
    pub interval_secs: u64,
    pub lifecycle: LifecycleConfig,
}

impl WorkerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                      | Default      |
    /// |------------------------------|--------------|
    /// | `DATABASE_URL`               | required     |
    /// | `DATABASE_MAX_CONNECTIONS`   | `20`         |
    /// | `AUTO_CONFIRM_INTERVAL_SECS` | `900`        |
    ///
    /// Lifecycle timings come from [`LifecycleConfig::from_env`].
    pub fn from_env() -> Self {
        let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

        let max_connections: u32 = std::env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| DEFAULT_MAX_CONNECTIONS.to_string())
            .parse()
            .expect("DATABASE_MAX_CONNECTIONS must be a valid u32");

        let interval_secs: u64 = std::env::var("AUTO_CONFIRM_INTERVAL_SECS")
            .unwrap_or_else(|_| DEFAULT_INTERVAL_SECS.to_string())
            .parse()
            .expect("AUTO_CONFIRM_INTERVAL_SECS must be a valid u64");
        assert!(interval_secs > 0, "AUTO_CONFIRM_INTERVAL_SECS must be positive");

        Self {
            database_url,
            max_connections,
            interval_secs,
            lifecycle: LifecycleConfig::from_env(),
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_converts_seconds() {
        let config = WorkerConfig {
            database_url: "postgres://localhost/hirely".into(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            interval_secs: DEFAULT_INTERVAL_SECS,
            lifecycle: LifecycleConfig::default(),
        };
        assert_eq!(config.interval(), Duration::from_secs(15 * 60));
    }
}
