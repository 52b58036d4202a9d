use std::str::FromStr;

/// Server configuration loaded from environment variables.
///
/// All fields except `database_url` have defaults suitable for local
/// development. In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// How long shutdown waits for background tasks, in seconds (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// Postgres connection string (required).
    pub database_url: String,
    /// Pool size (default: `20`).
    pub database_max_connections: u32,
    /// Seconds to wait for a pooled connection (default: `30`).
    pub database_acquire_timeout_secs: u64,
    /// Seconds between scheduled-publication sweeps (default: `60`).
    pub scheduler_interval_secs: u64,
    /// Per-request webhook delivery timeout in seconds (default: `10`).
    pub webhook_timeout_secs: u64,
    /// Maximum concurrent webhook deliveries (default: `16`).
    pub webhook_max_concurrency: usize,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                         | Default                    |
    /// |---------------------------------|----------------------------|
    /// | `HOST`                          | `0.0.0.0`                  |
    /// | `PORT`                          | `3000`                     |
    /// | `CORS_ORIGINS`                  | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS`          | `30`                       |
    /// | `SHUTDOWN_TIMEOUT_SECS`         | `30`                       |
    /// | `DATABASE_URL`                  | required                   |
    /// | `DATABASE_MAX_CONNECTIONS`      | `20`                       |
    /// | `DATABASE_ACQUIRE_TIMEOUT_SECS` | `30`                       |
    /// | `SCHEDULER_INTERVAL_SECS`       | `60`                       |
    /// | `WEBHOOK_TIMEOUT_SECS`          | `10`                       |
    /// | `WEBHOOK_MAX_CONCURRENCY`       | `16`                       |
    ///
    /// Panics on a missing `DATABASE_URL` or an unparsable value; a
    /// misconfigured server should not start.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".into());

        let cors_origins: Vec<String> = lookup("CORS_ORIGINS")
            .unwrap_or_else(|| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let database_url = lookup("DATABASE_URL").expect("DATABASE_URL must be set");

        Self {
            host,
            port: parse_or(&lookup, "PORT", 3000),
            cors_origins,
            request_timeout_secs: parse_or(&lookup, "REQUEST_TIMEOUT_SECS", 30),
            shutdown_timeout_secs: parse_or(&lookup, "SHUTDOWN_TIMEOUT_SECS", 30),
            database_url,
            database_max_connections: parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 20),
            database_acquire_timeout_secs: parse_or(&lookup, "DATABASE_ACQUIRE_TIMEOUT_SECS", 30),
            scheduler_interval_secs: parse_or(&lookup, "SCHEDULER_INTERVAL_SECS", 60),
            webhook_timeout_secs: parse_or(&lookup, "WEBHOOK_TIMEOUT_SECS", 10),
            webhook_max_concurrency: parse_or(&lookup, "WEBHOOK_MAX_CONCURRENCY", 16),
        }
    }
}

fn parse_or<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, name: &str, default: T) -> T {
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .unwrap_or_else(|_| panic!("{name} must be a valid {}", std::any::type_name::<T>())),
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = ServerConfig::from_lookup(lookup(&[("DATABASE_URL", "postgres://db")]));
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.cors_origins, vec!["http://localhost:5173"]);
        assert_eq!(config.scheduler_interval_secs, 60);
        assert_eq!(config.webhook_timeout_secs, 10);
        assert_eq!(config.webhook_max_concurrency, 16);
        assert_eq!(config.database_max_connections, 20);
    }

    #[test]
    fn overrides_are_parsed() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://db"),
            ("PORT", "8080"),
            ("CORS_ORIGINS", "https://a.example, https://b.example,"),
            ("SCHEDULER_INTERVAL_SECS", "5"),
            ("WEBHOOK_MAX_CONCURRENCY", "4"),
        ]));
        assert_eq!(config.port, 8080);
        assert_eq!(
            config.cors_origins,
            vec!["https://a.example", "https://b.example"]
        );
        assert_eq!(config.scheduler_interval_secs, 5);
        assert_eq!(config.webhook_max_concurrency, 4);
    }

    #[test]
    #[should_panic(expected = "DATABASE_URL must be set")]
    fn database_url_is_required() {
        ServerConfig::from_lookup(lookup(&[]));
    }

    #[test]
    #[should_panic(expected = "PORT must be a valid")]
    fn invalid_number_panics() {
        ServerConfig::from_lookup(lookup(&[("DATABASE_URL", "x"), ("PORT", "eighty")]));
    }
}
