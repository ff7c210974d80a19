use std::env;

/// Runtime configuration read from the environment (and `.env` via dotenv).
#[derive(Debug, Clone)]
pub struct Config {
    /// Postgres connection string
    pub database_url: String,

    /// Upper bound for the connection pool
    pub database_max_connections: u32,

    /// Interface to bind the HTTP server on
    pub server_host: String,

    /// Port to bind the HTTP server on
    pub server_port: u16,

    /// HS256 secret shared with the auth provider that issues tokens
    pub jwt_secret: String,

    /// Days past the expected payment date after which an unpaid
    /// receivable is reported as long overdue
    pub overdue_threshold_days: i64,
}

pub const DEFAULT_OVERDUE_THRESHOLD_DAYS: i64 = 90;

impl Config {
    /// Builds the configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or a numeric
    /// variable cannot be parsed.
    pub fn from_env() -> Result<Self, anyhow::Error> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .ok_or_else(|| anyhow::anyhow!("DATABASE_URL must be set"))?;

        let jwt_secret = lookup("JWT_SECRET")
            .ok_or_else(|| anyhow::anyhow!("JWT_SECRET must be set"))?;

        let database_max_connections = parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 10u32)?;
        let server_host = lookup("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let server_port = parse_or(&lookup, "SERVER_PORT", 3000u16)?;
        let overdue_threshold_days = parse_or(
            &lookup,
            "RECEIVABLE_OVERDUE_DAYS",
            DEFAULT_OVERDUE_THRESHOLD_DAYS,
        )?;

        if overdue_threshold_days < 0 {
            return Err(anyhow::anyhow!("RECEIVABLE_OVERDUE_DAYS must not be negative"));
        }

        Ok(Self {
            database_url,
            database_max_connections,
            server_host,
            server_port,
            jwt_secret,
            overdue_threshold_days,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, anyhow::Error>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| anyhow::anyhow!("Invalid {}: {}", key, raw)),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_applied() {
        let config = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/erp"),
            ("JWT_SECRET", "s3cret"),
        ]))
        .unwrap();

        assert_eq!(config.server_host, "0.0.0.0");
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.database_max_connections, 10);
        assert_eq!(config.overdue_threshold_days, DEFAULT_OVERDUE_THRESHOLD_DAYS);
        assert_eq!(config.bind_address(), "0.0.0.0:3000");
    }

    #[test]
    fn test_missing_database_url_is_error() {
        let result = Config::from_lookup(lookup_from(&[("JWT_SECRET", "s3cret")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_port_is_error() {
        let result = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/erp"),
            ("JWT_SECRET", "s3cret"),
            ("SERVER_PORT", "not-a-port"),
        ]));
        assert!(result.is_err());
    }

    #[test]
    fn test_overdue_threshold_override() {
        let config = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/erp"),
            ("JWT_SECRET", "s3cret"),
            ("RECEIVABLE_OVERDUE_DAYS", "180"),
        ]))
        .unwrap();
        assert_eq!(config.overdue_threshold_days, 180);
    }
}
