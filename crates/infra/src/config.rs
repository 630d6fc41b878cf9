//! Configuration loading and representation.
//!
//! Values come from the process environment, optionally seeded from a `.env`
//! file. Every variable has a development default except `DATABASE_URL`,
//! which is required once persistent stores are enabled.

use std::net::SocketAddr;

use chrono::Duration;

/// Development-only signing secret used when `SESSION_SECRET` is unset.
const INSECURE_DEV_SECRET: &str = "lostfound-dev-secret-change-me";

/// Upper bound for `SESSION_TTL_MINUTES`: one year.
const MAX_SESSION_TTL_MINUTES: i64 = 366 * 24 * 60;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },

    #[error("DATABASE_URL must be set when USE_PERSISTENT_STORES=true")]
    MissingDatabaseUrl,
}

#[derive(Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub session_secret: String,
    pub session_ttl: Duration,
    pub bcrypt_cost: u32,
    pub use_persistent_stores: bool,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
}

// Secrets stay out of logs.
impl core::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AppConfig")
            .field("bind_addr", &self.bind_addr)
            .field("session_secret", &"<redacted>")
            .field("session_ttl", &self.session_ttl)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .field("use_persistent_stores", &self.use_persistent_stores)
            .field("database_url", &self.database_url.as_ref().map(|_| "<redacted>"))
            .field("database_max_connections", &self.database_max_connections)
            .finish()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            session_secret: INSECURE_DEV_SECRET.to_string(),
            session_ttl: Duration::hours(12),
            bcrypt_cost: lostfound_auth::BcryptHasher::DEFAULT_COST,
            use_persistent_stores: false,
            database_url: None,
            database_max_connections: 5,
        }
    }
}

impl AppConfig {
    /// Load `.env` (if present) and read the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(path) => tracing::debug!(path = %path.display(), "loaded .env"),
            Err(e) if e.not_found() => {}
            Err(e) => tracing::warn!(error = %e, "failed to load .env"),
        }
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build a config from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |var: &str| lookup(var).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bind_addr = match get("BIND_ADDR") {
            Some(raw) => raw.parse().map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
                var: "BIND_ADDR",
                reason: e.to_string(),
            })?,
            None => defaults.bind_addr,
        };

        let session_secret = match get("SESSION_SECRET") {
            Some(secret) => secret,
            None => {
                tracing::warn!("SESSION_SECRET not set; using an insecure development secret");
                defaults.session_secret
            }
        };

        let session_ttl = match get("SESSION_TTL_MINUTES") {
            Some(raw) => match raw.parse::<i64>() {
                Ok(minutes) if (1..=MAX_SESSION_TTL_MINUTES).contains(&minutes) => Duration::minutes(minutes),
                _ => {
                    return Err(ConfigError::Invalid {
                        var: "SESSION_TTL_MINUTES",
                        reason: format!("expected an integer from 1 to {MAX_SESSION_TTL_MINUTES}, got {raw:?}"),
                    });
                }
            },
            None => defaults.session_ttl,
        };

        let bcrypt_cost = match get("BCRYPT_COST") {
            Some(raw) => raw.parse::<u32>().map_err(|e| ConfigError::Invalid {
                var: "BCRYPT_COST",
                reason: e.to_string(),
            })?,
            None => defaults.bcrypt_cost,
        };

        let use_persistent_stores = get("USE_PERSISTENT_STORES")
            .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
            .unwrap_or(false);

        let database_url = get("DATABASE_URL");
        if use_persistent_stores && database_url.is_none() {
            return Err(ConfigError::MissingDatabaseUrl);
        }

        let database_max_connections = match get("DATABASE_MAX_CONNECTIONS") {
            Some(raw) => match raw.parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::Invalid {
                        var: "DATABASE_MAX_CONNECTIONS",
                        reason: format!("expected a positive integer, got {raw:?}"),
                    });
                }
            },
            None => defaults.database_max_connections,
        };

        Ok(Self {
            bind_addr,
            session_secret,
            session_ttl,
            bcrypt_cost,
            use_persistent_stores,
            database_url,
            database_max_connections,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn empty_environment_yields_defaults() {
        let cfg = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(cfg, AppConfig::default());
    }

    #[test]
    fn reads_every_variable() {
        let cfg = AppConfig::from_lookup(lookup(&[
            ("BIND_ADDR", "127.0.0.1:3000"),
            ("SESSION_SECRET", "s3cret"),
            ("SESSION_TTL_MINUTES", "30"),
            ("BCRYPT_COST", "6"),
            ("USE_PERSISTENT_STORES", "TRUE"),
            ("DATABASE_URL", "postgres://localhost/lostfound"),
            ("DATABASE_MAX_CONNECTIONS", "12"),
        ]))
        .unwrap();

        assert_eq!(cfg.bind_addr.port(), 3000);
        assert_eq!(cfg.session_secret, "s3cret");
        assert_eq!(cfg.session_ttl, Duration::minutes(30));
        assert_eq!(cfg.bcrypt_cost, 6);
        assert!(cfg.use_persistent_stores);
        assert_eq!(cfg.database_url.as_deref(), Some("postgres://localhost/lostfound"));
        assert_eq!(cfg.database_max_connections, 12);
    }

    #[test]
    fn persistent_stores_require_database_url() {
        let res = AppConfig::from_lookup(lookup(&[("USE_PERSISTENT_STORES", "true")]));
        assert_eq!(res, Err(ConfigError::MissingDatabaseUrl));
    }

    #[test]
    fn rejects_out_of_range_ttl() {
        for raw in ["0", "-5", "527041", "200000000000000"] {
            let res = AppConfig::from_lookup(lookup(&[("SESSION_TTL_MINUTES", raw)]));
            assert!(matches!(res, Err(ConfigError::Invalid { var: "SESSION_TTL_MINUTES", .. })), "{raw}");
        }

        let cfg = AppConfig::from_lookup(lookup(&[("SESSION_TTL_MINUTES", "527040")])).unwrap();
        assert_eq!(cfg.session_ttl, Duration::days(366));
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let cfg = AppConfig::from_lookup(lookup(&[("SESSION_SECRET", "topsecret")])).unwrap();
        assert!(!format!("{cfg:?}").contains("topsecret"));
    }
}
