/// Configuration management for the API server
///
/// This module loads configuration from environment variables and provides
/// a type-safe configuration struct.
///
/// # Environment Variables
///
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 10)
/// - `API_HOST`: Host to bind to (default: 0.0.0.0)
/// - `API_PORT`: Port to bind to (default: 8000)
/// - `CORS_ORIGINS`: Comma-separated allowed origins, `*` for any (default: *)
/// - `PRODUCTION`: Enables HSTS (default: false)
/// - `RUN_MIGRATIONS`: Apply migrations at startup (default: true)
/// - `VERIFICATION_CODE_TTL_SECS`: Lifetime of login codes (default: 300)
/// - `VERIFICATION_CODE_ECHO`: Echo the code in the send-code response (default: true)
/// - `LOG_FORMAT`: `json` for JSON logs, anything else for text
/// - `RUST_LOG`: Log filter
///
/// # Example
///
/// ```no_run
/// use woodenfish_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use serde::{Deserialize, Serialize};
use std::env;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Phone login configuration
    pub verification: VerificationConfig,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// Allowed CORS origins; `*` allows any
    pub cors_origins: Vec<String>,

    /// Production mode (HTTPS, HSTS)
    pub production: bool,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in pool
    pub max_connections: u32,

    /// Apply embedded migrations on startup
    pub run_migrations: bool,
}

/// Upper bound for `VERIFICATION_CODE_TTL_SECS` (one day)
pub const MAX_CODE_TTL_SECONDS: i64 = 86_400;

/// Verification code configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationConfig {
    /// Seconds a code stays redeemable
    pub code_ttl_seconds: i64,

    /// Return the code in the send-code message.
    ///
    /// There is no SMS gateway; this is how clients obtain the code.
    pub echo_code: bool,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            code_ttl_seconds: 300,
            echo_code: true,
        }
    }
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `DATABASE_URL` is missing
    /// - A variable has an unparseable value
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let api_host = var("API_HOST", "0.0.0.0");
        let api_port = var("API_PORT", "8000")
            .parse::<u16>()
            .map_err(|e| anyhow::anyhow!("API_PORT is invalid: {}", e))?;

        let cors_origins = var("CORS_ORIGINS", "*")
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        let production = parse_bool("PRODUCTION", &var("PRODUCTION", "false"))?;

        let database_url = lookup("DATABASE_URL")
            .ok_or_else(|| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let max_connections = var("DATABASE_MAX_CONNECTIONS", "10")
            .parse::<u32>()
            .map_err(|e| anyhow::anyhow!("DATABASE_MAX_CONNECTIONS is invalid: {}", e))?;

        let run_migrations = parse_bool("RUN_MIGRATIONS", &var("RUN_MIGRATIONS", "true"))?;

        let code_ttl_seconds = var("VERIFICATION_CODE_TTL_SECS", "300")
            .parse::<i64>()
            .map_err(|e| anyhow::anyhow!("VERIFICATION_CODE_TTL_SECS is invalid: {}", e))?;

        if !(1..=MAX_CODE_TTL_SECONDS).contains(&code_ttl_seconds) {
            anyhow::bail!(
                "VERIFICATION_CODE_TTL_SECS must be between 1 and {}",
                MAX_CODE_TTL_SECONDS
            );
        }

        let echo_code = parse_bool("VERIFICATION_CODE_ECHO", &var("VERIFICATION_CODE_ECHO", "true"))?;

        Ok(Self {
            api: ApiConfig {
                host: api_host,
                port: api_port,
                cors_origins,
                production,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections,
                run_migrations,
            },
            verification: VerificationConfig {
                code_ttl_seconds,
                echo_code,
            },
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }

    /// Whether any origin may call the API
    pub fn allows_any_origin(&self) -> bool {
        self.api.cors_origins.iter().any(|origin| origin == "*")
    }
}

fn parse_bool(key: &str, value: &str) -> anyhow::Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => anyhow::bail!("{} must be a boolean, got '{}'", key, other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[("DATABASE_URL", "postgresql://localhost/test")]).unwrap();

        assert_eq!(config.bind_address(), "0.0.0.0:8000");
        assert_eq!(config.database.max_connections, 10);
        assert!(config.database.run_migrations);
        assert!(!config.api.production);
        assert!(config.allows_any_origin());
        assert_eq!(config.verification.code_ttl_seconds, 300);
        assert!(config.verification.echo_code);
    }

    #[test]
    fn test_database_url_required() {
        let err = config_from(&[]).unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL"));
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("DATABASE_URL", "postgresql://localhost/test"),
            ("API_HOST", "127.0.0.1"),
            ("API_PORT", "9000"),
            ("CORS_ORIGINS", "https://a.example, https://b.example"),
            ("PRODUCTION", "true"),
            ("RUN_MIGRATIONS", "0"),
            ("VERIFICATION_CODE_TTL_SECS", "60"),
            ("VERIFICATION_CODE_ECHO", "off"),
        ])
        .unwrap();

        assert_eq!(config.bind_address(), "127.0.0.1:9000");
        assert_eq!(
            config.api.cors_origins,
            vec!["https://a.example".to_string(), "https://b.example".to_string()]
        );
        assert!(!config.allows_any_origin());
        assert!(config.api.production);
        assert!(!config.database.run_migrations);
        assert_eq!(config.verification.code_ttl_seconds, 60);
        assert!(!config.verification.echo_code);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(config_from(&[("DATABASE_URL", "x"), ("API_PORT", "http")]).is_err());
        assert!(config_from(&[("DATABASE_URL", "x"), ("PRODUCTION", "maybe")]).is_err());
        assert!(config_from(&[("DATABASE_URL", "x"), ("VERIFICATION_CODE_TTL_SECS", "0")]).is_err());
    }

    #[test]
    fn test_code_ttl_upper_bound() {
        let ttl = |value: &str| config_from(&[("DATABASE_URL", "x"), ("VERIFICATION_CODE_TTL_SECS", value)]);

        assert_eq!(ttl("86400").unwrap().verification.code_ttl_seconds, MAX_CODE_TTL_SECONDS);
        assert!(ttl("86401").is_err());
        assert!(ttl("9300000000000000").is_err());
    }
}
