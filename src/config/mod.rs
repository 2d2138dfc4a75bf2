//! Configuration module for the gateway.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;

/// Log line format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// A configuration variable that could not be parsed.
#[derive(Debug, Clone)]
pub struct ConfigError {
    pub var: &'static str,
    pub message: String,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid {}: {}", self.var, self.message)
    }
}

impl std::error::Error for ConfigError {}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the upstream REST API
    pub upstream_url: String,
    /// Address to bind the gateway to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    pub log_format: LogFormat,
    /// Name of the httpOnly cookie carrying the auth token
    pub auth_cookie: String,
    /// Whether the auth cookie is marked `Secure`
    pub secure_cookies: bool,
    /// Cookie lifetime in seconds for tokens without an `exp` claim
    pub cookie_max_age_secs: i64,
    /// Upstream request timeout in seconds
    pub upstream_timeout_secs: u64,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let upstream_url = env::var("VIEW_API_URL")
            .unwrap_or_else(|_| "http://localhost:3000".to_string())
            .trim_end_matches('/')
            .to_string();

        let bind_addr = parse_var("VIEW_BIND_ADDR", "127.0.0.1:8080")?;

        let log_level = env::var("VIEW_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let log_format = match env::var("VIEW_LOG_FORMAT").as_deref() {
            Err(_) | Ok("pretty") => LogFormat::Pretty,
            Ok("json") => LogFormat::Json,
            Ok(other) => {
                return Err(ConfigError {
                    var: "VIEW_LOG_FORMAT",
                    message: format!("expected `pretty` or `json`, got `{}`", other),
                })
            }
        };

        let auth_cookie = env::var("VIEW_AUTH_COOKIE").unwrap_or_else(|_| "auth_token".to_string());
        let secure_cookies = parse_var("VIEW_SECURE_COOKIES", "false")?;
        let cookie_max_age_secs = parse_var("VIEW_COOKIE_MAX_AGE", "604800")?;
        let upstream_timeout_secs = parse_var("VIEW_UPSTREAM_TIMEOUT", "15")?;

        Ok(Self {
            upstream_url,
            bind_addr,
            log_level,
            log_format,
            auth_cookie,
            secure_cookies,
            cookie_max_age_secs,
            upstream_timeout_secs,
        })
    }
}

fn parse_var<T>(var: &'static str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw = env::var(var).unwrap_or_else(|_| default.to_string());
    raw.parse().map_err(|e: T::Err| ConfigError {
        var,
        message: e.to_string(),
    })
}
