//! Server configuration parsed from environment variables.
//!
//! `main` loads `.env` with `dotenvy` first, then calls [`Config::from_env`].
//! Parsing goes through [`Config::from_lookup`] so tests can feed a map
//! instead of mutating the process environment.

pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:5173,http://127.0.0.1:5173";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
pub const DEFAULT_CHAT_HISTORY_LIMIT: usize = 50;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid {var}={value:?}: {reason}")]
    Invalid { var: &'static str, value: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub port: u16,
    /// Origins allowed by CORS. Empty means no cross-origin access.
    pub allowed_origins: Vec<String>,
    /// Largest accepted upload, in bytes.
    pub max_upload_bytes: usize,
    /// Page size for `GET /messages` when the client sends no `limit`.
    pub chat_history_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            allowed_origins: split_origins(DEFAULT_ALLOWED_ORIGINS),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            chat_history_limit: DEFAULT_CHAT_HISTORY_LIMIT,
        }
    }
}

impl Config {
    /// Build config from the process environment.
    ///
    /// Optional:
    /// - `PORT`: default 8000
    /// - `ALLOWED_ORIGINS`: comma-separated, default the local dev frontends
    /// - `MAX_UPLOAD_BYTES`: default 10 MiB
    /// - `CHAT_HISTORY_LIMIT`: default 50
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a variable is set but unparsable.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a value is set but unparsable.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port = parse_var(&lookup, "PORT", DEFAULT_PORT)?;
        let allowed_origins = lookup("ALLOWED_ORIGINS").map_or_else(|| split_origins(DEFAULT_ALLOWED_ORIGINS), |v| split_origins(&v));
        let max_upload_bytes = parse_var(&lookup, "MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?;
        let chat_history_limit = parse_var(&lookup, "CHAT_HISTORY_LIMIT", DEFAULT_CHAT_HISTORY_LIMIT)?;

        if max_upload_bytes == 0 {
            return Err(ConfigError::Invalid {
                var: "MAX_UPLOAD_BYTES",
                value: "0".into(),
                reason: "must be positive".into(),
            });
        }

        Ok(Self { port, allowed_origins, max_upload_bytes, chat_history_limit })
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, var: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(var) {
        None => Ok(default),
        Some(raw) if raw.trim().is_empty() => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::Invalid { var, value: raw.clone(), reason: e.to_string() }),
    }
}

fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
