use std::path::PathBuf;
use std::time::Duration;

/// Server configuration loaded from environment variables.
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
    /// Directory holding one JSON file per draft key.
    pub drafts_dir: PathBuf,
    /// Base URL of the hosted backend project.
    pub backend_url: String,
    /// Public API key sent with every backend request.
    pub backend_anon_key: String,
    /// Bound on one submission attempt (default: `20`). Must be shorter
    /// than `request_timeout_secs`.
    pub submit_timeout_secs: u64,
    /// Sessions unused for this long are dropped (default: `1800`).
    pub session_idle_secs: u64,
    /// Endpoint answering `{ "ip": ... }`.
    pub ip_lookup_url: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{var} has an invalid value: {value}")]
    Invalid { var: &'static str, value: String },

    #[error(
        "SUBMIT_TIMEOUT_SECS ({submit}) must be less than REQUEST_TIMEOUT_SECS ({request})"
    )]
    SubmitOutlastsRequest { submit: u64, request: u64 },
}

fn var_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.into())
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or(ConfigError::Missing(name))
}

fn parsed<T: std::str::FromStr>(name: &'static str, default: &str) -> Result<T, ConfigError> {
    let value = var_or(name, default);
    value
        .parse()
        .map_err(|_| ConfigError::Invalid { var: name, value })
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// | Env Var                | Default                             |
    /// |------------------------|-------------------------------------|
    /// | `HOST`                 | `0.0.0.0`                           |
    /// | `PORT`                 | `3000`                              |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`             |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                                |
    /// | `DRAFTS_DIR`           | `./data/drafts`                     |
    /// | `BACKEND_URL`          | required                            |
    /// | `BACKEND_ANON_KEY`     | required                            |
    /// | `SUBMIT_TIMEOUT_SECS`  | `20`                                |
    /// | `SESSION_IDLE_SECS`    | `1800`                              |
    /// | `IP_LOOKUP_URL`        | `https://api.ipify.org?format=json` |
    pub fn from_env() -> Result<Self, ConfigError> {
        let cors_origins: Vec<String> = var_or("CORS_ORIGINS", "http://localhost:5173")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let config = Self {
            host: var_or("HOST", "0.0.0.0"),
            port: parsed("PORT", "3000")?,
            cors_origins,
            request_timeout_secs: parsed("REQUEST_TIMEOUT_SECS", "30")?,
            drafts_dir: PathBuf::from(var_or("DRAFTS_DIR", "./data/drafts")),
            backend_url: required("BACKEND_URL")?,
            backend_anon_key: required("BACKEND_ANON_KEY")?,
            submit_timeout_secs: parsed("SUBMIT_TIMEOUT_SECS", "20")?,
            session_idle_secs: parsed("SESSION_IDLE_SECS", "1800")?,
            ip_lookup_url: var_or("IP_LOOKUP_URL", intake_gateway::ip_lookup::DEFAULT_IP_LOOKUP_URL),
        };
        config.validate()?;
        Ok(config)
    }

    /// Cross-field checks. A submission must be able to finish before the
    /// request carrying it times out.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.submit_timeout_secs >= self.request_timeout_secs {
            return Err(ConfigError::SubmitOutlastsRequest {
                submit: self.submit_timeout_secs,
                request: self.request_timeout_secs,
            });
        }
        Ok(())
    }

    pub fn submit_timeout(&self) -> Duration {
        Duration::from_secs(self.submit_timeout_secs)
    }

    pub fn session_idle(&self) -> Duration {
        Duration::from_secs(self.session_idle_secs)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn config(request_timeout_secs: u64, submit_timeout_secs: u64) -> ServerConfig {
        ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 3000,
            cors_origins: Vec::new(),
            request_timeout_secs,
            drafts_dir: PathBuf::from("drafts"),
            backend_url: "http://backend.invalid".to_string(),
            backend_anon_key: "key".to_string(),
            submit_timeout_secs,
            session_idle_secs: 1800,
            ip_lookup_url: "http://ip.invalid".to_string(),
        }
    }

    #[test]
    fn submit_timeout_must_be_shorter_than_request_timeout() {
        assert!(config(30, 20).validate().is_ok());
        assert_matches!(
            config(20, 20).validate(),
            Err(ConfigError::SubmitOutlastsRequest { submit: 20, request: 20 })
        );
        assert_matches!(
            config(1, 5).validate(),
            Err(ConfigError::SubmitOutlastsRequest { .. })
        );
    }
}
