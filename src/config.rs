use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub listen_addr: String,
    /// Root directory of the served website. Pages live under `Pages/`.
    pub website_path: PathBuf,
    /// Upper bound on connections admitted past the accept point.
    pub max_connections: usize,
    pub session_expiration_secs: u64,
    /// Request parameter and session object key holding the CSRF token.
    pub csrf_token_key: String,
    /// Interval of the idle-session sweep. `None` keeps every session for
    /// the process lifetime.
    pub session_sweep_secs: Option<u64>,
    pub session_max_idle_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8080".to_string(),
            website_path: PathBuf::from("./Website"),
            max_connections: 20,
            session_expiration_secs: 60,
            csrf_token_key: "__CSRFToken__".to_string(),
            session_sweep_secs: None,
            session_max_idle_secs: 600,
        }
    }
}

impl Config {
    /// Builds the configuration from environment variables, falling back to
    /// defaults for anything unset or unparsable.
    pub fn load() -> Self {
        let defaults = Self::default();

        Self {
            listen_addr: std::env::var("LISTEN").unwrap_or(defaults.listen_addr),
            website_path: std::env::var("WEBSITE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.website_path),
            max_connections: env_parse("MAX_CONNECTIONS").unwrap_or(defaults.max_connections),
            session_expiration_secs: env_parse("SESSION_EXPIRATION")
                .unwrap_or(defaults.session_expiration_secs),
            csrf_token_key: std::env::var("CSRF_TOKEN_KEY").unwrap_or(defaults.csrf_token_key),
            session_sweep_secs: env_parse("SESSION_SWEEP").or(defaults.session_sweep_secs),
            session_max_idle_secs: env_parse("SESSION_MAX_IDLE")
                .unwrap_or(defaults.session_max_idle_secs),
        }
    }

    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let cfg: Self = serde_yaml::from_str(yaml).context("invalid YAML configuration")?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Self::from_yaml_str(&yaml)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.max_connections == 0 {
            anyhow::bail!("max_connections must be at least 1");
        }
        if self.csrf_token_key.is_empty() {
            anyhow::bail!("csrf_token_key must not be empty");
        }
        if self.session_sweep_secs == Some(0) {
            anyhow::bail!("session_sweep_secs must be at least 1 when set");
        }
        Ok(())
    }

    pub fn session_expiration(&self) -> Duration {
        Duration::from_secs(self.session_expiration_secs)
    }

    pub fn session_sweep(&self) -> Option<(Duration, Duration)> {
        self.session_sweep_secs.map(|secs| {
            (
                Duration::from_secs(secs),
                Duration::from_secs(self.session_max_idle_secs),
            )
        })
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}
