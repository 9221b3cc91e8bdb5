use std::path::PathBuf;
use std::time::Duration;

/// Process configuration, read once from `STASHFIND_*` environment variables.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub bind: String,
    pub port: u16,
    pub seed_file: Option<PathBuf>,
    pub metrics_port: Option<u16>,
    pub shutdown_grace: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".into(),
            port: 8080,
            seed_file: None,
            metrics_port: None,
            shutdown_grace: Duration::from_secs(10),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Unparseable numbers fall back to their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            bind: lookup("STASHFIND_BIND").unwrap_or(defaults.bind),
            port: lookup("STASHFIND_PORT")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.port),
            seed_file: lookup("STASHFIND_SEED_FILE")
                .filter(|s| !s.is_empty())
                .map(PathBuf::from),
            metrics_port: lookup("STASHFIND_METRICS_PORT").and_then(|s| s.parse().ok()),
            shutdown_grace: lookup("STASHFIND_SHUTDOWN_GRACE_SECS")
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.shutdown_grace),
        }
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}
