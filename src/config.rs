//! Process configuration, read once from the environment at startup.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

pub const DEFAULT_DATABASE_URL: &str = "wal://./data/tablebook.wal";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unsupported DATABASE_URL scheme: {0} (expected memory:// or wal://<path>)")]
    UnsupportedScheme(String),
    #[error("DATABASE_URL names no WAL path")]
    EmptyPath,
}

/// Which backing store the engine runs on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreUrl {
    /// Volatile; state is lost on exit.
    Memory,
    /// Durable write-ahead log at this path.
    Wal(PathBuf),
}

impl FromStr for StoreUrl {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s == "memory" || s == "memory:" || s == "memory://" {
            return Ok(StoreUrl::Memory);
        }
        let path = match s.split_once("://") {
            Some(("wal", path)) => path,
            Some((scheme, _)) => return Err(ConfigError::UnsupportedScheme(scheme.to_string())),
            None => s,
        };
        if path.is_empty() {
            return Err(ConfigError::EmptyPath);
        }
        Ok(StoreUrl::Wal(PathBuf::from(path)))
    }
}

impl fmt::Display for StoreUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreUrl::Memory => write!(f, "memory://"),
            StoreUrl::Wal(path) => write!(f, "wal://{}", path.display()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub store: StoreUrl,
    pub bind: String,
    pub port: u16,
    pub metrics_port: Option<u16>,
    pub compact_threshold: u64,
    pub log_level: String,
    pub log_json: bool,
    pub log_dir: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Unparseable numbers fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let store = lookup("DATABASE_URL")
            .unwrap_or_else(|| DEFAULT_DATABASE_URL.into())
            .parse()?;

        Ok(Self {
            store,
            bind: lookup("TABLEBOOK_BIND").unwrap_or_else(|| "0.0.0.0".into()),
            port: parsed(&lookup, "TABLEBOOK_PORT").unwrap_or(8000),
            metrics_port: parsed(&lookup, "TABLEBOOK_METRICS_PORT"),
            compact_threshold: parsed(&lookup, "TABLEBOOK_COMPACT_THRESHOLD").unwrap_or(1000),
            log_level: lookup("TABLEBOOK_LOG_LEVEL").unwrap_or_else(|| "info".into()),
            log_json: parsed(&lookup, "TABLEBOOK_LOG_JSON").unwrap_or(false),
            log_dir: lookup("TABLEBOOK_LOG_DIR")
                .filter(|s| !s.is_empty())
                .map(PathBuf::from),
        })
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

fn parsed<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    lookup(key).and_then(|s| s.trim().parse().ok())
}
