use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Logging settings read from the environment at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct LogConfig {
    pub environment: String,
    /// Default directive for this crate; `RUST_LOG` overrides the whole filter.
    pub level: String,
    pub dir: PathBuf,
}

impl LogConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let environment = lookup("ENVIRONMENT")
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "development".to_string());

        let level = lookup("LOG_LEVEL")
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| {
                if environment == "production" {
                    "info".to_string()
                } else {
                    "debug".to_string()
                }
            });

        let dir = lookup("LOG_DIR")
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "logs".to_string())
            .into();

        Self {
            environment,
            level,
            dir,
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn default_filter(&self) -> String {
        format!(
            "interior_studio_backend={},tower_http=debug,axum=debug,mongodb=warn",
            self.level
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "trace"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

/// Log line forwarded by the admin UI (failed fetches and the like)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientLogEntry {
    pub timestamp: String,
    pub level: LogLevel,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct ClientLogBatch {
    pub logs: Vec<ClientLogEntry>,
}

#[derive(Debug, Serialize)]
pub struct LogResponse {
    pub success: bool,
    pub received: usize,
    pub processed: usize,
}
