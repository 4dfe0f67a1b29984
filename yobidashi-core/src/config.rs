//! Runtime configuration.
//!
//! Both processes read the same small set of environment variables:
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | `YOBIDASHI_QUEUE_PATH` | `queue.json` | Shared queue file |
//! | `YOBIDASHI_LOG_DIR` | `log` | Audit log directory |
//! | `YOBIDASHI_POLL_INTERVAL_MS` | `1000` | Display poll interval |

use std::path::PathBuf;

pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;

#[derive(Debug, Clone)]
pub struct Config {
    /// The shared queue file both processes coordinate through.
    pub queue_path: PathBuf,
    /// Directory for the per-day audit logs.
    pub log_dir: PathBuf,
    /// Display-side poll interval in milliseconds.
    pub poll_interval_ms: u64,
}

impl Config {
    /// Load configuration from environment variables, falling back to the
    /// defaults above when unset or unparseable.
    pub fn from_env() -> Self {
        Self {
            queue_path: std::env::var("YOBIDASHI_QUEUE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("queue.json")),
            log_dir: std::env::var("YOBIDASHI_LOG_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("log")),
            poll_interval_ms: std::env::var("YOBIDASHI_POLL_INTERVAL_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_POLL_INTERVAL_MS),
        }
    }

    /// Override the paths, keeping the rest from the environment.
    ///
    /// Used by tests.
    pub fn with_overrides(queue_path: impl Into<PathBuf>, log_dir: impl Into<PathBuf>) -> Self {
        let mut config = Self::from_env();
        config.queue_path = queue_path.into();
        config.log_dir = log_dir.into();
        config
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
