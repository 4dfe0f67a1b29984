//! Append-only per-day audit trail.
//!
//! One file per process per day (`<name>_YYYYMMDD.log`), one line per event:
//!
//! ```text
//! [2025-06-01 09:12:03] [INFO] [REGISTER] 001 を受付済みで追加しました
//! ```
//!
//! The line format is an external interface - the log analyzers consume it
//! verbatim - so it stays fixed even though the processes also emit
//! structured `tracing` output. Not used for replay or recovery; purely
//! observability. Write failures are swallowed: logging never aborts the
//! control or display operation that triggered it.

use chrono::Local;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

/// Handle to one process's audit trail.
#[derive(Debug, Clone)]
pub struct AuditLog {
    dir: PathBuf,
    name: String,
}

impl AuditLog {
    /// `name` is the per-process file prefix, e.g. `control_queue` or
    /// `display_board`.
    pub fn new(dir: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            name: name.into(),
        }
    }

    pub fn info(&self, message: &str) {
        self.append("INFO", message);
    }

    pub fn warn(&self, message: &str) {
        self.append("WARN", message);
    }

    pub fn error(&self, message: &str) {
        self.append("ERROR", message);
    }

    fn append(&self, level: &str, message: &str) {
        if let Err(e) = self.try_append(level, message) {
            tracing::warn!(error = %e, "audit log write failed");
        }
    }

    fn try_append(&self, level: &str, message: &str) -> std::io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        let now = Local::now();
        let path = self
            .dir
            .join(format!("{}_{}.log", self.name, now.format("%Y%m%d")));
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(
            file,
            "[{}] [{}] {}",
            now.format("%Y-%m-%d %H:%M:%S"),
            level,
            message
        )
    }
}
