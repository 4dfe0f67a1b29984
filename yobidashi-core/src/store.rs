//! Persisted queue store.
//!
//! One JSON file shared by the control tool and the display board. There is
//! no lock between the two processes, so the store offers two read paths:
//!
//! - [`QueueStore::load`] - writer side. Self-healing: a missing or
//!   undecodable file, a non-sequence `orders` field or a non-numeric
//!   `count` each recover to their empty default, independently of one
//!   another. Availability over unreadable prior state.
//! - [`QueueStore::load_strict`] - reader side. A missing or malformed file
//!   is an error, so a poll that lands mid-write does not advance the
//!   feed watermark and the next tick retries.
//!
//! Saves go through a temp file in the same directory followed by a rename,
//! and carry a generation check: if the file's generation no longer matches
//! the loaded snapshot's, another writer got there first and the save fails
//! with `Conflict` instead of silently dropping its update.

use crate::error::{QueueError, QueueResult};
use crate::model::{Order, QueueSnapshot};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Handle to the queue file. Cheap to clone; holds no open descriptor.
#[derive(Debug, Clone)]
pub struct QueueStore {
    path: PathBuf,
}

impl QueueStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the snapshot, recovering from a missing or corrupt file.
    ///
    /// Only genuine I/O failures (permissions, disk) propagate.
    pub fn load(&self) -> QueueResult<QueueSnapshot> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(QueueSnapshot::default());
            }
            Err(e) => return Err(e.into()),
        };

        let value: Value = serde_json::from_str(&raw).unwrap_or(Value::Null);
        Ok(coerce_snapshot(&value))
    }

    /// Load the snapshot, failing on a missing or malformed file.
    pub fn load_strict(&self) -> QueueResult<QueueSnapshot> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(QueueError::FileMissing {
                    path: self.path.clone(),
                });
            }
            Err(e) => return Err(e.into()),
        };

        let value: Value = serde_json::from_str(&raw).map_err(|e| QueueError::Corrupt {
            reason: e.to_string(),
        })?;
        if !value.is_object() {
            return Err(QueueError::Corrupt {
                reason: "top-level value is not an object".to_owned(),
            });
        }
        serde_json::from_value(value).map_err(|e| QueueError::Corrupt {
            reason: e.to_string(),
        })
    }

    /// Persist the snapshot, overwriting the file.
    ///
    /// Fails with `Conflict` when the on-disk generation differs from the
    /// one the snapshot was loaded with; writes nothing in that case. The
    /// stored generation is bumped by one on every successful save.
    pub fn save(&self, snapshot: &QueueSnapshot) -> QueueResult<()> {
        let on_disk = self.load()?;
        if on_disk.generation != snapshot.generation {
            return Err(QueueError::Conflict {
                loaded: snapshot.generation,
                on_disk: on_disk.generation,
            });
        }

        let persisted = QueueSnapshot {
            orders: snapshot.orders.clone(),
            counter: snapshot.counter,
            generation: snapshot.generation + 1,
        };
        let mut body = serde_json::to_string_pretty(&persisted)?;
        body.push('\n');

        // Temp file in the same directory so the rename stays on one
        // filesystem; pid suffix keeps two racing writers off the same name.
        let tmp = self
            .path
            .with_extension(format!("tmp.{}", std::process::id()));
        fs::write(&tmp, body)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// Modification time of the queue file, for change detection.
    pub fn last_modified(&self) -> QueueResult<SystemTime> {
        let metadata = fs::metadata(&self.path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                QueueError::FileMissing {
                    path: self.path.clone(),
                }
            } else {
                QueueError::Io(e)
            }
        })?;
        Ok(metadata.modified()?)
    }
}

/// Field-level recovery: each field falls back to its empty default on its
/// own, so a corrupt counter does not discard valid orders and vice versa.
fn coerce_snapshot(value: &Value) -> QueueSnapshot {
    let orders = value
        .get("orders")
        .cloned()
        .and_then(|v| serde_json::from_value::<Vec<Order>>(v).ok())
        .unwrap_or_default();

    let counter = value.get("count").map_or(0, coerce_counter);
    let generation = value.get("generation").map_or(0, coerce_counter);

    QueueSnapshot {
        orders,
        counter,
        generation,
    }
}

/// Coerce a JSON value to a non-negative integer the way the queue file has
/// historically been written: integers, integral floats and digit strings
/// all count; anything else resets to zero.
fn coerce_counter(value: &Value) -> u64 {
    match value {
        Value::Number(n) => {
            if let Some(v) = n.as_u64() {
                v
            } else if let Some(f) = n.as_f64() {
                if f.is_finite() && f >= 0.0 { f as u64 } else { 0 }
            } else {
                0
            }
        }
        Value::String(s) => s.trim().parse::<u64>().unwrap_or(0),
        Value::Bool(b) => u64::from(*b),
        _ => 0,
    }
}
