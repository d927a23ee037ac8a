//! # levelsplit
//!
//! levelsplit is an output sink for structured logging: it persists
//! already-leveled, field-tagged records to disk with one file per severity
//! level, time-based rotation (daily by default, or any `[count]D/H/M/S`
//! interval), optional write buffering with a once-a-second flusher, and
//! automatic pruning of backups older than a retention window. Rotation is
//! safe even when several cooperating processes share one log directory: the
//! rename to a dated backup is guarded by an advisory file lock, and a backup
//! that already exists is taken as proof that a racing process rotated first.
//!
//! A storage failure never propagates back to the caller that emitted the
//! record: rotation and flush errors are reported on stderr and the write
//! carries on against whatever file is currently open.
//!
//! ## Example
//!
//! ```no_run
//! use levelsplit::{FileSinkConfig, Level, LevelRouter, LogRecord};
//!
//! fn main() -> Result<(), levelsplit::Error> {
//!     let config = FileSinkConfig::from_yaml_file("logging.yaml")?;
//!     let router = LevelRouter::from_config(&config)?;
//!
//!     router.fire(
//!         &LogRecord::new(Level::Info, "service started")
//!             .field("addr", "0.0.0.0")
//!             .field("port", 8080_i64),
//!     );
//!     router.flush();
//!     Ok(())
//! }
//! ```

use std::{
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock},
};

mod config;
mod error;
mod flock;
mod format;
mod level;
mod policy;
mod record;
mod retention;
mod router;
mod writer;


pub use {
    config::FileSinkConfig,
    error::Error,
    format::KvTextFormatter,
    level::Level,
    policy::{RotationPolicy, RotationUnit},
    record::{FieldValue, LogRecord},
    retention::{sweep_expired, DEFAULT_RETENTION_DAYS},
    router::LevelRouter,
    writer::RotatingWriter,
};

/// Named sinks owned by the initializing context. Created once, queried by
/// name; configuring a name that already exists returns the existing sink
/// instead of re-creating it. Names are case-insensitive and an empty name
/// aliases `root`.
pub struct SinkRegistry {
    sinks: RwLock<HashMap<String, Arc<LevelRouter>>>,
}

impl SinkRegistry {
    pub fn new() -> Self {
        SinkRegistry {
            sinks: RwLock::new(HashMap::new()),
        }
    }

    /// Build and register a sink under `name`, or return the one already
    /// registered there.
    pub fn configure(&self, name: &str, config: &FileSinkConfig) -> Result<Arc<LevelRouter>, Error> {
        let key = normalize_name(name);
        {
            let sinks = self.sinks.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(existing) = sinks.get(&key) {
                return Ok(existing.clone());
            }
        }
        let router = Arc::new(LevelRouter::from_config(config)?);
        let mut sinks = self.sinks.write().unwrap_or_else(PoisonError::into_inner);
        Ok(sinks.entry(key).or_insert(router).clone())
    }

    pub fn get(&self, name: &str) -> Option<Arc<LevelRouter>> {
        let sinks = self.sinks.read().unwrap_or_else(PoisonError::into_inner);
        sinks.get(&normalize_name(name)).cloned()
    }
}

impl Default for SinkRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn normalize_name(name: &str) -> String {
    let name = name.trim().to_lowercase();
    if name.is_empty() {
        "root".to_owned()
    } else {
        name
    }
}
