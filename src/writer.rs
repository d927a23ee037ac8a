use {
    crate::{error::Error, flock::LockFile, policy::RotationPolicy, retention},
    chrono::{DateTime, Local},
    std::{
        fs::{self, File, OpenOptions},
        io::{self, Write as _},
        path::{Path, PathBuf},
        sync::{Arc, Mutex, PoisonError, Weak},
        thread,
        time::{Duration, SystemTime, UNIX_EPOCH},
    },
};

const BUFFER_CAPACITY: usize = 10 * 1024;
const FLUSH_INTERVAL: Duration = Duration::from_secs(1);

/// The live file handle plus the optional in-memory buffer in front of it.
/// Guarded by its own mutex, distinct from the rotation mutex, so the
/// periodic flusher never waits on a rotation that is only computing names.
/// Rotation closes the old handle through this mutex, so a flush can never
/// drain into a handle that has been replaced.
struct Output {
    path: PathBuf,
    file: Option<File>,
    buffer: Option<Vec<u8>>,
}

impl Output {
    fn ensure_open(&mut self) -> io::Result<&mut File> {
        match self.file {
            Some(ref mut file) => Ok(file),
            None => {
                let file = OpenOptions::new().append(true).create(true).open(&self.path)?;
                Ok(self.file.insert(file))
            }
        }
    }

    fn append(&mut self, bytes: &[u8]) -> io::Result<()> {
        if self.buffer.is_none() {
            return self.ensure_open()?.write_all(bytes);
        }
        let pending = self.buffer.as_ref().map(Vec::len).unwrap_or(0);
        if pending + bytes.len() > BUFFER_CAPACITY {
            self.drain()?;
        }
        if bytes.len() >= BUFFER_CAPACITY {
            // Oversized entries bypass the buffer entirely
            return self.ensure_open()?.write_all(bytes);
        }
        if let Some(buffer) = &mut self.buffer {
            buffer.extend_from_slice(bytes);
        }
        Ok(())
    }

    /// Drain the buffer into the handle and sync. On failure the unwritten
    /// bytes are put back so the next tick retries them.
    fn drain(&mut self) -> io::Result<()> {
        let data = match &mut self.buffer {
            Some(buffer) if !buffer.is_empty() => std::mem::take(buffer),
            _ => return Ok(()),
        };
        let result: io::Result<()> = (|| {
            let file = self.ensure_open()?;
            file.write_all(&data)?;
            file.sync_all()
        })();
        if result.is_err() {
            if let Some(buffer) = &mut self.buffer {
                let newer = std::mem::replace(buffer, data);
                buffer.extend_from_slice(&newer);
            }
        }
        result
    }

    /// Flush whatever is pending and close the handle ahead of a rotation.
    fn close(&mut self) {
        if let Err(err) = self.drain() {
            eprintln!("Failed to flush '{}' before closing: {}", self.path.display(), err);
        }
        if let Some(file) = self.file.take() {
            let _ = file.sync_all();
        }
    }
}

/// Rotation bookkeeping, serialized by the writer mutex: appends and
/// rotations for the same level never interleave.
struct RotateState {
    rollover_at: i64,
    lock: LockFile,
}

/// One writer per severity level. Owns the live file, decides when the file
/// rolls over, renames it to a dated backup safely even when several
/// processes share the path, and prunes expired backups after each rotation.
pub struct RotatingWriter {
    target: PathBuf,
    policy: Option<RotationPolicy>,
    retention_days: i64,
    state: Mutex<RotateState>,
    out: Arc<Mutex<Output>>,
}

impl RotatingWriter {
    /// `policy: None` disables rotation; the writer then only appends.
    /// The handle itself is opened lazily on first write.
    pub fn new(target: PathBuf, policy: Option<RotationPolicy>, buffered: bool, retention_days: i64) -> Arc<Self> {
        let rollover_at = match &policy {
            Some(policy) => {
                // Pick up where a previous incarnation left off: an existing
                // file's age decides the first rollover.
                let reference = fs::symlink_metadata(&target)
                    .and_then(|meta| meta.modified())
                    .map(|modified| crate::policy::local_from_epoch(epoch_secs(modified)))
                    .unwrap_or_else(|_| Local::now());
                policy.next_rollover_at(reference)
            }
            None => i64::MAX,
        };
        let out = Arc::new(Mutex::new(Output {
            path: target.clone(),
            file: None,
            buffer: buffered.then(|| Vec::with_capacity(BUFFER_CAPACITY)),
        }));
        if buffered {
            spawn_flusher(Arc::downgrade(&out));
        }
        Arc::new(RotatingWriter {
            state: Mutex::new(RotateState {
                rollover_at,
                lock: LockFile::for_target(&target),
            }),
            target,
            policy,
            retention_days,
            out,
        })
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Append one rendered record. A due rotation runs first; its failures
    /// are logged, never returned, so the record still reaches whatever file
    /// is currently open. Only the final append error is surfaced, and the
    /// caller logs and drops on it.
    pub fn write_entry(&self, timestamp: DateTime<Local>, rendered: &[u8]) -> Result<(), Error> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if self.policy.is_some() && timestamp.timestamp() >= state.rollover_at {
            if let Err(err) = self.do_rollover(&mut state, timestamp) {
                eprintln!("Failed to rotate '{}': {}", self.target.display(), err);
            }
        }
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        out.append(rendered).map_err(Error::Io)
    }

    /// Drain the buffer and sync, best-effort.
    pub fn flush(&self) -> Result<(), Error> {
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        out.drain().map_err(Error::Io)
    }

    fn do_rollover(&self, state: &mut RotateState, now: DateTime<Local>) -> Result<(), Error> {
        let Some(policy) = self.policy else { return Ok(()) };

        {
            let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
            out.close();
        }

        if let Ok(meta) = fs::symlink_metadata(&self.target) {
            let modified = meta.modified().map(epoch_secs).unwrap_or_else(|_| now.timestamp());
            if modified <= state.rollover_at {
                let boundary = policy.backup_boundary(state.rollover_at, modified);
                let backup = backup_path(&self.target, &policy.backup_suffix(boundary));

                // A lock failure skips this rotation; the next due write
                // retries because rollover_at has not advanced.
                state.lock.acquire()?;
                let renamed = if backup.exists() {
                    // A racing process beat us to the rename
                    eprintln!(
                        "'{}' may already be backed up to '{}'",
                        self.target.display(),
                        backup.display()
                    );
                    Ok(())
                } else {
                    fs::rename(&self.target, &backup).map_err(|err| Error::Rename {
                        from: self.target.clone(),
                        to: backup.clone(),
                        error: err.to_string(),
                    })
                };
                state.lock.release();
                renamed?;
            }
        }

        if state.rollover_at <= now.timestamp() {
            state.rollover_at = policy.next_rollover_at(now);
        }

        {
            let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
            if let Err(err) = out.ensure_open() {
                // The append path retries the open, so writes are never
                // permanently blocked by this.
                eprintln!("Failed to open fresh log file '{}': {}", self.target.display(), err);
            }
        }

        retention::spawn_sweep(self.target.clone(), self.retention_days);
        Ok(())
    }
}

impl Drop for RotatingWriter {
    fn drop(&mut self) {
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(err) = out.drain() {
            eprintln!("Failed to flush '{}' on shutdown: {}", self.target.display(), err);
        }
    }
}

fn backup_path(target: &Path, suffix: &str) -> PathBuf {
    PathBuf::from(format!("{}.{}", target.display(), suffix))
}

fn epoch_secs(t: SystemTime) -> i64 {
    t.duration_since(UNIX_EPOCH).map(|d| d.as_secs() as i64).unwrap_or(0)
}

/// Periodic flusher: drains the buffer once a second independently of write
/// calls and exits once its writer is gone.
fn spawn_flusher(out: Weak<Mutex<Output>>) {
    thread::spawn(move || loop {
        thread::sleep(FLUSH_INTERVAL);
        let Some(out) = out.upgrade() else { break };
        let mut out = out.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(err) = out.drain() {
            eprintln!("Failed to flush log buffer for '{}': {}", out.path.display(), err);
        }
    });
}
