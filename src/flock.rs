use {
    crate::error::Error,
    md5::{Digest, Md5},
    std::{
        env,
        path::{Path, PathBuf},
    },
};

#[cfg(any(unix, windows))]
use std::fs::{File, OpenOptions};

/// Advisory whole-file exclusive lock coordinating rotation across OS
/// processes that share one output path. The lock file lives in the
/// temp directory and is named after a digest of the full target path, so
/// independent processes contend on the same lock.
///
/// On platforms without whole-file locking both operations are no-ops;
/// callers tolerate the resulting race through the "backup already exists"
/// check during rotation.
#[derive(Debug)]
pub struct LockFile {
    path: PathBuf,
    #[cfg(any(unix, windows))]
    file: Option<File>,
}

impl LockFile {
    /// Derive the lock file guarding `target`.
    pub fn for_target(target: &Path) -> Self {
        let digest = Md5::digest(target.to_string_lossy().as_bytes());
        let basename = target
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "log".to_owned());
        let path = env::temp_dir().join(format!("{}.{}.lock", basename, hex::encode(digest)));
        LockFile {
            path,
            #[cfg(any(unix, windows))]
            file: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Block until the exclusive lock is held.
    #[cfg(any(unix, windows))]
    pub fn acquire(&mut self) -> Result<(), Error> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.path)
            .map_err(|err| Error::Lock(self.path.clone(), err.to_string()))?;
        fs3::FileExt::lock_exclusive(&file).map_err(|err| Error::Lock(self.path.clone(), err.to_string()))?;
        self.file = Some(file);
        Ok(())
    }

    #[cfg(not(any(unix, windows)))]
    pub fn acquire(&mut self) -> Result<(), Error> {
        Ok(())
    }

    /// Drop the lock if held. Never fails; a release error leaves the lock
    /// to be reclaimed when the handle closes.
    #[cfg(any(unix, windows))]
    pub fn release(&mut self) {
        if let Some(file) = self.file.take() {
            let _ = fs3::FileExt::unlock(&file);
        }
    }

    #[cfg(not(any(unix, windows)))]
    pub fn release(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_path_embeds_basename_and_digest() {
        let lock = LockFile::for_target(Path::new("/var/log/app.log.info"));
        let name = lock.path().file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("app.log.info."), "name: {name}");
        assert!(name.ends_with(".lock"), "name: {name}");
        // basename + '.' + 32 hex chars + ".lock"
        assert_eq!(name.len(), "app.log.info.".len() + 32 + ".lock".len());
    }

    #[test]
    fn same_target_derives_same_lock_distinct_targets_do_not() {
        let a = LockFile::for_target(Path::new("/var/log/app.log.info"));
        let b = LockFile::for_target(Path::new("/var/log/app.log.info"));
        let c = LockFile::for_target(Path::new("/var/log/app.log.error"));
        assert_eq!(a.path(), b.path());
        assert_ne!(a.path(), c.path());
    }

    #[test]
    fn acquire_and_release_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let mut lock = LockFile::for_target(&dir.path().join("app.log.info"));
        lock.acquire().unwrap();
        lock.release();
        lock.acquire().unwrap();
        lock.release();
    }
}
