use {
    chrono::{Days, Local, NaiveDate},
    regex::Regex,
    std::{fs, path::Path, path::PathBuf, thread},
};

/// Backups older than this many days are pruned unless configured otherwise.
pub const DEFAULT_RETENTION_DAYS: i64 = 30;

/// Prune backups of `target` whose embedded date is strictly older than the
/// retention window. Scans every matching sibling, so a gap in the backup
/// sequence never hides older files from pruning. Returns how many files
/// were removed; individual deletion failures are logged and skipped.
pub fn sweep_expired(target: &Path, retention_days: i64) -> usize {
    let Some(dir) = target.parent().filter(|p| !p.as_os_str().is_empty()) else {
        return 0;
    };
    let Some(base) = target.file_name().map(|name| name.to_string_lossy().into_owned()) else {
        return 0;
    };
    // Backup names start with a day-precision date; finer units only append.
    let pattern = match Regex::new(&format!(r"^{}\.(\d{{4}}-\d{{2}}-\d{{2}})", regex::escape(&base))) {
        Ok(pattern) => pattern,
        Err(err) => {
            eprintln!("Failed to build backup pattern for '{}': {}", target.display(), err);
            return 0;
        }
    };
    let Some(cutoff) = Local::now().date_naive().checked_sub_days(Days::new(retention_days.max(0) as u64)) else {
        return 0;
    };

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            eprintln!("Failed to scan '{}' for expired backups: {}", dir.display(), err);
            return 0;
        }
    };

    let mut removed = 0;
    for entry in entries.flatten() {
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        let Some(caps) = pattern.captures(name) else { continue };
        let Ok(date) = NaiveDate::parse_from_str(&caps[1], "%Y-%m-%d") else {
            continue;
        };
        if date < cutoff {
            let path = entry.path();
            match fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(err) => eprintln!("Failed to remove expired backup '{}': {}", path.display(), err),
            }
        }
    }
    removed
}

/// Fire-and-forget sweep after a rotation. Must never block the writer that
/// spawned it; a sweep in progress at process exit is simply abandoned.
pub(crate) fn spawn_sweep(target: PathBuf, retention_days: i64) {
    thread::spawn(move || {
        sweep_expired(&target, retention_days);
    });
}
