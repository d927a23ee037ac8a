use {
    crate::{
        config::FileSinkConfig,
        error::Error,
        format::{hostname, KvTextFormatter},
        level::Level,
        policy::RotationPolicy,
        record::LogRecord,
        writer::RotatingWriter,
    },
    std::{collections::BTreeMap, fs, sync::Arc},
};

const HOSTNAME_TOKEN: &str = "${hostname}";

/// Routes each record to the writer for its level. The level table is built
/// once from configuration and never mutated; a record whose level is outside
/// the configured range is silently not handled by this sink, since other
/// sinks may still service it.
pub struct LevelRouter {
    writers: BTreeMap<Level, Arc<RotatingWriter>>,
    formatter: KvTextFormatter,
}

impl LevelRouter {
    /// Build the sink. Any problem here is fatal: the process must not start
    /// with a broken sink.
    pub fn from_config(conf: &FileSinkConfig) -> Result<Self, Error> {
        fs::create_dir_all(&conf.directory)
            .map_err(|err| Error::CreateDirectory(conf.directory.clone(), err.to_string()))?;
        if !conf.directory.is_dir() {
            return Err(Error::Config(format!(
                "log directory '{}' is not a directory",
                conf.directory.display()
            )));
        }

        let filename = conf.filename.replacen(HOSTNAME_TOKEN, &hostname(), 1);
        if filename.is_empty() {
            return Err(Error::Config("filename is empty".to_owned()));
        }
        if conf.retention_days <= 0 {
            return Err(Error::Config(format!(
                "retention_days must be positive, got {}",
                conf.retention_days
            )));
        }

        let max_level: Level = conf.level.parse()?;
        let policy = if conf.rotation {
            Some(RotationPolicy::parse(&conf.rotation_interval)?)
        } else {
            None
        };

        let mut writers = BTreeMap::new();
        for level in Level::ALL.into_iter().filter(|level| *level <= max_level) {
            let target = conf.directory.join(format!("{}.{}", filename, level.file_suffix()));
            writers.insert(
                level,
                RotatingWriter::new(target, policy, conf.buffer, conf.retention_days),
            );
        }

        Ok(LevelRouter {
            writers,
            formatter: KvTextFormatter::new(),
        })
    }

    /// Deliver one record. Storage failures are logged here and never reach
    /// the emission call site.
    pub fn fire(&self, record: &LogRecord) {
        let Some(writer) = self.writers.get(&record.level) else {
            return;
        };
        let rendered = self.formatter.format(record);
        if let Err(err) = writer.write_entry(record.timestamp, &rendered) {
            eprintln!("Failed to write log entry to '{}': {}", writer.target().display(), err);
        }
    }

    /// Drain every writer's buffer, best-effort.
    pub fn flush(&self) {
        for writer in self.writers.values() {
            if let Err(err) = writer.flush() {
                eprintln!("Failed to flush '{}': {}", writer.target().display(), err);
            }
        }
    }

    /// Levels this sink services, most severe first.
    pub fn levels(&self) -> impl Iterator<Item = Level> + '_ {
        self.writers.keys().copied()
    }
}
