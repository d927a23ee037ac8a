use {
    crate::error::Error,
    serde::Deserialize,
    std::{fs, path::Path, path::PathBuf},
};

fn default_level() -> String {
    "info".to_owned()
}

fn default_rotation() -> bool {
    true
}

fn default_rotation_interval() -> String {
    "D".to_owned()
}

fn default_retention_days() -> i64 {
    30
}

/// Configuration for one file sink, deserialized from YAML. Malformed or
/// unreadable input is fatal at initialization; a process must not start
/// with a broken sink.
///
/// ```yaml
/// directory: /var/log/myapp
/// filename: myapp-${hostname}.log
/// level: info
/// rotation: true
/// rotation_interval: D
/// buffer: false
/// retention_days: 30
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct FileSinkConfig {
    /// Directory holding the live files; created at startup if missing.
    pub directory: PathBuf,
    /// Base name of the live files; a `${hostname}` token is replaced once
    /// at startup.
    pub filename: String,
    /// Least severe level this sink services.
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default = "default_rotation")]
    pub rotation: bool,
    /// `[count]Unit` with Unit one of D, H, M, S.
    #[serde(default = "default_rotation_interval")]
    pub rotation_interval: String,
    #[serde(default)]
    pub buffer: bool,
    /// Backups older than this are pruned after each rotation.
    #[serde(default = "default_retention_days")]
    pub retention_days: i64,
}

impl FileSinkConfig {
    pub fn from_yaml_str(text: &str) -> Result<Self, Error> {
        let mut conf: FileSinkConfig =
            serde_yaml::from_str(text).map_err(|err| Error::Config(format!("malformed sink config: {err}")))?;
        conf.level = conf.level.to_lowercase();
        conf.rotation_interval = conf.rotation_interval.to_uppercase();
        Ok(conf)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|err| Error::Config(format!("failed to read sink config '{}': {err}", path.display())))?;
        Self::from_yaml_str(&text)
    }
}
