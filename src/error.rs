use std::path::PathBuf;

/// Errors that can occur when configuring or driving a file sink.
///
/// Configuration problems are fatal at initialization; everything else is
/// recoverable and is logged rather than propagated to the call site that
/// emitted the record.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid sink config: {0}")]
    Config(String),
    #[error("failed to create log directory '{0}': {1}")]
    CreateDirectory(PathBuf, String),
    #[error("failed to rename '{from}' to '{to}': {error}")]
    Rename {
        from: PathBuf,
        to: PathBuf,
        error: String,
    },
    #[error("failed to acquire file lock '{0}': {1}")]
    Lock(PathBuf, String),
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),
}
