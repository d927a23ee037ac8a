use crate::record::{FieldValue, LogRecord};

const FIELD_LOG_TIME: &str = "log_time";
const FIELD_LEVEL: &str = "level";
const FIELD_HOST: &str = "host";
const FIELD_MESSAGE: &str = "msg";
const FIELD_ERROR: &str = "error";

const DEFAULT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Renders a record as one `key=value` line. Key order is log_time, level,
/// host, then user fields in sorted key order, then `msg` last. Values
/// containing tab, CR or LF are quoted.
pub struct KvTextFormatter {
    timestamp_format: String,
    separator: u8,
    disable_timestamp: bool,
    hostname: String,
}

impl KvTextFormatter {
    pub fn new() -> Self {
        KvTextFormatter {
            timestamp_format: DEFAULT_TIMESTAMP_FORMAT.to_owned(),
            separator: b'\t',
            disable_timestamp: false,
            hostname: hostname(),
        }
    }

    pub fn timestamp_format(mut self, format: impl Into<String>) -> Self {
        self.timestamp_format = format.into();
        self
    }

    pub fn separator(mut self, separator: u8) -> Self {
        self.separator = separator;
        self
    }

    /// Omit the leading timestamp, useful when output is redirected to a
    /// system that adds its own.
    pub fn disable_timestamp(mut self) -> Self {
        self.disable_timestamp = true;
        self
    }

    pub fn hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = hostname.into();
        self
    }

    /// Render a single record, newline terminated.
    pub fn format(&self, record: &LogRecord) -> Vec<u8> {
        let mut buf = Vec::with_capacity(256);
        if !self.disable_timestamp {
            let stamp = record.timestamp.format(&self.timestamp_format).to_string();
            // The timestamp format is trusted, never quoted
            self.append_raw(&mut buf, FIELD_LOG_TIME, &stamp);
        }
        self.append_kv(&mut buf, FIELD_LEVEL, record.level.file_suffix());
        self.append_kv(&mut buf, FIELD_HOST, &self.hostname);
        for (key, value) in &record.fields {
            match value {
                FieldValue::Error(e) => self.append_kv(&mut buf, FIELD_ERROR, e),
                other => self.append_kv(&mut buf, key, &other.to_string()),
            }
        }
        if !record.message.is_empty() {
            self.append_kv(&mut buf, FIELD_MESSAGE, &record.message);
        }
        buf.push(b'\n');
        buf
    }

    fn append_kv(&self, buf: &mut Vec<u8>, key: &str, value: &str) {
        if needs_quoting(value) {
            let quoted = format!("{value:?}");
            self.append_raw(buf, key, &quoted);
        } else {
            self.append_raw(buf, key, value);
        }
    }

    fn append_raw(&self, buf: &mut Vec<u8>, key: &str, value: &str) {
        if !buf.is_empty() {
            buf.push(self.separator);
        }
        buf.extend_from_slice(key.as_bytes());
        buf.push(b'=');
        buf.extend_from_slice(value.as_bytes());
    }
}

impl Default for KvTextFormatter {
    fn default() -> Self {
        Self::new()
    }
}

fn needs_quoting(text: &str) -> bool {
    text.chars().any(|ch| matches!(ch, '\t' | '\r' | '\n'))
}

/// Resolve the machine's hostname once, falling back to `localhost`.
pub(crate) fn hostname() -> String {
    #[cfg(unix)]
    {
        nix::unistd::gethostname()
            .ok()
            .and_then(|h| h.into_string().ok())
            .unwrap_or_else(|| "localhost".to_owned())
    }
    #[cfg(not(unix))]
    {
        std::env::var("COMPUTERNAME")
            .or_else(|_| std::env::var("HOSTNAME"))
            .unwrap_or_else(|_| "localhost".to_owned())
    }
}
