use {
    crate::level::Level,
    chrono::{DateTime, Local},
    std::{collections::BTreeMap, fmt},
};

/// A single tagged value attached to a [`LogRecord`].
///
/// Error-typed values are rendered by the formatter under the reserved
/// `error` key instead of their original key.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Str(String),
    Int(i64),
    Float(f64),
    Error(String),
}

impl FieldValue {
    /// Wrap anything displayable as an error-typed value.
    pub fn error(err: impl fmt::Display) -> Self {
        FieldValue::Error(err.to_string())
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Str(s) => f.write_str(s),
            FieldValue::Int(n) => write!(f, "{n}"),
            FieldValue::Float(n) => write!(f, "{n}"),
            FieldValue::Error(e) => f.write_str(e),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Str(s.to_owned())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Str(s)
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        FieldValue::Int(n)
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        FieldValue::Float(n)
    }
}

/// An already-leveled, field-tagged log record. Immutable once handed to a
/// sink; the field map keeps keys sorted so rendering is deterministic.
#[derive(Debug, Clone)]
pub struct LogRecord {
    pub level: Level,
    pub timestamp: DateTime<Local>,
    pub message: String,
    pub fields: BTreeMap<String, FieldValue>,
}

impl LogRecord {
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        LogRecord {
            level,
            timestamp: Local::now(),
            message: message.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Attach a field, replacing any previous value under the same key.
    pub fn field(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }
}
