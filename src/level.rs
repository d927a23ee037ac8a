use {crate::error::Error, std::str::FromStr};

/// Severity of a log record. More severe levels sort first, so a sink
/// configured with `Level::Info` services `Error`, `Warning` and `Info`
/// but not `Debug`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    Error,
    Warning,
    Info,
    Debug,
}

impl Level {
    /// All levels, most severe first.
    pub const ALL: [Level; 4] = [Level::Error, Level::Warning, Level::Info, Level::Debug];

    /// The full lower-case level name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Error => "error",
            Level::Warning => "warning",
            Level::Info => "info",
            Level::Debug => "debug",
        }
    }

    /// The token appended to the live file name for this level. `warning`
    /// is abbreviated to its first four characters.
    pub fn file_suffix(&self) -> &'static str {
        match self {
            Level::Warning => "warn",
            other => other.as_str(),
        }
    }
}

impl FromStr for Level {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "error" => Ok(Level::Error),
            "warn" | "warning" => Ok(Level::Warning),
            "info" => Ok(Level::Info),
            "debug" => Ok(Level::Debug),
            other => Err(Error::Config(format!("unrecognized log level '{other}'"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_orders_most_severe_first() {
        assert!(Level::Error < Level::Warning);
        assert!(Level::Warning < Level::Info);
        assert!(Level::Info < Level::Debug);
    }

    #[test]
    fn parse_accepts_aliases_and_case() {
        assert_eq!("WARN".parse::<Level>().unwrap(), Level::Warning);
        assert_eq!("Warning".parse::<Level>().unwrap(), Level::Warning);
        assert_eq!(" info ".parse::<Level>().unwrap(), Level::Info);
        assert!("trace".parse::<Level>().is_err());
    }

    #[test]
    fn warning_suffix_is_abbreviated() {
        assert_eq!(Level::Warning.file_suffix(), "warn");
        assert_eq!(Level::Error.file_suffix(), "error");
    }
}
