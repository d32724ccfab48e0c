//! Error types for strap-config

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading configuration
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An explicitly requested config path does not exist.
    ///
    /// Absence of the default config file is not an error; this variant is
    /// only produced for paths the user actually named.
    #[error("Config file does not exist at {path:?}")]
    ConfigNotFound { path: String },

    /// The config document exists but is not well-formed.
    #[error("Cannot parse config file at {path:?}: line {line}: {message}")]
    ConfigParse {
        path: String,
        line: usize,
        message: String,
    },

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A raw value that matched none of the recognized boolean spellings.
///
/// Coercion treats this as recoverable and falls back to keeping the raw
/// string, so this error never aborts a load on its own.
#[derive(Debug, Clone, thiserror::Error)]
#[error("cannot interpret {raw:?} as a boolean")]
pub struct CoercionError {
    pub raw: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_not_found_display() {
        let err = Error::ConfigNotFound {
            path: "/does/not/exist.cfg".to_string(),
        };
        assert!(err.to_string().contains("/does/not/exist.cfg"));
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn test_config_parse_display_includes_line() {
        let err = Error::ConfigParse {
            path: "strap.cfg".to_string(),
            line: 7,
            message: "expected `key = value`".to_string(),
        };
        assert!(err.to_string().contains("line 7"));
        assert!(err.to_string().contains("strap.cfg"));
    }

    #[test]
    fn test_coercion_error_display() {
        let err = CoercionError {
            raw: "maybe".to_string(),
        };
        assert!(err.to_string().contains("maybe"));
    }
}
