//! Error types for authgate-core.

use thiserror::Error;

/// Input that fails validation before any network activity.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The authorization code was empty or absent.
    #[error("authorization code is missing or empty")]
    EmptyCode,
}

/// Invalid configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// An environment variable or field held an unparseable value.
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue {
        /// Name of the offending setting.
        key: String,
        /// The raw value that failed to parse.
        value: String,
    },

    /// The API base URL is not an absolute URL.
    #[error("invalid base url {url:?}: {reason}")]
    InvalidBaseUrl {
        /// The configured URL.
        url: String,
        /// Parser message.
        reason: String,
    },

    /// A value parsed but is out of range.
    #[error("{0}")]
    OutOfRange(String),
}

impl ConfigError {
    /// Create an invalid-value error.
    pub fn invalid_value(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.into(),
            value: value.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ConfigError::invalid_value("AUTHGATE_TIMEOUT_SECS", "abc");
        assert_eq!(
            err.to_string(),
            "invalid value for AUTHGATE_TIMEOUT_SECS: \"abc\""
        );
        assert_eq!(
            ValidationError::EmptyCode.to_string(),
            "authorization code is missing or empty"
        );
    }
}
