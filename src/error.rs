//! Error types for inview.
//!
//! The wrapper itself validates nothing: every error here originates in the
//! host's visibility-observation primitive (or in parsing option overrides)
//! and is surfaced unmodified.

use thiserror::Error;

/// Errors raised while building a visibility monitor.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ViewError {
    /// The host does not provide a visibility-observation primitive.
    #[error("Visibility observation is not supported by this host")]
    Unsupported,

    /// The primitive rejected the configured threshold.
    #[error("Threshold {value} is out of range [0.0, 1.0]")]
    ThresholdOutOfRange {
        /// The rejected threshold.
        value: f64,
    },

    /// An options override could not be parsed.
    #[error("Invalid options: {reason}")]
    InvalidOptions {
        /// Parser message.
        reason: String,
    },

    /// Any other failure reported by the host primitive.
    #[error("Host error: {message}")]
    Host {
        /// Host-provided description.
        message: String,
    },
}

impl ViewError {
    /// Create a host error with the given message.
    #[must_use]
    pub fn host(message: impl Into<String>) -> Self {
        Self::Host {
            message: message.into(),
        }
    }

    /// Returns true if the host lacks the observation primitive.
    #[must_use]
    pub const fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported)
    }

    /// Returns true if the error was raised by the host primitive itself.
    #[must_use]
    pub const fn is_host(&self) -> bool {
        matches!(
            self,
            Self::Unsupported | Self::ThresholdOutOfRange { .. } | Self::Host { .. }
        )
    }
}

/// Result type alias for inview operations.
pub type ViewResult<T> = Result<T, ViewError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_error_message() {
        let err = ViewError::ThresholdOutOfRange { value: 1.5 };
        let msg = format!("{err}");
        assert!(msg.contains("1.5"));
        assert!(msg.contains("out of range"));
    }

    #[test]
    fn test_unsupported_classification() {
        let err = ViewError::Unsupported;
        assert!(err.is_unsupported());
        assert!(err.is_host());
    }

    #[test]
    fn test_invalid_options_is_not_host() {
        let err = ViewError::InvalidOptions {
            reason: "unknown field".to_string(),
        };
        assert!(!err.is_host());
        assert!(!err.is_unsupported());
        assert!(format!("{err}").contains("unknown field"));
    }

    #[test]
    fn test_host_constructor() {
        let err = ViewError::host("TypeError: not an element");
        assert_eq!(
            err,
            ViewError::Host {
                message: "TypeError: not an element".to_string()
            }
        );
    }
}
