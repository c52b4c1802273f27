//! Error handling for domain-smith

use thiserror::Error;

/// Main error type for domain-smith
#[derive(Error, Debug, Clone)]
pub enum DomainSmithError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Domain '{domain}' is not registered")]
    NotRegistered { domain: String },

    #[error("WHOIS query for '{domain}' timed out after {timeout_ms}ms")]
    QueryTimeout { domain: String, timeout_ms: u64 },

    #[error("WHOIS query for '{domain}' failed: {message}")]
    QueryFailed { domain: String, message: String },

    #[error("Failed to persist WHOIS cache to {path}: {message}")]
    CachePersist { path: String, message: String },

    #[error("Network error: {message}")]
    Network {
        message: String,
        address: Option<String>,
    },

    #[error("Parse error: {message}")]
    Parse {
        message: String,
        content: Option<String>,
    },

    #[error("IO error: {message}")]
    Io {
        message: String,
        path: Option<String>,
    },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DomainSmithError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a "no match" WHOIS error
    pub fn not_registered(domain: impl Into<String>) -> Self {
        Self::NotRegistered {
            domain: domain.into(),
        }
    }

    /// Create a WHOIS timeout error
    pub fn query_timeout(domain: impl Into<String>, timeout_ms: u64) -> Self {
        Self::QueryTimeout {
            domain: domain.into(),
            timeout_ms,
        }
    }

    /// Create a generic WHOIS failure
    pub fn query_failed(domain: impl Into<String>, message: impl Into<String>) -> Self {
        Self::QueryFailed {
            domain: domain.into(),
            message: message.into(),
        }
    }

    /// Create a cache persistence error
    pub fn cache_persist(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::CachePersist {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a network error
    pub fn network(message: impl Into<String>, address: Option<String>) -> Self {
        Self::Network {
            message: message.into(),
            address,
        }
    }

    /// Create a parse error
    pub fn parse(message: impl Into<String>, content: Option<String>) -> Self {
        Self::Parse {
            message: message.into(),
            content,
        }
    }

    /// Create an IO error
    pub fn io(message: impl Into<String>, path: Option<String>) -> Self {
        Self::Io {
            message: message.into(),
            path,
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Whether this error was caused by bad caller input
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    /// Whether a retry could plausibly produce a different answer.
    ///
    /// A "no match" reply is the registry's final word on the domain.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            Self::NotRegistered { .. } | Self::Validation { .. } | Self::Config { .. }
        )
    }

    /// Reason string reported to callers for a failed WHOIS lookup
    pub fn whois_reason(&self) -> &'static str {
        match self {
            Self::NotRegistered { .. } => crate::types::REASON_NOT_REGISTERED,
            Self::QueryTimeout { .. } => crate::types::REASON_TIMEOUT,
            Self::QueryFailed { message, .. } | Self::Network { message, .. } => {
                let msg = message.to_lowercase();
                if msg.contains("no match") {
                    crate::types::REASON_NOT_REGISTERED
                } else if msg.contains("timed out") {
                    crate::types::REASON_TIMEOUT
                } else {
                    crate::types::REASON_FAILED
                }
            }
            _ => crate::types::REASON_FAILED,
        }
    }
}

impl From<serde_json::Error> for DomainSmithError {
    fn from(err: serde_json::Error) -> Self {
        Self::parse(err.to_string(), None)
    }
}

impl From<std::io::Error> for DomainSmithError {
    fn from(err: std::io::Error) -> Self {
        Self::io(err.to_string(), None)
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, DomainSmithError>;

/// Helper macros for common error patterns
#[macro_export]
macro_rules! config_error {
    ($msg:expr) => {
        $crate::error::DomainSmithError::config($msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::error::DomainSmithError::config(format!($fmt, $($arg)*))
    };
}

#[macro_export]
macro_rules! validation_error {
    ($msg:expr) => {
        $crate::error::DomainSmithError::validation($msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::error::DomainSmithError::validation(format!($fmt, $($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{REASON_FAILED, REASON_NOT_REGISTERED, REASON_TIMEOUT};

    #[test]
    fn test_whois_reason_classification() {
        assert_eq!(
            DomainSmithError::not_registered("a.com").whois_reason(),
            REASON_NOT_REGISTERED
        );
        assert_eq!(
            DomainSmithError::query_timeout("a.com", 100).whois_reason(),
            REASON_TIMEOUT
        );
        assert_eq!(
            DomainSmithError::query_failed("a.com", "No match for \"A.COM\"").whois_reason(),
            REASON_NOT_REGISTERED
        );
        assert_eq!(
            DomainSmithError::network("connection timed out", None).whois_reason(),
            REASON_TIMEOUT
        );
        assert_eq!(
            DomainSmithError::query_failed("a.com", "connection reset").whois_reason(),
            REASON_FAILED
        );
    }

    #[test]
    fn test_retryable() {
        assert!(!DomainSmithError::not_registered("a.com").is_retryable());
        assert!(DomainSmithError::query_timeout("a.com", 10).is_retryable());
        assert!(DomainSmithError::query_failed("a.com", "boom").is_retryable());
    }

    #[test]
    fn test_validation_macro() {
        let err = validation_error!("count {} exceeds {}", 21, 20);
        assert!(err.is_validation());
        assert!(err.to_string().contains("count 21 exceeds 20"));
    }
}
