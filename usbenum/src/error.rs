//! Error types for usbenum.

use std::time::Duration;
use thiserror::Error;

/// Result type for usbenum operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Message used when the registry fails without saying why.
pub(crate) const UNSPECIFIED_FAILURE: &str = "device registry query failed";

/// Error type for usbenum operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The platform device registry could not be queried.
    #[error("Platform unavailable: {0}")]
    PlatformUnavailable(String),

    /// The device registry did not answer within the configured bound.
    #[error("Timeout: device registry did not answer within {}ms", .0.as_millis())]
    Timeout(Duration),
}

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorKind {
    /// Any failure raised by the underlying registry query.
    PlatformUnavailable,
    /// The registry query exceeded the caller's timeout.
    Timeout,
}

impl ErrorKind {
    /// Stable error code reported to callers.
    pub fn code(self) -> &'static str {
        match self {
            Self::PlatformUnavailable => "USB_ERROR",
            Self::Timeout => "USB_TIMEOUT",
        }
    }
}

impl Error {
    /// Build a `PlatformUnavailable` error, substituting a fallback for an
    /// empty message.
    pub fn platform_unavailable(message: impl Into<String>) -> Self {
        let message = message.into();
        if message.trim().is_empty() {
            Self::PlatformUnavailable(UNSPECIFIED_FAILURE.to_string())
        } else {
            Self::PlatformUnavailable(message)
        }
    }

    /// The kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::PlatformUnavailable(_) => ErrorKind::PlatformUnavailable,
            Self::Timeout(_) => ErrorKind::Timeout,
        }
    }

    /// Shorthand for `self.kind().code()`.
    pub fn code(&self) -> &'static str {
        self.kind().code()
    }

    /// The underlying message without the kind prefix.
    pub fn message(&self) -> String {
        match self {
            Self::PlatformUnavailable(message) => message.clone(),
            Self::Timeout(bound) => format!(
                "device registry did not answer within {}ms",
                bound.as_millis()
            ),
        }
    }
}
