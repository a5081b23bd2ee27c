//! Error types for the session lifecycle.

use std::fmt;

/// Outcome classification for a failed renewal.
///
/// Cloneable because concurrent `renew()` callers share one in-flight
/// outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenewalError {
    /// The session cannot be renewed; the refresh credential was rejected
    /// or there is no session to renew. Teardown follows.
    Unrecoverable {
        /// What made the renewal unrecoverable.
        reason: String,
    },
    /// A transient failure. Credentials are untouched and the caller may
    /// retry.
    Retryable {
        /// What went wrong.
        reason: String,
    },
}

impl RenewalError {
    /// Returns true if the stored credentials survived the failure.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Retryable { .. })
    }
}

impl fmt::Display for RenewalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unrecoverable { reason } => {
                write!(f, "renewal is unrecoverable: {reason}")
            }
            Self::Retryable { reason } => {
                write!(f, "renewal failed, retry possible: {reason}")
            }
        }
    }
}

impl std::error::Error for RenewalError {}

/// Errors from session establishment and teardown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The identity provider rejected the sign-in.
    AuthenticationFailed {
        /// Provider message.
        reason: String,
    },
    /// The identity credential from the provider could not be decoded.
    InvalidCredential {
        /// Decoder message.
        reason: String,
    },
    /// The credential store could not persist the session.
    Storage {
        /// Store message.
        reason: String,
    },
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AuthenticationFailed { reason } => {
                write!(f, "authentication failed: {reason}")
            }
            Self::InvalidCredential { reason } => {
                write!(f, "provider returned an undecodable credential: {reason}")
            }
            Self::Storage { reason } => {
                write!(f, "failed to persist session: {reason}")
            }
        }
    }
}

impl std::error::Error for SessionError {}
