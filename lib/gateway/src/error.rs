//! Error types for gated data calls.

use std::fmt;

use portal_access_core::Role;

use crate::endpoint::DataError;

/// What a gated call can fail with.
///
/// Only `AuthorizationDenied`, `NoCredential`, `MissingRoleClaim`, and
/// `InvalidCredential` have session consequences; the rest leave the
/// session untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// No profile is cached; nobody is signed in.
    NotSignedIn,
    /// The caller's role does not satisfy the domain's requirement.
    Forbidden {
        /// Role the domain requires.
        required: Role,
        /// Role the caller holds.
        actual: Role,
    },
    /// The profile is present but the credential slots are empty.
    /// Teardown has been triggered.
    NoCredential,
    /// The identity credential could not be decoded. Teardown has been
    /// triggered.
    InvalidCredential {
        /// Decoder message.
        reason: String,
    },
    /// The identity credential carries no recognized role claim.
    /// Teardown has been triggered.
    MissingRoleClaim,
    /// The service denied the session's authorization. Teardown has been
    /// triggered.
    AuthorizationDenied,
    /// The call never produced a response: unreachable service, broken
    /// connection, or timeout. Transient; safe to retry.
    Transport {
        /// Transport message.
        reason: String,
    },
    /// The service answered with genuine data errors.
    Data {
        /// Error objects, surfaced untouched.
        errors: Vec<DataError>,
    },
}

impl GatewayError {
    /// Returns true if retrying the call without any session change can
    /// succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotSignedIn => {
                write!(f, "no user is signed in")
            }
            Self::Forbidden { required, actual } => {
                write!(f, "operation requires {required} role, caller is {actual}")
            }
            Self::NoCredential => {
                write!(f, "no credential in local state")
            }
            Self::InvalidCredential { reason } => {
                write!(f, "stored identity credential is undecodable: {reason}")
            }
            Self::MissingRoleClaim => {
                write!(f, "identity credential carries no role claim")
            }
            Self::AuthorizationDenied => {
                write!(f, "service denied the session's authorization")
            }
            Self::Transport { reason } => {
                write!(f, "data call failed in transport: {reason}")
            }
            Self::Data { errors } => {
                write!(f, "data call returned {} error(s)", errors.len())
            }
        }
    }
}

impl std::error::Error for GatewayError {}
