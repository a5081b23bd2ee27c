//! Error types for credential decoding and storage.

use std::fmt;

/// Errors raised while decoding a credential payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimError {
    /// The credential does not have the three dot-separated segments of a
    /// compact serialization.
    WrongSegmentCount {
        /// Number of segments actually found.
        count: usize,
    },
    /// The payload segment is not valid URL-safe base64 or not UTF-8.
    PayloadEncoding {
        /// Decoder message.
        reason: String,
    },
    /// The decoded payload is not a JSON object.
    PayloadNotJson {
        /// Parser message.
        reason: String,
    },
}

impl fmt::Display for ClaimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WrongSegmentCount { count } => {
                write!(f, "credential has {count} segments, expected 3")
            }
            Self::PayloadEncoding { reason } => {
                write!(f, "credential payload is not decodable: {reason}")
            }
            Self::PayloadNotJson { reason } => {
                write!(f, "credential payload is not a JSON object: {reason}")
            }
        }
    }
}

impl std::error::Error for ClaimError {}

/// Errors raised by the credential store and its persistence backends.
#[derive(Debug)]
pub enum StoreError {
    /// The backend could not load previously persisted slots.
    LoadFailed {
        /// Backend message.
        reason: String,
    },
    /// The backend could not persist the current slots.
    PersistFailed {
        /// Backend message.
        reason: String,
    },
    /// The cached profile could not be serialized for storage.
    ProfileSerialization {
        /// Serializer message.
        reason: String,
    },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LoadFailed { reason } => {
                write!(f, "failed to load persisted credential slots: {reason}")
            }
            Self::PersistFailed { reason } => {
                write!(f, "failed to persist credential slots: {reason}")
            }
            Self::ProfileSerialization { reason } => {
                write!(f, "failed to serialize cached profile: {reason}")
            }
        }
    }
}

impl std::error::Error for StoreError {}
