//! Response-error classification.
//!
//! The remote service reports all failures inside the response envelope,
//! so the gateway needs a rule set to tell harmless partial-data noise
//! from authorization denials. The rules are provider-specific; the
//! default adapter matches the managed GraphQL service the portal runs
//! against.

use crate::endpoint::DataError;

/// What a response error means for the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Expected noise, suppressed. The response still counts as a
    /// success with partial data.
    Ignorable,
    /// The service rejected the session's authorization. Terminal.
    PolicyDenial,
    /// A genuine data error, surfaced to the caller untouched.
    Other,
}

/// Classifies response errors into session consequences.
pub trait ErrorClassifier: Send + Sync {
    /// Classifies one error object.
    fn classify(&self, error: &DataError) -> ErrorClass;
}

/// Default classifier for AppSync-style response errors.
///
/// - `Unauthorized` error type, or a "Not Authorized" message, is a
///   policy denial.
/// - "Cannot return null for non-nullable type" is the well-known
///   partial-data artifact of field-level filtering and is ignorable.
/// - Everything else is a plain data error.
#[derive(Debug, Clone, Copy, Default)]
pub struct AppSyncClassifier;

impl ErrorClassifier for AppSyncClassifier {
    fn classify(&self, error: &DataError) -> ErrorClass {
        if error
            .error_type
            .as_deref()
            .is_some_and(|t| t.eq_ignore_ascii_case("Unauthorized"))
            || error.message.contains("Not Authorized")
        {
            return ErrorClass::PolicyDenial;
        }
        if error
            .message
            .contains("Cannot return null for non-nullable type")
        {
            return ErrorClass::Ignorable;
        }
        ErrorClass::Other
    }
}
