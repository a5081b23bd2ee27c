//! Forced-logout reason codes.
//!
//! When the session is torn down, the sign-in surface is told why via a
//! machine-readable reason that becomes a query parameter on the redirect.
//! Voluntary sign-out carries no parameter; the sign-in surface shows no
//! error banner for a deliberate exit.

use serde::{Deserialize, Serialize};

/// Why a session was torn down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogoutReason {
    /// A data call found no credential in local state.
    NoToken,
    /// The identity credential carries no role claim.
    MissingRole,
    /// The identity credential could not be decoded.
    InvalidToken,
    /// The server rejected the session's authorization.
    AuthExpired,
    /// Renewal failed because the refresh credential is no longer valid.
    RenewalFailed,
    /// The user dismissed the renewal prompt without renewing.
    UserDismissed,
    /// The user signed out deliberately.
    UserInitiated,
}

impl LogoutReason {
    /// Returns the query-parameter value for the sign-in redirect.
    ///
    /// `None` for a user-initiated sign-out, which navigates without a
    /// reason parameter.
    #[must_use]
    pub fn as_query_param(&self) -> Option<&'static str> {
        match self {
            Self::NoToken => Some("no_token"),
            Self::MissingRole => Some("missing_role"),
            Self::InvalidToken => Some("invalid_token"),
            Self::AuthExpired => Some("auth_expired"),
            Self::RenewalFailed => Some("renewal_failed"),
            Self::UserDismissed => Some("user_dismissed"),
            Self::UserInitiated => None,
        }
    }

    /// Returns true if this teardown was triggered by the platform rather
    /// than by an explicit user action.
    #[must_use]
    pub fn is_forced(&self) -> bool {
        !matches!(self, Self::UserInitiated)
    }
}

impl std::fmt::Display for LogoutReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.as_query_param() {
            Some(code) => write!(f, "{code}"),
            None => write!(f, "user_initiated"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forced_reasons_have_query_params() {
        assert_eq!(LogoutReason::NoToken.as_query_param(), Some("no_token"));
        assert_eq!(
            LogoutReason::MissingRole.as_query_param(),
            Some("missing_role")
        );
        assert_eq!(
            LogoutReason::InvalidToken.as_query_param(),
            Some("invalid_token")
        );
        assert_eq!(
            LogoutReason::AuthExpired.as_query_param(),
            Some("auth_expired")
        );
        assert_eq!(
            LogoutReason::RenewalFailed.as_query_param(),
            Some("renewal_failed")
        );
        assert_eq!(
            LogoutReason::UserDismissed.as_query_param(),
            Some("user_dismissed")
        );
    }

    #[test]
    fn user_initiated_has_no_query_param() {
        assert_eq!(LogoutReason::UserInitiated.as_query_param(), None);
        assert!(!LogoutReason::UserInitiated.is_forced());
    }

    #[test]
    fn all_other_reasons_are_forced() {
        assert!(LogoutReason::NoToken.is_forced());
        assert!(LogoutReason::AuthExpired.is_forced());
        assert!(LogoutReason::UserDismissed.is_forced());
    }

    #[test]
    fn reason_serialization_matches_redirect_codes() {
        let json = serde_json::to_string(&LogoutReason::AuthExpired).expect("serialize");
        assert_eq!(json, "\"auth_expired\"");
    }
}
