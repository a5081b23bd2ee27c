//! Session state as derived from the stored credentials.
//!
//! State is never persisted. Every tick re-derives it from the store, so
//! a reloaded client converges on the correct state within one tick.

use serde::{Deserialize, Serialize};

/// The session lifecycle state derived on each tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionState {
    /// No complete credential set is stored.
    Unauthenticated,
    /// Credentials present with more validity than the warning threshold.
    Valid,
    /// Validity is inside the warning window.
    Warning {
        /// Seconds until the credential expires.
        remaining_secs: i64,
    },
    /// The credential's expiry instant has passed.
    Expired,
    /// A renewal request is in flight.
    Renewing,
    /// The user dismissed the expiry warning; teardown is imminent.
    Dismissed,
}

impl SessionState {
    /// Returns true if a complete credential set backs this state.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        !matches!(self, Self::Unauthenticated)
    }

    /// Returns true if the expiry surface should be visible.
    #[must_use]
    pub fn is_warning_surface(&self) -> bool {
        matches!(self, Self::Warning { .. } | Self::Expired)
    }
}

/// The snapshot published to UI consumers on every evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Derived lifecycle state.
    pub state: SessionState,
    /// Seconds of validity left, when the credential carries a readable
    /// expiry. Clamped to zero once expired.
    pub remaining_secs: Option<i64>,
}

impl SessionSnapshot {
    /// Snapshot for a session with no stored credentials.
    #[must_use]
    pub fn unauthenticated() -> Self {
        Self {
            state: SessionState::Unauthenticated,
            remaining_secs: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthenticated_is_not_authenticated() {
        assert!(!SessionState::Unauthenticated.is_authenticated());
        assert!(SessionState::Valid.is_authenticated());
        assert!(SessionState::Renewing.is_authenticated());
    }

    #[test]
    fn warning_and_expired_show_the_surface() {
        assert!(SessionState::Warning { remaining_secs: 120 }.is_warning_surface());
        assert!(SessionState::Expired.is_warning_surface());
        assert!(!SessionState::Valid.is_warning_surface());
        assert!(!SessionState::Dismissed.is_warning_surface());
    }

    #[test]
    fn state_serializes_with_tag() {
        let json = serde_json::to_string(&SessionState::Warning { remaining_secs: 90 })
            .expect("serialize");
        assert_eq!(json, r#"{"state":"warning","remaining_secs":90}"#);

        let json = serde_json::to_string(&SessionState::Valid).expect("serialize");
        assert_eq!(json, r#"{"state":"valid"}"#);
    }
}
