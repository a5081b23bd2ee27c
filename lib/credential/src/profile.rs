//! Cached user profile projection.
//!
//! The profile is fetched from the identity provider's user-info surface
//! after sign-in and cached alongside the credential set. Role gating
//! reads the cached role so a data call never needs a network round trip
//! to decide whether it may run.

use portal_access_core::Role;
use serde::{Deserialize, Serialize};

use crate::claims::Claims;

/// The cached projection of the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Stable subject identifier from the identity credential.
    pub subject: String,
    /// Portal role, when the role claim was present and recognized.
    pub role: Option<Role>,
    /// Human-readable name for display surfaces.
    pub display_name: Option<String>,
    /// Contact email, when released by the provider.
    pub email: Option<String>,
    /// Whether the provider has verified the email.
    #[serde(default)]
    pub email_verified: bool,
}

impl UserProfile {
    /// Builds a minimal profile from decoded identity claims.
    ///
    /// Used as a fallback when the user-info fetch fails after a renewal.
    /// The fresh credential set is kept; only display fields are absent.
    #[must_use]
    pub fn from_claims(claims: &Claims) -> Self {
        Self {
            subject: claims.subject.clone().unwrap_or_default(),
            role: claims.role,
            display_name: None,
            email: None,
            email_verified: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_claims_carries_subject_and_role() {
        let claims = Claims {
            subject: Some("user-7".to_string()),
            expires_at: None,
            issued_at: None,
            role: Some(Role::Admin),
        };
        let profile = UserProfile::from_claims(&claims);
        assert_eq!(profile.subject, "user-7");
        assert_eq!(profile.role, Some(Role::Admin));
        assert!(profile.display_name.is_none());
    }

    #[test]
    fn deserializes_without_email_verified() {
        let profile: UserProfile = serde_json::from_str(
            r#"{"subject": "user-1", "role": "applicant", "display_name": null, "email": null}"#,
        )
        .expect("deserialize");
        assert!(!profile.email_verified);
        assert_eq!(profile.role, Some(Role::Applicant));
    }
}
