//! Claim decoding for compact-serialized credentials.
//!
//! The reader splits the three-segment compact form, base64-decodes the
//! payload segment, and extracts the handful of claims the client acts
//! on. Signatures are not verified here; the provider and the transport
//! own credential integrity, and the server re-checks authorization on
//! every call.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use portal_access_core::Role;
use serde_json::Value;
use tracing::debug;

use crate::config::SessionConfig;
use crate::error::ClaimError;

/// Claims the client reads from a credential payload.
///
/// Every field is optional. A claim that is absent or unreadable decodes
/// to `None` rather than failing the whole payload, so a provider that
/// omits `iat` or uses a nonstandard `exp` encoding does not take the
/// session down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Stable subject identifier.
    pub subject: Option<String>,
    /// Expiry instant, when `exp` was present and numeric.
    pub expires_at: Option<DateTime<Utc>>,
    /// Issuance instant, when `iat` was present and numeric.
    pub issued_at: Option<DateTime<Utc>>,
    /// Portal role mapped from the configured role claim.
    pub role: Option<Role>,
}

impl Claims {
    /// Remaining validity relative to `now`.
    ///
    /// `None` when the credential carries no readable expiry, which the
    /// caller must treat as indeterminate rather than valid.
    #[must_use]
    pub fn remaining(&self, now: DateTime<Utc>) -> Option<chrono::Duration> {
        self.expires_at.map(|exp| exp - now)
    }

    /// Returns true if the credential is expired relative to `now`.
    ///
    /// A credential without a readable expiry is not reported as expired;
    /// it is indeterminate and handled by the caller's policy.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        matches!(self.expires_at, Some(exp) if exp <= now)
    }
}

/// Decodes credential payloads using the configured claim mapping.
#[derive(Debug, Clone)]
pub struct ClaimReader {
    role_claim: String,
    admin_value: String,
    applicant_value: String,
}

impl ClaimReader {
    /// Creates a reader with the claim mapping from `config`.
    #[must_use]
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            role_claim: config.role_claim().to_string(),
            admin_value: config.admin_role_value().to_string(),
            applicant_value: config.applicant_role_value().to_string(),
        }
    }

    /// Decodes the payload of a compact-serialized credential.
    ///
    /// Fails only on structural problems: wrong segment count, payload
    /// that is not base64 or not UTF-8, or a payload that is not a JSON
    /// object. Individual claims that are absent or of an unexpected
    /// shape decode to `None`.
    pub fn decode(&self, credential: &str) -> Result<Claims, ClaimError> {
        let segments: Vec<&str> = credential.split('.').collect();
        if segments.len() != 3 {
            return Err(ClaimError::WrongSegmentCount {
                count: segments.len(),
            });
        }

        let payload = URL_SAFE_NO_PAD
            .decode(segments[1])
            .map_err(|err| ClaimError::PayloadEncoding {
                reason: err.to_string(),
            })?;
        let payload = String::from_utf8(payload).map_err(|err| ClaimError::PayloadEncoding {
            reason: err.to_string(),
        })?;

        let value: Value =
            serde_json::from_str(&payload).map_err(|err| ClaimError::PayloadNotJson {
                reason: err.to_string(),
            })?;
        let object = value.as_object().ok_or_else(|| ClaimError::PayloadNotJson {
            reason: "payload is not an object".to_string(),
        })?;

        let subject = object
            .get("sub")
            .and_then(Value::as_str)
            .map(str::to_string);
        let expires_at = object.get("exp").and_then(Self::timestamp_claim);
        let issued_at = object.get("iat").and_then(Self::timestamp_claim);
        if object.contains_key("exp") && expires_at.is_none() {
            debug!("exp claim present but unreadable, treating validity as indeterminate");
        }

        let role = object
            .get(&self.role_claim)
            .and_then(|value| self.map_role(value));

        Ok(Claims {
            subject,
            expires_at,
            issued_at,
            role,
        })
    }

    /// Reads a numeric epoch-seconds claim, tolerating float encodings.
    fn timestamp_claim(value: &Value) -> Option<DateTime<Utc>> {
        let secs = match value {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64))?,
            _ => return None,
        };
        DateTime::from_timestamp(secs, 0)
    }

    /// Maps the role claim to a portal role.
    ///
    /// Providers deliver the claim either as a plain string or as an
    /// array of role strings. Matching is case-insensitive; an array
    /// resolves to the highest-privilege recognized entry.
    fn map_role(&self, value: &Value) -> Option<Role> {
        match value {
            Value::String(s) => self.match_role_value(s),
            Value::Array(entries) => {
                let roles: Vec<Role> = entries
                    .iter()
                    .filter_map(Value::as_str)
                    .filter_map(|s| self.match_role_value(s))
                    .collect();
                if roles.contains(&Role::Admin) {
                    Some(Role::Admin)
                } else {
                    roles.first().copied()
                }
            }
            _ => None,
        }
    }

    fn match_role_value(&self, value: &str) -> Option<Role> {
        if value.eq_ignore_ascii_case(&self.admin_value) {
            Some(Role::Admin)
        } else if value.eq_ignore_ascii_case(&self.applicant_value) {
            Some(Role::Applicant)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn encode_credential(payload: &Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"RS256","typ":"JWT"}"#);
        let body = URL_SAFE_NO_PAD.encode(payload.to_string());
        format!("{header}.{body}.signature")
    }

    fn reader() -> ClaimReader {
        ClaimReader::new(&SessionConfig::default())
    }

    #[test]
    fn decodes_standard_claims() {
        let credential = encode_credential(&json!({
            "sub": "user-42",
            "exp": 1_900_000_000,
            "iat": 1_899_996_400,
            "custom:role": "applicant",
        }));

        let claims = reader().decode(&credential).expect("decode");
        assert_eq!(claims.subject.as_deref(), Some("user-42"));
        assert_eq!(
            claims.expires_at,
            DateTime::from_timestamp(1_900_000_000, 0)
        );
        assert_eq!(claims.role, Some(Role::Applicant));
    }

    #[test]
    fn rejects_wrong_segment_count() {
        let err = reader().decode("only.two").expect_err("should fail");
        assert_eq!(err, ClaimError::WrongSegmentCount { count: 2 });
    }

    #[test]
    fn rejects_garbage_payload() {
        let err = reader()
            .decode("header.!!!not-base64!!!.sig")
            .expect_err("should fail");
        assert!(matches!(err, ClaimError::PayloadEncoding { .. }));
    }

    #[test]
    fn rejects_non_object_payload() {
        let body = URL_SAFE_NO_PAD.encode("[1, 2, 3]");
        let err = reader()
            .decode(&format!("h.{body}.s"))
            .expect_err("should fail");
        assert!(matches!(err, ClaimError::PayloadNotJson { .. }));
    }

    #[test]
    fn unreadable_exp_is_indeterminate_not_fatal() {
        let credential = encode_credential(&json!({
            "sub": "user-42",
            "exp": "not-a-number",
        }));

        let claims = reader().decode(&credential).expect("decode");
        assert!(claims.expires_at.is_none());
        assert!(claims.remaining(Utc::now()).is_none());
        assert!(!claims.is_expired(Utc::now()));
    }

    #[test]
    fn missing_role_claim_decodes_to_none() {
        let credential = encode_credential(&json!({"sub": "user-42"}));
        let claims = reader().decode(&credential).expect("decode");
        assert!(claims.role.is_none());
    }

    #[test]
    fn role_claim_matches_case_insensitively() {
        let credential = encode_credential(&json!({"custom:role": "Administrator"}));
        let claims = reader().decode(&credential).expect("decode");
        assert_eq!(claims.role, Some(Role::Admin));
    }

    #[test]
    fn array_role_claim_prefers_admin() {
        let credential = encode_credential(&json!({
            "custom:role": ["applicant", "administrator"],
        }));
        let claims = reader().decode(&credential).expect("decode");
        assert_eq!(claims.role, Some(Role::Admin));
    }

    #[test]
    fn unrecognized_role_value_is_none() {
        let credential = encode_credential(&json!({"custom:role": "reviewer"}));
        let claims = reader().decode(&credential).expect("decode");
        assert!(claims.role.is_none());
    }

    #[test]
    fn custom_claim_mapping_is_honored() {
        let config = SessionConfig::builder()
            .role_claim("portal:access")
            .admin_role_value("super")
            .build();
        let reader = ClaimReader::new(&config);

        let credential = encode_credential(&json!({"portal:access": "super"}));
        let claims = reader.decode(&credential).expect("decode");
        assert_eq!(claims.role, Some(Role::Admin));
    }

    #[test]
    fn remaining_is_negative_after_expiry() {
        let now = Utc::now();
        let claims = Claims {
            subject: None,
            expires_at: Some(now - chrono::Duration::seconds(10)),
            issued_at: None,
            role: None,
        };
        assert!(claims.remaining(now).expect("remaining") < chrono::Duration::zero());
        assert!(claims.is_expired(now));
    }
}
