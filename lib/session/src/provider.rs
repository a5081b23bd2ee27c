//! Identity provider interface.
//!
//! The provider owns credential issuance; the client only exchanges a
//! refresh credential for a fresh set and reads the user-info surface.
//! Provider internals (password policy, MFA, issuance) are out of scope.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use portal_access_credential::{CredentialSet, UserProfile};

/// Errors from identity provider operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// The provider rejected the sign-in credentials.
    SignInRejected {
        /// Provider message.
        reason: String,
    },
    /// The provider rejected the refresh credential as invalid or expired.
    RefreshRejected {
        /// Provider message.
        reason: String,
    },
    /// The provider could not be reached or answered with a server error.
    Unavailable {
        /// Transport or server message.
        reason: String,
    },
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SignInRejected { reason } => {
                write!(f, "sign-in rejected: {reason}")
            }
            Self::RefreshRejected { reason } => {
                write!(f, "refresh credential rejected: {reason}")
            }
            Self::Unavailable { reason } => {
                write!(f, "identity provider unavailable: {reason}")
            }
        }
    }
}

impl std::error::Error for ProviderError {}

/// Sign-in request forwarded to the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthRequest {
    /// Account identifier, typically an email address.
    pub username: String,
    /// Account secret.
    pub password: String,
}

/// The identity provider the session lifecycle talks to.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Signs in and returns a fresh credential set.
    async fn authenticate(&self, request: &AuthRequest) -> Result<CredentialSet, ProviderError>;

    /// Exchanges a refresh credential for a fresh credential set.
    async fn refresh(&self, refresh_credential: &str) -> Result<CredentialSet, ProviderError>;

    /// Reads the user-info surface with the given access credential.
    async fn fetch_profile(&self, access_credential: &str) -> Result<UserProfile, ProviderError>;

    /// Revokes the refresh credential. Best effort; teardown proceeds
    /// whether or not this succeeds.
    async fn revoke(&self, refresh_credential: &str) -> Result<(), ProviderError>;
}

/// A scriptable provider for tests.
///
/// Credential sets are handed out in order from a queue shared by
/// `authenticate` and `refresh`. Errors, once configured, are returned on
/// every subsequent call.
#[derive(Default)]
pub struct MockIdentityProvider {
    issued: Mutex<VecDeque<CredentialSet>>,
    profile: Mutex<Option<UserProfile>>,
    refresh_error: Mutex<Option<ProviderError>>,
    profile_error: Mutex<Option<ProviderError>>,
    refresh_delay: Mutex<Option<std::time::Duration>>,
    refresh_calls: AtomicUsize,
    revoke_calls: AtomicUsize,
}

impl MockIdentityProvider {
    /// Creates a provider with nothing scripted.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a credential set for the next `authenticate` or `refresh`.
    pub fn push_credentials(&self, set: CredentialSet) {
        self.lock_ignore_poison(&self.issued).push_back(set);
    }

    /// Sets the profile returned by `fetch_profile`.
    pub fn set_profile(&self, profile: UserProfile) {
        *self.lock_ignore_poison(&self.profile) = Some(profile);
    }

    /// Makes every subsequent `refresh` fail with `error`.
    pub fn fail_refresh(&self, error: ProviderError) {
        *self.lock_ignore_poison(&self.refresh_error) = Some(error);
    }

    /// Makes every subsequent `fetch_profile` fail with `error`.
    pub fn fail_profile_fetch(&self, error: ProviderError) {
        *self.lock_ignore_poison(&self.profile_error) = Some(error);
    }

    /// Delays every `refresh` by `delay` before answering.
    pub fn set_refresh_delay(&self, delay: std::time::Duration) {
        *self.lock_ignore_poison(&self.refresh_delay) = Some(delay);
    }

    /// Number of `refresh` calls observed.
    #[must_use]
    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    /// Number of `revoke` calls observed.
    #[must_use]
    pub fn revoke_calls(&self) -> usize {
        self.revoke_calls.load(Ordering::SeqCst)
    }

    fn lock_ignore_poison<'a, T>(&self, mutex: &'a Mutex<T>) -> std::sync::MutexGuard<'a, T> {
        mutex.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn pop_issued(&self) -> Option<CredentialSet> {
        self.lock_ignore_poison(&self.issued).pop_front()
    }
}

#[async_trait]
impl IdentityProvider for MockIdentityProvider {
    async fn authenticate(&self, request: &AuthRequest) -> Result<CredentialSet, ProviderError> {
        self.pop_issued().ok_or_else(|| ProviderError::SignInRejected {
            reason: format!("no scripted credentials for {}", request.username),
        })
    }

    async fn refresh(&self, _refresh_credential: &str) -> Result<CredentialSet, ProviderError> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.lock_ignore_poison(&self.refresh_delay);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(error) = self.lock_ignore_poison(&self.refresh_error).clone() {
            return Err(error);
        }
        self.pop_issued().ok_or_else(|| ProviderError::Unavailable {
            reason: "no scripted credentials".to_string(),
        })
    }

    async fn fetch_profile(&self, _access_credential: &str) -> Result<UserProfile, ProviderError> {
        if let Some(error) = self.lock_ignore_poison(&self.profile_error).clone() {
            return Err(error);
        }
        self.lock_ignore_poison(&self.profile)
            .clone()
            .ok_or_else(|| ProviderError::Unavailable {
                reason: "no scripted profile".to_string(),
            })
    }

    async fn revoke(&self, _refresh_credential: &str) -> Result<(), ProviderError> {
        self.revoke_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(tag: &str) -> CredentialSet {
        CredentialSet {
            access: format!("access-{tag}"),
            id: format!("id-{tag}"),
            refresh: format!("refresh-{tag}"),
        }
    }

    #[tokio::test]
    async fn mock_hands_out_credentials_in_order() {
        let provider = MockIdentityProvider::new();
        provider.push_credentials(set("1"));
        provider.push_credentials(set("2"));

        let first = provider.refresh("r").await.expect("first");
        let second = provider.refresh("r").await.expect("second");
        assert_eq!(first.access, "access-1");
        assert_eq!(second.access, "access-2");
        assert_eq!(provider.refresh_calls(), 2);
    }

    #[tokio::test]
    async fn mock_refresh_failure_is_sticky() {
        let provider = MockIdentityProvider::new();
        provider.fail_refresh(ProviderError::RefreshRejected {
            reason: "expired".to_string(),
        });

        let err = provider.refresh("r").await.expect_err("should fail");
        assert!(matches!(err, ProviderError::RefreshRejected { .. }));
        let err = provider.refresh("r").await.expect_err("still fails");
        assert!(matches!(err, ProviderError::RefreshRejected { .. }));
    }

    #[tokio::test]
    async fn mock_sign_in_without_script_is_rejected() {
        let provider = MockIdentityProvider::new();
        let request = AuthRequest {
            username: "sam@example.com".to_string(),
            password: "hunter2".to_string(),
        };
        let err = provider.authenticate(&request).await.expect_err("rejected");
        assert!(matches!(err, ProviderError::SignInRejected { .. }));
    }
}
