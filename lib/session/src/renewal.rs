//! Single-flight credential renewal.
//!
//! Renewal exchanges the refresh credential for a fresh set and replaces
//! the stored session in place. Concurrent callers share one in-flight
//! request; the provider sees at most one exchange at a time. A rejected
//! refresh credential ends the session, anything else leaves it intact
//! for a retry.

use std::sync::Arc;

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use portal_access_core::LogoutReason;
use portal_access_credential::{ClaimReader, CredentialStore, SessionConfig, UserProfile};
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};

use crate::error::RenewalError;
use crate::logout::LogoutController;
use crate::monitor::WarningMarkers;
use crate::provider::{IdentityProvider, ProviderError};

type InFlight = Shared<BoxFuture<'static, Result<(), RenewalError>>>;

/// Coordinates renewal requests against the identity provider.
#[derive(Clone)]
pub struct RenewalCoordinator {
    inner: Arc<RenewalInner>,
}

struct RenewalInner {
    store: Arc<CredentialStore>,
    provider: Arc<dyn IdentityProvider>,
    reader: ClaimReader,
    markers: Arc<WarningMarkers>,
    logout: Arc<LogoutController>,
    timeout: std::time::Duration,
    in_flight: Mutex<Option<InFlight>>,
}

impl RenewalCoordinator {
    /// Creates a coordinator sharing the monitor's markers and the
    /// teardown controller.
    #[must_use]
    pub fn new(
        store: Arc<CredentialStore>,
        provider: Arc<dyn IdentityProvider>,
        config: &SessionConfig,
        markers: Arc<WarningMarkers>,
        logout: Arc<LogoutController>,
    ) -> Self {
        Self {
            inner: Arc::new(RenewalInner {
                store,
                provider,
                reader: ClaimReader::new(config),
                markers,
                logout,
                timeout: config.call_timeout(),
                in_flight: Mutex::new(None),
            }),
        }
    }

    /// Renews the credential set.
    ///
    /// Joins the in-flight renewal when one exists, otherwise starts one.
    /// On success the caller continues in place with the fresh set
    /// already stored.
    pub async fn renew(&self) -> Result<(), RenewalError> {
        let shared = {
            let mut guard = self.inner.in_flight.lock().await;
            match guard.as_ref() {
                Some(in_flight) => in_flight.clone(),
                None => {
                    let inner = Arc::clone(&self.inner);
                    let in_flight: InFlight = async move {
                        let result = inner.renew_once().await;
                        inner.in_flight.lock().await.take();
                        result
                    }
                    .boxed()
                    .shared();
                    *guard = Some(in_flight.clone());
                    in_flight
                }
            }
        };
        shared.await
    }
}

impl RenewalInner {
    #[instrument(skip(self))]
    async fn renew_once(&self) -> Result<(), RenewalError> {
        let Some(set) = self.store.credentials() else {
            return Err(RenewalError::Unrecoverable {
                reason: "no stored credential set".to_string(),
            });
        };
        if self.store.profile().is_none() {
            return Err(RenewalError::Unrecoverable {
                reason: "no cached profile, session was never established".to_string(),
            });
        }

        let fresh = match tokio::time::timeout(self.timeout, self.provider.refresh(&set.refresh))
            .await
        {
            Err(_) => {
                return Err(RenewalError::Retryable {
                    reason: "identity provider timed out".to_string(),
                });
            }
            Ok(Err(ProviderError::RefreshRejected { reason })) => {
                warn!(%reason, "refresh credential rejected, tearing down session");
                self.logout.force_logout(LogoutReason::RenewalFailed);
                return Err(RenewalError::Unrecoverable { reason });
            }
            Ok(Err(err)) => {
                return Err(RenewalError::Retryable {
                    reason: err.to_string(),
                });
            }
            Ok(Ok(fresh)) => fresh,
        };

        // The refresh credential may be single-use; once the provider has
        // answered, the fresh set must be kept even if the profile
        // re-fetch fails.
        let profile = match tokio::time::timeout(
            self.timeout,
            self.provider.fetch_profile(&fresh.access),
        )
        .await
        {
            Ok(Ok(profile)) => profile,
            Ok(Err(err)) => {
                warn!(error = %err, "profile fetch failed after renewal, deriving from claims");
                self.profile_fallback(&fresh.id)?
            }
            Err(_) => {
                warn!("profile fetch timed out after renewal, deriving from claims");
                self.profile_fallback(&fresh.id)?
            }
        };

        self.store
            .set_credentials(&fresh, &profile)
            .map_err(|err| RenewalError::Retryable {
                reason: err.to_string(),
            })?;
        self.markers.reset();
        info!("credential set renewed");
        Ok(())
    }

    fn profile_fallback(&self, id_credential: &str) -> Result<UserProfile, RenewalError> {
        match self.reader.decode(id_credential) {
            Ok(claims) => Ok(UserProfile::from_claims(&claims)),
            Err(_) => self
                .store
                .profile()
                .ok_or_else(|| RenewalError::Retryable {
                    reason: "fresh identity credential undecodable and no cached profile"
                        .to_string(),
                }),
        }
    }
}
