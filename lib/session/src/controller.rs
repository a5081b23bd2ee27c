//! Session controller: the wiring point for the session lifecycle.
//!
//! The controller owns the monitor, the renewal coordinator, and the
//! teardown controller, and exposes the handful of actions the
//! application shell calls: sign in, renew, dismiss, sign out. Data-call
//! gating lives in the gateway crate, which shares the store and the
//! teardown controller created here.

use std::sync::Arc;

use portal_access_core::LogoutReason;
use portal_access_credential::{ClaimReader, CredentialStore, SessionConfig, UserProfile};
use rootcause::prelude::Report;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::error::{RenewalError, SessionError};
use crate::logout::{LogoutController, LogoutEvent};
use crate::monitor::{SessionMonitor, WarningMarkers};
use crate::provider::{AuthRequest, IdentityProvider};
use crate::renewal::RenewalCoordinator;
use crate::state::SessionSnapshot;

/// Owns the session lifecycle for one signed-in user at a time.
pub struct SessionController {
    store: Arc<CredentialStore>,
    provider: Arc<dyn IdentityProvider>,
    config: SessionConfig,
    reader: ClaimReader,
    monitor: Arc<SessionMonitor>,
    renewal: RenewalCoordinator,
    logout: Arc<LogoutController>,
}

impl SessionController {
    /// Wires a controller over the given store and provider.
    #[must_use]
    pub fn new(
        store: Arc<CredentialStore>,
        provider: Arc<dyn IdentityProvider>,
        config: SessionConfig,
    ) -> Self {
        let markers = Arc::new(WarningMarkers::default());
        let monitor = Arc::new(SessionMonitor::new(
            Arc::clone(&store),
            config.clone(),
            Arc::clone(&markers),
        ));
        let logout = Arc::new(LogoutController::new(
            Arc::clone(&store),
            Arc::clone(&markers),
        ));
        let renewal = RenewalCoordinator::new(
            Arc::clone(&store),
            Arc::clone(&provider),
            &config,
            markers,
            Arc::clone(&logout),
        );
        let reader = ClaimReader::new(&config);
        Self {
            store,
            provider,
            config,
            reader,
            monitor,
            renewal,
            logout,
        }
    }

    /// Starts the background session monitor.
    pub fn start(&self) -> JoinHandle<()> {
        self.monitor.start()
    }

    /// Stops the background session monitor.
    pub fn stop(&self) {
        self.monitor.stop();
    }

    /// Signs in through the identity provider and establishes the session.
    ///
    /// On success the credential set and profile are stored, the teardown
    /// controller is re-armed, and the monitor picks up the new state on
    /// its next evaluation.
    #[instrument(skip(self, request), fields(username = %request.username))]
    pub async fn authenticate(
        &self,
        request: &AuthRequest,
    ) -> Result<UserProfile, Report<SessionError>> {
        let set = tokio::time::timeout(
            self.config.call_timeout(),
            self.provider.authenticate(request),
        )
        .await
        .map_err(|_| SessionError::AuthenticationFailed {
            reason: "identity provider timed out".to_string(),
        })?
        .map_err(|err| SessionError::AuthenticationFailed {
            reason: err.to_string(),
        })?;

        let profile = match tokio::time::timeout(
            self.config.call_timeout(),
            self.provider.fetch_profile(&set.access),
        )
        .await
        {
            Ok(Ok(profile)) => profile,
            Ok(Err(err)) => {
                debug!(error = %err, "user-info fetch failed at sign-in, deriving from claims");
                self.claims_profile(&set.id)?
            }
            Err(_) => {
                debug!("user-info fetch timed out at sign-in, deriving from claims");
                self.claims_profile(&set.id)?
            }
        };

        self.store
            .set_credentials(&set, &profile)
            .map_err(|err| SessionError::Storage {
                reason: err.to_string(),
            })?;
        self.logout.re_arm();
        self.monitor.markers().reset();
        self.monitor.publish_tick();
        info!(subject = %profile.subject, "session established");
        Ok(profile)
    }

    /// Renews the credential set, surfacing `Renewing` while in flight.
    pub async fn renew(&self) -> Result<(), RenewalError> {
        self.monitor.set_renewing();
        let result = self.renewal.renew().await;
        self.monitor.publish_tick();
        result
    }

    /// Records the user's dismissal of the expiry warning and tears the
    /// session down. Dismissal is decline-and-exit; there is no
    /// keep-working-without-renewing mode.
    pub fn dismiss_warning(&self) {
        self.monitor.dismiss();
        self.logout.force_logout(LogoutReason::UserDismissed);
    }

    /// Signs out deliberately.
    ///
    /// Revocation is best effort; teardown proceeds regardless. The
    /// emitted event carries no redirect reason code.
    pub async fn sign_out(&self) {
        if let Some(set) = self.store.credentials() {
            match tokio::time::timeout(
                self.config.call_timeout(),
                self.provider.revoke(&set.refresh),
            )
            .await
            {
                Ok(Ok(())) => debug!("refresh credential revoked"),
                Ok(Err(err)) => {
                    warn!(error = %err, "credential revocation failed, continuing teardown");
                }
                Err(_) => warn!("credential revocation timed out, continuing teardown"),
            }
        }
        self.logout.force_logout(LogoutReason::UserInitiated);
    }

    /// Tears down the session with the given reason. Idempotent.
    pub fn force_logout(&self, reason: LogoutReason) -> bool {
        self.logout.force_logout(reason)
    }

    /// Subscribes to session snapshots for UI consumption.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.monitor.subscribe()
    }

    /// The most recently published snapshot.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.monitor.snapshot()
    }

    /// Subscribes to teardown events.
    #[must_use]
    pub fn logout_events(&self) -> broadcast::Receiver<LogoutEvent> {
        self.logout.subscribe()
    }

    /// The shared teardown controller, for wiring into the gateway.
    #[must_use]
    pub fn logout_controller(&self) -> Arc<LogoutController> {
        Arc::clone(&self.logout)
    }

    /// The shared credential store, for wiring into the gateway.
    #[must_use]
    pub fn store(&self) -> Arc<CredentialStore> {
        Arc::clone(&self.store)
    }

    fn claims_profile(&self, id_credential: &str) -> Result<UserProfile, Report<SessionError>> {
        let claims =
            self.reader
                .decode(id_credential)
                .map_err(|err| SessionError::InvalidCredential {
                    reason: err.to_string(),
                })?;
        Ok(UserProfile::from_claims(&claims))
    }
}
