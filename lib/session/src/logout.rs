//! Idempotent session teardown.
//!
//! Teardown can be requested from several places in the same tick: a
//! policy denial on a data call, a failed renewal, a dismissal. The
//! controller guarantees that only the first request clears state and
//! emits the navigation event; the rest are no-ops until the session is
//! re-armed by a successful sign-in.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use portal_access_core::LogoutReason;
use portal_access_credential::CredentialStore;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::monitor::WarningMarkers;

/// Navigation signal emitted exactly once per teardown.
///
/// Consumers route to the sign-in entry point, appending the reason's
/// query parameter when one exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogoutEvent {
    /// Why the session was torn down.
    pub reason: LogoutReason,
}

/// Coordinates forced logout across concurrent triggers.
pub struct LogoutController {
    fired: AtomicBool,
    store: Arc<CredentialStore>,
    markers: Arc<WarningMarkers>,
    events: broadcast::Sender<LogoutEvent>,
}

impl LogoutController {
    /// Creates a controller over the given store and markers.
    #[must_use]
    pub fn new(store: Arc<CredentialStore>, markers: Arc<WarningMarkers>) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            fired: AtomicBool::new(false),
            store,
            markers,
            events,
        }
    }

    /// Tears down the session, once.
    ///
    /// The first call clears the credential store, resets the warning
    /// markers, and emits one [`LogoutEvent`]. Returns true when this
    /// call performed the teardown, false when another trigger already
    /// did.
    pub fn force_logout(&self, reason: LogoutReason) -> bool {
        if self.fired.swap(true, Ordering::SeqCst) {
            debug!(%reason, "teardown already performed, ignoring trigger");
            return false;
        }

        info!(%reason, forced = reason.is_forced(), "tearing down session");
        if let Err(err) = self.store.clear() {
            // Local slots may survive, but the session is still over;
            // the event must go out regardless.
            warn!(error = %err, "failed to clear credential store during teardown");
        }
        self.markers.reset();
        let _ = self.events.send(LogoutEvent { reason });
        true
    }

    /// Re-arms the controller after a successful sign-in.
    pub fn re_arm(&self) {
        self.fired.store(false, Ordering::SeqCst);
    }

    /// Subscribes to teardown events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<LogoutEvent> {
        self.events.subscribe()
    }
}
