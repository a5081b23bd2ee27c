//! Session monitor: periodic validity evaluation and state publication.
//!
//! The monitor derives the session state from the credential store on a
//! fixed cadence, plus immediately whenever the store changes. Evaluation
//! is read-only and side-effect free apart from the warning markers. The
//! published snapshot is the expiry surface; consumers render whatever
//! state it carries.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use portal_access_credential::{ClaimReader, CredentialStore, SessionConfig};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::state::{SessionSnapshot, SessionState};

/// Warning lifecycle markers, one pair per credential lifetime.
///
/// `raised` records that the expiry surface has been requested once;
/// `dismissed` records that the user declined to renew. Renewal and
/// teardown reset both, restoring warning eligibility for the next
/// credential set.
#[derive(Debug, Default)]
pub struct WarningMarkers {
    raised: AtomicBool,
    dismissed: AtomicBool,
}

impl WarningMarkers {
    /// Marks the warning as raised. Returns true only on the first call
    /// since the last reset.
    pub fn raise(&self) -> bool {
        !self.raised.swap(true, Ordering::SeqCst)
    }

    /// Marks the warning as dismissed for this credential lifetime.
    pub fn dismiss(&self) {
        self.dismissed.store(true, Ordering::SeqCst);
    }

    /// Whether the warning has been raised since the last reset.
    #[must_use]
    pub fn is_raised(&self) -> bool {
        self.raised.load(Ordering::SeqCst)
    }

    /// Whether the user dismissed the warning since the last reset.
    #[must_use]
    pub fn is_dismissed(&self) -> bool {
        self.dismissed.load(Ordering::SeqCst)
    }

    /// Clears both markers. Called after renewal and teardown.
    pub fn reset(&self) {
        self.raised.store(false, Ordering::SeqCst);
        self.dismissed.store(false, Ordering::SeqCst);
    }
}

/// Derives and publishes the session state.
pub struct SessionMonitor {
    store: Arc<CredentialStore>,
    reader: ClaimReader,
    config: SessionConfig,
    markers: Arc<WarningMarkers>,
    snapshot: watch::Sender<SessionSnapshot>,
    stop: Mutex<Option<watch::Sender<bool>>>,
}

impl SessionMonitor {
    /// Creates a monitor over `store` with the given markers.
    #[must_use]
    pub fn new(
        store: Arc<CredentialStore>,
        config: SessionConfig,
        markers: Arc<WarningMarkers>,
    ) -> Self {
        let reader = ClaimReader::new(&config);
        let (snapshot, _) = watch::channel(SessionSnapshot::unauthenticated());
        Self {
            store,
            reader,
            config,
            markers,
            snapshot,
            stop: Mutex::new(None),
        }
    }

    /// Subscribes to published snapshots.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot.subscribe()
    }

    /// The most recently published snapshot.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        *self.snapshot.borrow()
    }

    /// The markers shared with renewal and teardown.
    #[must_use]
    pub fn markers(&self) -> Arc<WarningMarkers> {
        Arc::clone(&self.markers)
    }

    /// Derives the session state at `now` without publishing.
    ///
    /// Read failures are absorbed: an undecodable credential or an
    /// unreadable expiry leaves the previous snapshot in place rather
    /// than forcing a transition.
    pub fn evaluate(&self, now: DateTime<Utc>) -> SessionSnapshot {
        let Some(set) = self.store.credentials() else {
            return SessionSnapshot::unauthenticated();
        };

        let claims = match self
            .reader
            .decode(&set.id)
            .or_else(|_| self.reader.decode(&set.access))
        {
            Ok(claims) => claims,
            Err(err) => {
                debug!(error = %err, "stored credential undecodable, skipping evaluation");
                return self.snapshot();
            }
        };

        let Some(remaining) = claims.remaining(now) else {
            debug!("credential carries no readable expiry, skipping evaluation");
            return self.snapshot();
        };
        let remaining_secs = remaining.num_seconds().max(0);

        if self.markers.is_dismissed() {
            return SessionSnapshot {
                state: SessionState::Dismissed,
                remaining_secs: Some(remaining_secs),
            };
        }

        if remaining.num_seconds() <= 0 {
            if self.markers.raise() {
                info!("credential expired before any warning, raising expiry surface");
            }
            return SessionSnapshot {
                state: SessionState::Expired,
                remaining_secs: Some(0),
            };
        }

        if remaining <= self.config.warning_threshold() {
            if self.markers.raise() {
                info!(remaining_secs, "expiry warning raised");
            }
            return SessionSnapshot {
                state: SessionState::Warning { remaining_secs },
                remaining_secs: Some(remaining_secs),
            };
        }

        SessionSnapshot {
            state: SessionState::Valid,
            remaining_secs: Some(remaining_secs),
        }
    }

    /// Evaluates now and publishes the result.
    pub fn publish_tick(&self) -> SessionSnapshot {
        let snapshot = self.evaluate(Utc::now());
        self.publish(snapshot);
        snapshot
    }

    /// Publishes `Renewing` while keeping the last known remaining time.
    pub fn set_renewing(&self) {
        let remaining_secs = self.snapshot().remaining_secs;
        self.publish(SessionSnapshot {
            state: SessionState::Renewing,
            remaining_secs,
        });
    }

    /// Records the user's dismissal and publishes `Dismissed`.
    ///
    /// The dismissal policy is decline-and-exit; the caller schedules the
    /// forced logout.
    pub fn dismiss(&self) {
        self.markers.dismiss();
        let remaining_secs = self.snapshot().remaining_secs;
        self.publish(SessionSnapshot {
            state: SessionState::Dismissed,
            remaining_secs,
        });
    }

    /// Starts the background evaluation loop.
    ///
    /// The loop ticks on `tick_interval` while authenticated and parks on
    /// store changes otherwise, so an unauthenticated client burns no
    /// timer. A store change always triggers an immediate evaluation.
    pub fn start(self: &Arc<Self>) -> JoinHandle<()> {
        self.stop_task();
        let (stop_tx, mut stop_rx) = watch::channel(false);
        {
            let mut guard = self.stop_guard();
            *guard = Some(stop_tx);
        }

        let monitor = Arc::clone(self);
        let mut revision = self.store.subscribe();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(monitor.config.tick_interval());
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            ticker.tick().await;

            loop {
                let snapshot = monitor.publish_tick();

                if snapshot.state == SessionState::Unauthenticated {
                    tokio::select! {
                        changed = revision.changed() => {
                            if changed.is_err() {
                                break;
                            }
                            ticker.reset();
                        }
                        _ = stop_rx.changed() => break,
                    }
                    continue;
                }

                tokio::select! {
                    _ = ticker.tick() => {}
                    changed = revision.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        ticker.reset();
                    }
                    _ = stop_rx.changed() => break,
                }
            }
            debug!("session monitor loop stopped");
        })
    }

    /// Stops the background loop, if running.
    pub fn stop(&self) {
        self.stop_task();
    }

    fn stop_task(&self) {
        let sender = self.stop_guard().take();
        if let Some(sender) = sender {
            let _ = sender.send(true);
        }
    }

    fn publish(&self, snapshot: SessionSnapshot) {
        self.snapshot.send_if_modified(|current| {
            if *current == snapshot {
                false
            } else {
                *current = snapshot;
                true
            }
        });
    }

    fn stop_guard(&self) -> std::sync::MutexGuard<'_, Option<watch::Sender<bool>>> {
        self.stop.lock().unwrap_or_else(|p| p.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine as _;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use portal_access_credential::{CredentialSet, MemoryBackend, UserProfile};
    use portal_access_core::Role;
    use serde_json::json;

    fn credential_with_exp(exp: DateTime<Utc>) -> String {
        let payload = json!({
            "sub": "user-1",
            "exp": exp.timestamp(),
            "custom:role": "applicant",
        });
        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"RS256","typ":"JWT"}"#);
        let body = URL_SAFE_NO_PAD.encode(payload.to_string());
        format!("{header}.{body}.sig")
    }

    fn profile() -> UserProfile {
        UserProfile {
            subject: "user-1".to_string(),
            role: Some(Role::Applicant),
            display_name: None,
            email: None,
            email_verified: false,
        }
    }

    fn store_with_exp(exp: DateTime<Utc>) -> Arc<CredentialStore> {
        let store =
            Arc::new(CredentialStore::new(Box::new(MemoryBackend::default())).expect("store"));
        let credential = credential_with_exp(exp);
        store
            .set_credentials(
                &CredentialSet {
                    access: credential.clone(),
                    id: credential,
                    refresh: "refresh-token".to_string(),
                },
                &profile(),
            )
            .expect("set");
        store
    }

    fn monitor_over(store: Arc<CredentialStore>) -> SessionMonitor {
        SessionMonitor::new(
            store,
            SessionConfig::default(),
            Arc::new(WarningMarkers::default()),
        )
    }

    #[test]
    fn empty_store_evaluates_unauthenticated() {
        let store =
            Arc::new(CredentialStore::new(Box::new(MemoryBackend::default())).expect("store"));
        let monitor = monitor_over(store);
        let snapshot = monitor.evaluate(Utc::now());
        assert_eq!(snapshot.state, SessionState::Unauthenticated);
    }

    #[test]
    fn ample_validity_evaluates_valid() {
        let now = Utc::now();
        let monitor = monitor_over(store_with_exp(now + chrono::Duration::hours(1)));
        let snapshot = monitor.evaluate(now);
        assert_eq!(snapshot.state, SessionState::Valid);
        let remaining = snapshot.remaining_secs.expect("remaining");
        assert!(remaining > 3000);
    }

    #[test]
    fn validity_inside_threshold_evaluates_warning() {
        let now = Utc::now();
        let monitor = monitor_over(store_with_exp(now + chrono::Duration::seconds(120)));
        let snapshot = monitor.evaluate(now);
        assert!(matches!(snapshot.state, SessionState::Warning { .. }));
        assert!(monitor.markers().is_raised());
    }

    #[test]
    fn warning_remaining_updates_each_evaluation() {
        let now = Utc::now();
        let monitor = monitor_over(store_with_exp(now + chrono::Duration::seconds(120)));

        let first = monitor.evaluate(now);
        let later = monitor.evaluate(now + chrono::Duration::seconds(30));
        match (first.state, later.state) {
            (
                SessionState::Warning { remaining_secs: a },
                SessionState::Warning { remaining_secs: b },
            ) => {
                assert_eq!(a, 120);
                assert_eq!(b, 90);
            }
            other => panic!("expected two warnings, got {other:?}"),
        }
    }

    #[test]
    fn past_expiry_evaluates_expired() {
        let now = Utc::now();
        let monitor = monitor_over(store_with_exp(now - chrono::Duration::seconds(5)));
        let snapshot = monitor.evaluate(now);
        assert_eq!(snapshot.state, SessionState::Expired);
        assert_eq!(snapshot.remaining_secs, Some(0));
    }

    #[test]
    fn dismissal_suppresses_warning_and_sticks() {
        let now = Utc::now();
        let monitor = monitor_over(store_with_exp(now + chrono::Duration::seconds(120)));

        monitor.evaluate(now);
        monitor.dismiss();

        let snapshot = monitor.evaluate(now + chrono::Duration::seconds(10));
        assert_eq!(snapshot.state, SessionState::Dismissed);

        let snapshot = monitor.evaluate(now + chrono::Duration::seconds(300));
        assert_eq!(snapshot.state, SessionState::Dismissed);
    }

    #[test]
    fn marker_reset_restores_warning_eligibility() {
        let now = Utc::now();
        let monitor = monitor_over(store_with_exp(now + chrono::Duration::seconds(120)));

        monitor.evaluate(now);
        assert!(monitor.markers().is_raised());

        monitor.markers().reset();
        assert!(!monitor.markers().is_raised());
        let snapshot = monitor.evaluate(now);
        assert!(matches!(snapshot.state, SessionState::Warning { .. }));
        assert!(monitor.markers().is_raised());
    }

    #[test]
    fn undecodable_credential_keeps_previous_snapshot() {
        let now = Utc::now();
        let store = store_with_exp(now + chrono::Duration::hours(1));
        let monitor = monitor_over(Arc::clone(&store));
        let valid = monitor.evaluate(now);
        monitor.publish_tick();
        assert_eq!(valid.state, SessionState::Valid);

        store
            .set_credentials(
                &CredentialSet {
                    access: "garbage".to_string(),
                    id: "garbage".to_string(),
                    refresh: "refresh-token".to_string(),
                },
                &profile(),
            )
            .expect("set");

        let snapshot = monitor.evaluate(now);
        assert_eq!(snapshot.state, SessionState::Valid);
    }

    #[test]
    fn indeterminate_expiry_keeps_previous_snapshot() {
        let store =
            Arc::new(CredentialStore::new(Box::new(MemoryBackend::default())).expect("store"));
        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"RS256"}"#);
        let body = URL_SAFE_NO_PAD.encode(r#"{"sub":"user-1"}"#);
        let credential = format!("{header}.{body}.sig");
        store
            .set_credentials(
                &CredentialSet {
                    access: credential.clone(),
                    id: credential,
                    refresh: "refresh-token".to_string(),
                },
                &profile(),
            )
            .expect("set");

        let monitor = monitor_over(store);
        let snapshot = monitor.evaluate(Utc::now());
        assert_eq!(snapshot.state, SessionState::Unauthenticated);
    }

    #[tokio::test]
    async fn background_loop_reacts_to_store_changes() {
        let store =
            Arc::new(CredentialStore::new(Box::new(MemoryBackend::default())).expect("store"));
        let monitor = Arc::new(SessionMonitor::new(
            Arc::clone(&store),
            SessionConfig::builder().tick_interval_secs(3600).build(),
            Arc::new(WarningMarkers::default()),
        ));
        let mut rx = monitor.subscribe();
        let handle = monitor.start();

        let credential = credential_with_exp(Utc::now() + chrono::Duration::hours(1));
        store
            .set_credentials(
                &CredentialSet {
                    access: credential.clone(),
                    id: credential,
                    refresh: "refresh-token".to_string(),
                },
                &profile(),
            )
            .expect("set");

        tokio::time::timeout(std::time::Duration::from_secs(2), async {
            loop {
                rx.changed().await.expect("channel open");
                if rx.borrow().state == SessionState::Valid {
                    break;
                }
            }
        })
        .await
        .expect("monitor reacted to authentication");

        monitor.stop();
        tokio::time::timeout(std::time::Duration::from_secs(2), handle)
            .await
            .expect("loop exits")
            .expect("task join");
    }
}
