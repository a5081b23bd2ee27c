//! The single source of truth for session credential state.
//!
//! The store holds four slots: the three credentials and the cached
//! profile. Writes replace the whole set atomically and clear removes
//! everything, so readers never observe a partially updated session.
//! Every mutation bumps a revision published on a watch channel, which
//! the session monitor subscribes to for immediate re-evaluation.

use std::path::PathBuf;
use std::sync::{Mutex, RwLock};

use rootcause::prelude::Report;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::debug;

use crate::error::StoreError;
use crate::profile::UserProfile;
use crate::set::{CredentialSet, SlotPresence};

/// Raw slot contents as persisted by a backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSlots {
    /// Access credential slot.
    #[serde(default)]
    pub access: Option<String>,
    /// Identity credential slot.
    #[serde(default)]
    pub id: Option<String>,
    /// Refresh credential slot.
    #[serde(default)]
    pub refresh: Option<String>,
    /// Cached profile slot, serialized as JSON.
    #[serde(default)]
    pub profile: Option<String>,
}

impl StoredSlots {
    fn is_empty(&self) -> bool {
        self.access.is_none()
            && self.id.is_none()
            && self.refresh.is_none()
            && self.profile.is_none()
    }
}

/// Persistence backend for credential slots.
///
/// Backends are synchronous; slot payloads are small and the store is
/// called from both async and non-async contexts.
pub trait SlotBackend: Send + Sync {
    /// Loads the persisted slots, or defaults when nothing is persisted.
    fn load(&self) -> Result<StoredSlots, StoreError>;

    /// Persists the given slots, replacing any previous contents.
    fn persist(&self, slots: &StoredSlots) -> Result<(), StoreError>;
}

/// In-memory backend for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    slots: Mutex<StoredSlots>,
}

impl SlotBackend for MemoryBackend {
    fn load(&self) -> Result<StoredSlots, StoreError> {
        let slots = self.slots.lock().map_err(|_| StoreError::LoadFailed {
            reason: "backend lock poisoned".to_string(),
        })?;
        Ok(slots.clone())
    }

    fn persist(&self, slots: &StoredSlots) -> Result<(), StoreError> {
        let mut guard = self.slots.lock().map_err(|_| StoreError::PersistFailed {
            reason: "backend lock poisoned".to_string(),
        })?;
        *guard = slots.clone();
        Ok(())
    }
}

/// File backend that persists slots as a single JSON document.
#[derive(Debug)]
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    /// Creates a backend persisting to `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SlotBackend for JsonFileBackend {
    fn load(&self) -> Result<StoredSlots, StoreError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(StoredSlots::default());
            }
            Err(err) => {
                return Err(StoreError::LoadFailed {
                    reason: err.to_string(),
                });
            }
        };
        serde_json::from_str(&contents).map_err(|err| StoreError::LoadFailed {
            reason: err.to_string(),
        })
    }

    fn persist(&self, slots: &StoredSlots) -> Result<(), StoreError> {
        let json = serde_json::to_string(slots).map_err(|err| StoreError::PersistFailed {
            reason: err.to_string(),
        })?;
        std::fs::write(&self.path, json).map_err(|err| StoreError::PersistFailed {
            reason: err.to_string(),
        })
    }
}

/// Credential store with atomic whole-set writes and change notification.
pub struct CredentialStore {
    inner: RwLock<StoredSlots>,
    backend: Box<dyn SlotBackend>,
    revision: watch::Sender<u64>,
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore")
            .field("presence", &self.slot_presence())
            .finish_non_exhaustive()
    }
}

impl CredentialStore {
    /// Creates a store, loading any previously persisted slots.
    pub fn new(backend: Box<dyn SlotBackend>) -> Result<Self, Report<StoreError>> {
        let slots = backend.load()?;
        let (revision, _) = watch::channel(0);
        Ok(Self {
            inner: RwLock::new(slots),
            backend,
            revision,
        })
    }

    /// Replaces the credential set and cached profile atomically.
    pub fn set_credentials(
        &self,
        set: &CredentialSet,
        profile: &UserProfile,
    ) -> Result<(), Report<StoreError>> {
        let profile_json =
            serde_json::to_string(profile).map_err(|err| StoreError::ProfileSerialization {
                reason: err.to_string(),
            })?;
        let slots = StoredSlots {
            access: Some(set.access.clone()),
            id: Some(set.id.clone()),
            refresh: Some(set.refresh.clone()),
            profile: Some(profile_json),
        };
        self.backend.persist(&slots)?;
        {
            let mut guard = self.write_guard();
            *guard = slots;
        }
        self.bump_revision();
        Ok(())
    }

    /// Removes all slots. Idempotent; clearing an empty store does not
    /// persist or notify.
    pub fn clear(&self) -> Result<(), Report<StoreError>> {
        {
            let guard = self.read_guard();
            if guard.is_empty() {
                return Ok(());
            }
        }
        let empty = StoredSlots::default();
        self.backend.persist(&empty)?;
        {
            let mut guard = self.write_guard();
            *guard = empty;
        }
        self.bump_revision();
        Ok(())
    }

    /// Returns the credential set, or `None` unless all three credential
    /// slots are populated. A partial set reads as absent.
    #[must_use]
    pub fn credentials(&self) -> Option<CredentialSet> {
        let guard = self.read_guard();
        match (&guard.access, &guard.id, &guard.refresh) {
            (Some(access), Some(id), Some(refresh)) => Some(CredentialSet {
                access: access.clone(),
                id: id.clone(),
                refresh: refresh.clone(),
            }),
            _ => None,
        }
    }

    /// Returns the cached profile, or `None` when absent or unparseable.
    #[must_use]
    pub fn profile(&self) -> Option<UserProfile> {
        let guard = self.read_guard();
        let raw = guard.profile.as_deref()?;
        match serde_json::from_str(raw) {
            Ok(profile) => Some(profile),
            Err(err) => {
                debug!(error = %err, "cached profile is unparseable, treating as absent");
                None
            }
        }
    }

    /// Reports which slots currently hold a value.
    #[must_use]
    pub fn slot_presence(&self) -> SlotPresence {
        let guard = self.read_guard();
        SlotPresence {
            access: guard.access.is_some(),
            id: guard.id.is_some(),
            refresh: guard.refresh.is_some(),
            profile: guard.profile.is_some(),
        }
    }

    /// Subscribes to slot revisions. The receiver is notified after every
    /// successful mutation.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    fn bump_revision(&self) {
        self.revision.send_modify(|rev| *rev += 1);
    }

    fn read_guard(&self) -> std::sync::RwLockReadGuard<'_, StoredSlots> {
        // Lock poisoning requires a panic mid-write; the write sections
        // only assign already-constructed values.
        self.inner.read().unwrap_or_else(|p| p.into_inner())
    }

    fn write_guard(&self) -> std::sync::RwLockWriteGuard<'_, StoredSlots> {
        self.inner.write().unwrap_or_else(|p| p.into_inner())
    }
}
