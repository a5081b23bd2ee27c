//! The credential triple issued at sign-in and replaced at renewal.

use serde::{Deserialize, Serialize};

/// The access/identity/refresh credential triple.
///
/// The set is always written and cleared as a whole. A partial set in
/// storage is treated as absent by the store's readers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialSet {
    /// Credential presented on data calls.
    pub access: String,
    /// Credential carrying identity and role claims.
    pub id: String,
    /// Credential exchanged for a fresh set at renewal.
    pub refresh: String,
}

/// Which storage slots currently hold a value.
///
/// Used for diagnostics and for detecting partially written state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotPresence {
    /// Access credential slot is populated.
    pub access: bool,
    /// Identity credential slot is populated.
    pub id: bool,
    /// Refresh credential slot is populated.
    pub refresh: bool,
    /// Cached profile slot is populated.
    pub profile: bool,
}

impl SlotPresence {
    /// Returns true if all three credential slots are populated.
    ///
    /// The profile slot is a cache and does not count towards
    /// completeness.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.access && self.id && self.refresh
    }
}
