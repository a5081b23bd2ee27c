//! Credential storage and claim decoding for the portal-access client.
//!
//! This crate owns the client side of the credential lifecycle:
//! - `CredentialSet`: the access/identity/refresh token triple
//! - `ClaimReader`: payload decoding without signature verification
//! - `CredentialStore`: the single source of truth for session state,
//!   with atomic whole-set writes and change notification
//! - `UserProfile`: the cached projection used for role gating
//! - `SessionConfig`: tunables for monitoring, timeouts, and claim mapping
//!
//! # Trust model
//!
//! The claim reader decodes token payloads without verifying signatures.
//! Signature trust is delegated to the identity provider and the transport;
//! decoded claims steer client-side behavior only. The authoritative
//! authorization boundary is server-side.
//!
//! # Example
//!
//! ```
//! use portal_access_credential::{CredentialStore, MemoryBackend};
//!
//! let store = CredentialStore::new(Box::new(MemoryBackend::default())).expect("store");
//!
//! assert!(store.credentials().is_none());
//! assert!(store.profile().is_none());
//! ```

pub mod claims;
pub mod config;
pub mod error;
pub mod profile;
pub mod set;
pub mod store;

pub use claims::{ClaimReader, Claims};
pub use config::{SessionConfig, SessionConfigBuilder};
pub use error::{ClaimError, StoreError};
pub use profile::UserProfile;
pub use set::{CredentialSet, SlotPresence};
pub use store::{CredentialStore, JsonFileBackend, MemoryBackend, SlotBackend, StoredSlots};
