//! Session lifecycle for the portal-access client.
//!
//! This crate coordinates everything that happens to a session after
//! sign-in:
//! - `SessionMonitor`: periodic validity evaluation and state publication
//! - `RenewalCoordinator`: single-flight credential renewal
//! - `LogoutController`: idempotent teardown with a navigation event
//! - `SessionController`: the wiring point the application shell uses
//! - `IdentityProvider`: the seam to the identity provider, with a
//!   scriptable mock for tests
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use portal_access_credential::{CredentialStore, MemoryBackend, SessionConfig};
//! use portal_access_session::{MockIdentityProvider, SessionController, SessionState};
//!
//! let store = Arc::new(CredentialStore::new(Box::new(MemoryBackend::default())).expect("store"));
//! let provider = Arc::new(MockIdentityProvider::new());
//! let controller = SessionController::new(store, provider, SessionConfig::default());
//!
//! assert_eq!(controller.snapshot().state, SessionState::Unauthenticated);
//! ```

pub mod controller;
pub mod error;
pub mod logout;
pub mod monitor;
pub mod provider;
pub mod renewal;
pub mod state;

pub use controller::SessionController;
pub use error::{RenewalError, SessionError};
pub use logout::{LogoutController, LogoutEvent};
pub use monitor::{SessionMonitor, WarningMarkers};
pub use provider::{AuthRequest, IdentityProvider, MockIdentityProvider, ProviderError};
pub use renewal::RenewalCoordinator;
pub use state::{SessionSnapshot, SessionState};
