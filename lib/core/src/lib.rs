//! Core domain types for the portal-access client.
//!
//! This crate provides the foundational types shared by the credential,
//! session, and gateway crates of the job-application portal client:
//! error handling, portal roles, and the forced-logout reason codes.

pub mod error;
pub mod logout;
pub mod role;

pub use error::Result;
pub use logout::LogoutReason;
pub use role::Role;
