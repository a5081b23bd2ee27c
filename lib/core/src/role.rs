//! Portal roles used for client-side authorization gating.
//!
//! The portal distinguishes two levels of access, carried in a custom role
//! claim on the identity credential:
//! - `Applicant`: access to the applicant's own records
//! - `Admin`: oversight access across all applicants
//!
//! The role gate here is a UX guard only. The authoritative check happens
//! server-side and surfaces as an authorization denial on the data call.

use serde::{Deserialize, Serialize};

/// Portal access role derived from the role claim on a credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Standard applicant with access to their own applications.
    Applicant,
    /// Administrator with oversight across all applicants.
    Admin,
}

impl Role {
    /// Returns true if this role has admin privileges.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }

    /// Returns true if this role satisfies the given requirement.
    ///
    /// Admin satisfies applicant-gated resources; the reverse does not hold.
    #[must_use]
    pub fn satisfies(&self, required: Role) -> bool {
        match required {
            Role::Applicant => true,
            Role::Admin => self.is_admin(),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Applicant => write!(f, "applicant"),
            Self::Admin => write!(f, "admin"),
        }
    }
}
