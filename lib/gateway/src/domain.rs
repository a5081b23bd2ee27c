//! Per-call context and domain role declarations.
//!
//! Each data domain declares up front which role its operations require.
//! The declaration travels with the call so the gateway can gate it
//! locally before anything leaves the client.

use portal_access_core::Role;
use serde_json::Value;

/// Whether a call reads or writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    /// Read-only operation.
    Query,
    /// State-changing operation.
    Mutation,
}

/// Everything the gateway needs to gate and execute one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallContext {
    /// Role the domain requires for this operation.
    pub required_role: Role,
    /// Read or write.
    pub kind: CallKind,
    /// Operation name, used in logs and error reports.
    pub operation: String,
    /// The query document.
    pub document: String,
    /// Operation variables.
    pub variables: Value,
}

impl CallContext {
    /// A read gated at applicant level.
    #[must_use]
    pub fn query(operation: impl Into<String>, document: impl Into<String>) -> Self {
        Self {
            required_role: Role::Applicant,
            kind: CallKind::Query,
            operation: operation.into(),
            document: document.into(),
            variables: Value::Null,
        }
    }

    /// A write gated at applicant level.
    #[must_use]
    pub fn mutation(operation: impl Into<String>, document: impl Into<String>) -> Self {
        Self {
            required_role: Role::Applicant,
            kind: CallKind::Mutation,
            operation: operation.into(),
            document: document.into(),
            variables: Value::Null,
        }
    }

    /// Raises the required role for this call.
    #[must_use]
    pub fn require(mut self, role: Role) -> Self {
        self.required_role = role;
        self
    }

    /// Attaches operation variables.
    #[must_use]
    pub fn with_variables(mut self, variables: Value) -> Self {
        self.variables = variables;
        self
    }
}
