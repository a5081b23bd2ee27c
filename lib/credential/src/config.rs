//! Session tunables for monitoring cadence, call timeouts, and claim mapping.

use serde::{Deserialize, Serialize};

fn default_tick_interval_secs() -> u64 {
    30
}

fn default_warning_threshold_secs() -> i64 {
    300
}

fn default_call_timeout_secs() -> u64 {
    30
}

fn default_role_claim() -> String {
    "custom:role".to_string()
}

fn default_admin_role_value() -> String {
    "administrator".to_string()
}

fn default_applicant_role_value() -> String {
    "applicant".to_string()
}

/// Tunables for the session lifecycle.
///
/// All fields have serde defaults so a partial configuration file still
/// deserializes. The defaults match the deployed portal behavior: a 30
/// second validity sweep and a 5 minute expiry warning window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Seconds between validity evaluations.
    #[serde(default = "default_tick_interval_secs")]
    tick_interval_secs: u64,
    /// Remaining-validity threshold, in seconds, below which the expiry
    /// warning is raised.
    #[serde(default = "default_warning_threshold_secs")]
    warning_threshold_secs: i64,
    /// Timeout applied to each remote data call.
    #[serde(default = "default_call_timeout_secs")]
    call_timeout_secs: u64,
    /// Name of the role claim on the identity credential.
    #[serde(default = "default_role_claim")]
    role_claim: String,
    /// Claim value that maps to the admin role.
    #[serde(default = "default_admin_role_value")]
    admin_role_value: String,
    /// Claim value that maps to the applicant role.
    #[serde(default = "default_applicant_role_value")]
    applicant_role_value: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            tick_interval_secs: default_tick_interval_secs(),
            warning_threshold_secs: default_warning_threshold_secs(),
            call_timeout_secs: default_call_timeout_secs(),
            role_claim: default_role_claim(),
            admin_role_value: default_admin_role_value(),
            applicant_role_value: default_applicant_role_value(),
        }
    }
}

impl SessionConfig {
    /// Returns a builder for programmatic construction.
    #[must_use]
    pub fn builder() -> SessionConfigBuilder {
        SessionConfigBuilder::default()
    }

    /// Interval between validity evaluations.
    #[must_use]
    pub fn tick_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.tick_interval_secs)
    }

    /// Remaining validity below which the expiry warning is raised.
    #[must_use]
    pub fn warning_threshold(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.warning_threshold_secs)
    }

    /// Timeout applied to each remote data call.
    #[must_use]
    pub fn call_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.call_timeout_secs)
    }

    /// Name of the role claim on the identity credential.
    #[must_use]
    pub fn role_claim(&self) -> &str {
        &self.role_claim
    }

    /// Claim value that maps to the admin role.
    #[must_use]
    pub fn admin_role_value(&self) -> &str {
        &self.admin_role_value
    }

    /// Claim value that maps to the applicant role.
    #[must_use]
    pub fn applicant_role_value(&self) -> &str {
        &self.applicant_role_value
    }
}

/// Builder for [`SessionConfig`].
#[derive(Debug, Clone, Default)]
pub struct SessionConfigBuilder {
    tick_interval_secs: Option<u64>,
    warning_threshold_secs: Option<i64>,
    call_timeout_secs: Option<u64>,
    role_claim: Option<String>,
    admin_role_value: Option<String>,
    applicant_role_value: Option<String>,
}

impl SessionConfigBuilder {
    /// Sets the seconds between validity evaluations.
    #[must_use]
    pub fn tick_interval_secs(mut self, secs: u64) -> Self {
        self.tick_interval_secs = Some(secs);
        self
    }

    /// Sets the warning threshold in seconds of remaining validity.
    #[must_use]
    pub fn warning_threshold_secs(mut self, secs: i64) -> Self {
        self.warning_threshold_secs = Some(secs);
        self
    }

    /// Sets the per-call timeout in seconds.
    #[must_use]
    pub fn call_timeout_secs(mut self, secs: u64) -> Self {
        self.call_timeout_secs = Some(secs);
        self
    }

    /// Sets the name of the role claim on the identity credential.
    #[must_use]
    pub fn role_claim(mut self, claim: impl Into<String>) -> Self {
        self.role_claim = Some(claim.into());
        self
    }

    /// Sets the claim value that maps to the admin role.
    #[must_use]
    pub fn admin_role_value(mut self, value: impl Into<String>) -> Self {
        self.admin_role_value = Some(value.into());
        self
    }

    /// Sets the claim value that maps to the applicant role.
    #[must_use]
    pub fn applicant_role_value(mut self, value: impl Into<String>) -> Self {
        self.applicant_role_value = Some(value.into());
        self
    }

    /// Builds the configuration, falling back to defaults for unset fields.
    #[must_use]
    pub fn build(self) -> SessionConfig {
        SessionConfig {
            tick_interval_secs: self
                .tick_interval_secs
                .unwrap_or_else(default_tick_interval_secs),
            warning_threshold_secs: self
                .warning_threshold_secs
                .unwrap_or_else(default_warning_threshold_secs),
            call_timeout_secs: self
                .call_timeout_secs
                .unwrap_or_else(default_call_timeout_secs),
            role_claim: self.role_claim.unwrap_or_else(default_role_claim),
            admin_role_value: self
                .admin_role_value
                .unwrap_or_else(default_admin_role_value),
            applicant_role_value: self
                .applicant_role_value
                .unwrap_or_else(default_applicant_role_value),
        }
    }
}
