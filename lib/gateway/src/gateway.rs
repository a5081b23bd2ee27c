//! The authorization gateway.
//!
//! Every remote data call goes through `execute`: a local role gate, a
//! pre-flight credential check, the bounded call itself, and post-flight
//! classification of response errors. The gateway is the only component
//! that turns a server-side authorization denial into session teardown.

use std::sync::Arc;

use portal_access_core::LogoutReason;
use portal_access_credential::{ClaimReader, CredentialStore, SessionConfig};
use portal_access_session::LogoutController;
use tracing::{debug, instrument, warn};

use crate::classifier::{AppSyncClassifier, ErrorClass, ErrorClassifier};
use crate::domain::CallContext;
use crate::endpoint::{DataCall, DataEndpoint, DataResponse};
use crate::error::GatewayError;

/// Gates and executes outbound data calls.
pub struct AuthorizationGateway {
    store: Arc<CredentialStore>,
    endpoint: Arc<dyn DataEndpoint>,
    logout: Arc<LogoutController>,
    classifier: Box<dyn ErrorClassifier>,
    reader: ClaimReader,
    timeout: std::time::Duration,
}

impl AuthorizationGateway {
    /// Creates a gateway with the default response-error classifier.
    #[must_use]
    pub fn new(
        store: Arc<CredentialStore>,
        endpoint: Arc<dyn DataEndpoint>,
        logout: Arc<LogoutController>,
        config: &SessionConfig,
    ) -> Self {
        Self {
            store,
            endpoint,
            logout,
            classifier: Box::new(AppSyncClassifier),
            reader: ClaimReader::new(config),
            timeout: config.call_timeout(),
        }
    }

    /// Replaces the response-error classifier.
    #[must_use]
    pub fn with_classifier(mut self, classifier: Box<dyn ErrorClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    /// Executes a gated call.
    ///
    /// The local gate and the pre-flight checks run before anything
    /// leaves the client; a call rejected there makes no network
    /// request. Post-flight, response errors are classified and either
    /// suppressed, surfaced, or escalated to teardown.
    #[instrument(skip(self, ctx), fields(operation = %ctx.operation, kind = ?ctx.kind))]
    pub async fn execute(&self, ctx: &CallContext) -> Result<DataResponse, GatewayError> {
        let Some(profile) = self.store.profile() else {
            return Err(GatewayError::NotSignedIn);
        };

        if let Some(role) = profile.role {
            if !role.satisfies(ctx.required_role) {
                debug!(%role, required = %ctx.required_role, "call gated locally");
                return Err(GatewayError::Forbidden {
                    required: ctx.required_role,
                    actual: role,
                });
            }
        }

        let Some(set) = self.store.credentials() else {
            warn!("data call attempted without stored credentials, tearing down");
            self.logout.force_logout(LogoutReason::NoToken);
            return Err(GatewayError::NoCredential);
        };

        let claims = match self.reader.decode(&set.id) {
            Ok(claims) => claims,
            Err(err) => {
                warn!(error = %err, "stored identity credential undecodable, tearing down");
                self.logout.force_logout(LogoutReason::InvalidToken);
                return Err(GatewayError::InvalidCredential {
                    reason: err.to_string(),
                });
            }
        };

        // The credential is authoritative for the role; the cached profile
        // may lag behind a re-issuance.
        let Some(role) = claims.role else {
            warn!("identity credential carries no role claim, tearing down");
            self.logout.force_logout(LogoutReason::MissingRole);
            return Err(GatewayError::MissingRoleClaim);
        };
        if !role.satisfies(ctx.required_role) {
            return Err(GatewayError::Forbidden {
                required: ctx.required_role,
                actual: role,
            });
        }

        let call = DataCall {
            operation: ctx.operation.clone(),
            document: ctx.document.clone(),
            variables: ctx.variables.clone(),
            credential: set.access,
        };

        let response = match tokio::time::timeout(self.timeout, self.endpoint.execute(&call)).await
        {
            Err(_) => {
                return Err(GatewayError::Transport {
                    reason: "data call timed out".to_string(),
                });
            }
            Ok(Err(err)) => {
                return Err(GatewayError::Transport {
                    reason: err.to_string(),
                });
            }
            Ok(Ok(response)) => response,
        };

        self.classify_response(ctx, response)
    }

    fn classify_response(
        &self,
        ctx: &CallContext,
        response: DataResponse,
    ) -> Result<DataResponse, GatewayError> {
        if response.errors.is_empty() {
            return Ok(response);
        }

        let mut residual = Vec::new();
        let mut denied = false;
        for error in &response.errors {
            match self.classifier.classify(error) {
                ErrorClass::Ignorable => {
                    debug!(message = %error.message, "suppressing ignorable response error");
                }
                ErrorClass::PolicyDenial => denied = true,
                ErrorClass::Other => residual.push(error.clone()),
            }
        }

        if denied {
            warn!(operation = %ctx.operation, "authorization denial on data call, tearing down");
            self.logout.force_logout(LogoutReason::AuthExpired);
            return Err(GatewayError::AuthorizationDenied);
        }

        if residual.is_empty() {
            // Partial data with only ignorable errors counts as success.
            return Ok(DataResponse {
                data: response.data,
                errors: Vec::new(),
            });
        }

        Err(GatewayError::Data { errors: residual })
    }
}
