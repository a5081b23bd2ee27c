//! Authorization gateway for the portal-access client.
//!
//! Remote data calls never go out raw. Each one is wrapped in a
//! [`CallContext`] declaring its domain's required role and executed
//! through the [`AuthorizationGateway`], which runs the local role gate,
//! the pre-flight credential checks, the bounded call, and post-flight
//! classification of response errors. Server-side denials are terminal
//! here: the gateway triggers session teardown through the shared
//! [`LogoutController`](portal_access_session::LogoutController).

pub mod classifier;
pub mod domain;
pub mod endpoint;
pub mod error;
pub mod gateway;

pub use classifier::{AppSyncClassifier, ErrorClass, ErrorClassifier};
pub use domain::{CallContext, CallKind};
pub use endpoint::{DataCall, DataEndpoint, DataError, DataResponse, EndpointError, MockDataEndpoint};
pub use error::GatewayError;
pub use gateway::AuthorizationGateway;
