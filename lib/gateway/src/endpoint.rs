//! Data endpoint interface.
//!
//! The endpoint executes a prepared call and returns whatever the remote
//! service answered, errors included. Transport concerns end here; the
//! gateway owns classification and session consequences.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A prepared outbound call with the credential attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataCall {
    /// Operation name, used for logging and scripted test endpoints.
    pub operation: String,
    /// The query document.
    pub document: String,
    /// Operation variables.
    pub variables: Value,
    /// Access credential presented to the remote service.
    pub credential: String,
}

/// One error object from the remote service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataError {
    /// Human-readable error message. Always present.
    pub message: String,
    /// Service-specific error type, when provided.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    /// Dotted path to the field the error applies to, when provided.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl DataError {
    /// Creates an error carrying only a message.
    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            error_type: None,
            path: None,
        }
    }
}

/// The remote service's answer: data, errors, or both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataResponse {
    /// Response payload, possibly partial when errors are present.
    pub data: Option<Value>,
    /// Error objects accompanying the payload.
    #[serde(default)]
    pub errors: Vec<DataError>,
}

impl DataResponse {
    /// A full success with the given payload.
    #[must_use]
    pub fn ok(data: Value) -> Self {
        Self {
            data: Some(data),
            errors: Vec::new(),
        }
    }

    /// Returns true if the response carries no errors.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Failures below the response level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndpointError {
    /// The service could not be reached or the connection broke.
    Transport {
        /// Transport message.
        reason: String,
    },
    /// The service answered with something that is not a data response.
    Protocol {
        /// Parser message.
        reason: String,
    },
}

impl fmt::Display for EndpointError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport { reason } => {
                write!(f, "data endpoint unreachable: {reason}")
            }
            Self::Protocol { reason } => {
                write!(f, "data endpoint answered with an unreadable response: {reason}")
            }
        }
    }
}

impl std::error::Error for EndpointError {}

/// The seam to the remote data service.
#[async_trait]
pub trait DataEndpoint: Send + Sync {
    /// Executes a prepared call.
    async fn execute(&self, call: &DataCall) -> Result<DataResponse, EndpointError>;
}

/// A scriptable endpoint for tests.
///
/// Responses are handed out in order; calls beyond the script fail with
/// a transport error. Records call count and the last credential seen.
#[derive(Default)]
pub struct MockDataEndpoint {
    responses: Mutex<VecDeque<Result<DataResponse, EndpointError>>>,
    delay: Mutex<Option<std::time::Duration>>,
    calls: AtomicUsize,
    last_credential: Mutex<Option<String>>,
}

impl MockDataEndpoint {
    /// Creates an endpoint with nothing scripted.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a response for the next call.
    pub fn push_response(&self, response: Result<DataResponse, EndpointError>) {
        self.lock_ignore_poison(&self.responses).push_back(response);
    }

    /// Delays every call by `delay` before answering.
    pub fn set_delay(&self, delay: std::time::Duration) {
        *self.lock_ignore_poison(&self.delay) = Some(delay);
    }

    /// Number of calls observed.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// The credential attached to the most recent call.
    #[must_use]
    pub fn last_credential(&self) -> Option<String> {
        self.lock_ignore_poison(&self.last_credential).clone()
    }

    fn lock_ignore_poison<'a, T>(&self, mutex: &'a Mutex<T>) -> std::sync::MutexGuard<'a, T> {
        mutex.lock().unwrap_or_else(|p| p.into_inner())
    }
}

#[async_trait]
impl DataEndpoint for MockDataEndpoint {
    async fn execute(&self, call: &DataCall) -> Result<DataResponse, EndpointError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.lock_ignore_poison(&self.last_credential) = Some(call.credential.clone());
        let delay = *self.lock_ignore_poison(&self.delay);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.lock_ignore_poison(&self.responses)
            .pop_front()
            .unwrap_or_else(|| {
                Err(EndpointError::Transport {
                    reason: "no scripted response".to_string(),
                })
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn response_success_reflects_errors() {
        let response = DataResponse::ok(json!({"applications": []}));
        assert!(response.is_success());

        let response = DataResponse {
            data: None,
            errors: vec![DataError::message("boom")],
        };
        assert!(!response.is_success());
    }

    #[test]
    fn response_deserializes_without_errors_field() {
        let response: DataResponse =
            serde_json::from_str(r#"{"data": {"ping": "pong"}}"#).expect("deserialize");
        assert!(response.is_success());
    }

    #[tokio::test]
    async fn mock_hands_out_responses_in_order() {
        let endpoint = MockDataEndpoint::new();
        endpoint.push_response(Ok(DataResponse::ok(json!(1))));
        endpoint.push_response(Err(EndpointError::Transport {
            reason: "down".to_string(),
        }));

        let call = DataCall {
            operation: "Ping".to_string(),
            document: "query Ping { ping }".to_string(),
            variables: Value::Null,
            credential: "access-token".to_string(),
        };

        assert!(endpoint.execute(&call).await.is_ok());
        assert!(endpoint.execute(&call).await.is_err());
        assert_eq!(endpoint.calls(), 2);
        assert_eq!(endpoint.last_credential().as_deref(), Some("access-token"));
    }
}
