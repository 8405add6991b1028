//! Error types shared by the Firebase storage implementation.

use reqwest::StatusCode;
use thiserror::Error;

use crate::dao::storage::StorageError;

/// Convenient result alias returning [`FirebaseError`] failures.
pub type FirebaseResult<T> = Result<T, FirebaseError>;

/// Failures that can occur while talking to the Firebase Realtime Database.
#[derive(Debug, Error)]
pub enum FirebaseError {
    /// Required environment variable is missing.
    #[error("missing Firebase environment variable `{var}`")]
    MissingEnvVar { var: &'static str },
    /// Building the HTTP client failed (invalid TLS setup, etc).
    #[error("failed to build Firebase client")]
    ClientBuilder {
        #[source]
        source: reqwest::Error,
    },
    /// A request could not be sent.
    #[error("failed to send Firebase request to `{path}`")]
    RequestSend {
        path: String,
        #[source]
        source: reqwest::Error,
    },
    /// Firebase answered with an unexpected status code.
    #[error("unexpected Firebase response status {status} for `{path}`")]
    RequestStatus { path: String, status: StatusCode },
    /// Response body could not be read as JSON.
    #[error("failed to decode Firebase response for `{path}`")]
    DecodeResponse {
        path: String,
        #[source]
        source: reqwest::Error,
    },
    /// JSON could not be turned into a game document.
    #[error("failed to deserialize game document at `{path}`")]
    DeserializeValue {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    /// The streaming subscription delivered an event we could not parse.
    #[error("malformed Firebase stream event `{event}`")]
    MalformedEvent {
        event: String,
        #[source]
        source: serde_json::Error,
    },
    /// Firebase cancelled the stream (security rules or revoked credentials).
    #[error("Firebase stream cancelled: {reason}")]
    StreamCancelled { reason: String },
}

impl From<FirebaseError> for StorageError {
    fn from(err: FirebaseError) -> Self {
        let message = err.to_string();
        match err {
            corrupt @ FirebaseError::DeserializeValue { .. } => {
                StorageError::corrupt(message, corrupt)
            }
            other => StorageError::unavailable(message, other),
        }
    }
}
