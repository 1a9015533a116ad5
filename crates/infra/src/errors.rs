//! Conversions from external infrastructure errors into domain errors.

use chatsync_domain::ChatSyncError;
use reqwest::Error as HttpError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub ChatSyncError);

impl From<InfraError> for ChatSyncError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<ChatSyncError> for InfraError {
    fn from(value: ChatSyncError) -> Self {
        InfraError(value)
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → ChatSyncError */
/* -------------------------------------------------------------------------- */

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        let error = if value.is_timeout() {
            ChatSyncError::Network(format!("http request timed out: {value}"))
        } else if value.is_connect() {
            ChatSyncError::Network(format!("http connection failed: {value}"))
        } else if value.is_decode() {
            ChatSyncError::Internal(format!("failed to decode http response: {value}"))
        } else {
            ChatSyncError::Network(format!("http request failed: {value}"))
        };
        InfraError(error)
    }
}

/* -------------------------------------------------------------------------- */
/* std::io::Error → ChatSyncError */
/* -------------------------------------------------------------------------- */

impl From<std::io::Error> for InfraError {
    fn from(value: std::io::Error) -> Self {
        InfraError(ChatSyncError::Platform(format!("io error: {value}")))
    }
}

/* -------------------------------------------------------------------------- */
/* serde_json::Error → ChatSyncError */
/* -------------------------------------------------------------------------- */

impl From<serde_json::Error> for InfraError {
    fn from(value: serde_json::Error) -> Self {
        InfraError(ChatSyncError::InvalidInput(format!("invalid json: {value}")))
    }
}
