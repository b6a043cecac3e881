// SPDX-License-Identifier: GPL-3.0-only
use reqwest::StatusCode;

/// Failure classification for the sync engine.
///
/// `Storage` is fatal to the pass that hits it; the other three kinds are
/// retryable per queue entry, bounded by the entry's retry counter.
#[derive(thiserror::Error, Debug)]
pub enum SyncError {
    #[error("storage failure: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("network failure: {0}")]
    Network(String),

    #[error("remote rejected request ({status}): {message}")]
    RemoteRejection { status: u16, message: String },

    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl SyncError {
    /// Whether the failure may clear up on a later attempt.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, SyncError::Storage(_))
    }

    /// Classify a non-success HTTP response.
    ///
    /// 4xx means the server understood and refused (already confirmed,
    /// unauthorized); anything else is treated as a transient transport
    /// problem.
    pub fn from_status(status: StatusCode, body: String) -> Self {
        if status.is_client_error() {
            SyncError::RemoteRejection {
                status: status.as_u16(),
                message: body,
            }
        } else {
            SyncError::Network(format!("{}: {}", status, body))
        }
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            SyncError::MalformedResponse(err.to_string())
        } else {
            SyncError::Network(err.to_string())
        }
    }
}
