//! Graph store error types.

use thiserror::Error;

/// Errors raised while querying a graph store.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum QueryError {
    /// The store did not answer within the configured timeout.
    #[error("query timed out")]
    Timeout,

    /// Connection-level failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// The store answered with an error status, e.g. a malformed query.
    #[error("store rejected the query (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },

    /// The store answered, but not with something we can read.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// A dataset file that could not be read or parsed.
    #[error("invalid dataset: {0}")]
    Dataset(String),
}

impl QueryError {
    /// Whether retrying the same query could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, QueryError::Timeout | QueryError::Transport(_))
    }
}

impl From<reqwest::Error> for QueryError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            QueryError::Timeout
        } else if e.is_decode() {
            QueryError::InvalidResponse(e.to_string())
        } else if let Some(status) = e.status() {
            QueryError::Rejected {
                status: status.as_u16(),
                message: e.to_string(),
            }
        } else {
            QueryError::Transport(e.to_string())
        }
    }
}
