//! Error types shared by the warehouse adapter and the user-facing actions.
//!
//! Only the query execution adapter raises errors for external failures
//! ([`QueryError`]). Actions add one more category on top: input that is
//! rejected before any network call is made ([`ActionError::Input`]).
//! Malformed payloads are never errors; the normalizer and the agent
//! extractor absorb them.

/// Failure reported by a [`Warehouse`](crate::warehouse::Warehouse) call.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    /// The warehouse could not be reached (DNS, TCP, TLS, broken body).
    #[error("cannot reach warehouse: {0}")]
    Connectivity(String),

    /// The warehouse rejected the statement (compilation, permission, ...).
    #[error("statement failed ({code}): {message}")]
    Statement { code: String, message: String },

    /// A non-success HTTP status without a structured error body.
    #[error("warehouse returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The statement did not finish within the configured timeout.
    #[error("statement timed out after {0}s")]
    Timeout(u64),

    /// A success response whose body could not be understood.
    #[error("unexpected warehouse response: {0}")]
    Protocol(String),
}

impl QueryError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, QueryError::Timeout(_))
    }
}

impl From<reqwest::Error> for QueryError {
    fn from(err: reqwest::Error) -> Self {
        QueryError::Connectivity(err.to_string())
    }
}

/// Failure of a user-triggered action (search, preview, ask, ...).
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    /// Rejected before any warehouse call; the message is shown as a prompt.
    #[error("{0}")]
    Input(String),

    #[error(transparent)]
    Query(#[from] QueryError),
}

impl ActionError {
    pub fn input(message: impl Into<String>) -> Self {
        ActionError::Input(message.into())
    }
}
