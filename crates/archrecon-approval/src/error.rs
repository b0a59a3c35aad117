use crate::request::RequestId;

/// Errors that can occur while resolving approval requests.
///
/// Reviewer mistakes (missing or malformed decisions) are not errors here;
/// they resolve the request into the ERROR state instead.
#[derive(Debug, thiserror::Error)]
pub enum ApprovalError {
    /// No pending request has this id (never issued, or already resolved).
    #[error("no pending approval request {id}")]
    UnknownRequest {
        /// The id that was looked up.
        id: RequestId,
    },

    /// The handler cannot take requests right now.
    #[error("approval handler is not available")]
    HandlerUnavailable,

    /// Internal approval system error.
    #[error("internal approval error: {0}")]
    Internal(String),
}

/// Result type for approval operations.
pub type ApprovalResult<T> = Result<T, ApprovalError>;
