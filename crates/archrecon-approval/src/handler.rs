//! Front-end hook for collecting reviewer decisions.

use async_trait::async_trait;
use serde_json::Value;

use crate::request::{ApprovalDecision, ApprovalRequest};

/// Trait for front-ends that put approval requests in front of a human.
///
/// Implementations return the raw decision as the reviewer gave it; the gate
/// does the parsing, so a malformed answer still resolves the request.
///
/// # Example
///
/// ```rust,ignore
/// use archrecon_approval::{ApprovalHandler, ApprovalRequest};
/// use serde_json::{Value, json};
///
/// struct TerminalHandler;
///
/// #[async_trait::async_trait]
/// impl ApprovalHandler for TerminalHandler {
///     async fn request_decision(&self, request: &ApprovalRequest) -> Option<Value> {
///         // Prompt on the terminal...
///         Some(json!({"type": "accept"}))
///     }
///
///     fn is_available(&self) -> bool {
///         true
///     }
/// }
/// ```
#[async_trait]
pub trait ApprovalHandler: Send + Sync {
    /// Present a request and wait for the reviewer's raw decision.
    ///
    /// Returns `None` if the reviewer gave no answer.
    async fn request_decision(&self, request: &ApprovalRequest) -> Option<Value>;

    /// Check if the handler can currently take requests.
    fn is_available(&self) -> bool;
}

/// Accepts every request. For unattended runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoApproveHandler;

#[async_trait]
impl ApprovalHandler for AutoApproveHandler {
    async fn request_decision(&self, _request: &ApprovalRequest) -> Option<Value> {
        Some(ApprovalDecision::Accept.to_value())
    }

    fn is_available(&self) -> bool {
        true
    }
}
