//! The human approval gate.
//!
//! A call is suspended with [`ApprovalGate::suspend`], which parks its
//! continuation under a fresh [`RequestId`] and hands back the request for a
//! reviewer. [`ApprovalGate::resume`] removes the entry and resolves it, so a
//! request can be resumed exactly once and its continuation runs at most once.
//!
//! Each resolution, failures included, appends exactly one [`ToolMessage`]
//! to the gate's transcript.

use futures::FutureExt;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Mutex, PoisonError};
use tracing::{info, warn};

use crate::error::{ApprovalError, ApprovalResult};
use crate::handler::ApprovalHandler;
use crate::policy::InterruptPolicy;
use crate::request::{ApprovalDecision, ApprovalRequest, RequestId};
use crate::transcript::{MessageStatus, ToolMessage};

/// The deferred call: takes the arguments to run with.
pub type Continuation = Box<dyn FnOnce(Value) -> BoxFuture<'static, Result<String, String>> + Send>;

/// Box an async closure as a [`Continuation`].
pub fn continuation<F, Fut>(f: F) -> Continuation
where
    F: FnOnce(Value) -> Fut + Send + 'static,
    Fut: Future<Output = Result<String, String>> + Send + 'static,
{
    Box::new(move |args| f(args).boxed())
}

/// Where a request ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateState {
    /// Ran with the original arguments.
    Accepted,
    /// Ran with replacement arguments.
    Edited,
    /// Did not run; the reviewer's feedback is the result.
    Responded,
    /// Did not run; the decision was missing, malformed, unsupported,
    /// rejected, or not allowed by the policy.
    Error,
}

impl GateState {
    /// Check if the continuation ran in this state.
    #[must_use]
    pub fn executed(self) -> bool {
        matches!(self, Self::Accepted | Self::Edited)
    }
}

/// Result of resolving one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateOutcome {
    /// The resolved request.
    pub request_id: RequestId,
    /// The operation that was called.
    pub operation: String,
    /// Final state.
    pub state: GateState,
    /// Result text, feedback, or error message.
    pub content: String,
    /// Success or error.
    pub status: MessageStatus,
}

impl GateOutcome {
    /// Check if the outcome carries a usable result.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == MessageStatus::Success
    }
}

struct Pending {
    request: ApprovalRequest,
    continuation: Continuation,
}

/// Pending-request table plus the transcript of resolutions.
#[derive(Default)]
pub struct ApprovalGate {
    pending: Mutex<HashMap<RequestId, Pending>>,
    transcript: Mutex<Vec<ToolMessage>>,
}

impl std::fmt::Debug for ApprovalGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApprovalGate")
            .field("pending", &self.pending_count())
            .field("transcript", &self.transcript().len())
            .finish()
    }
}

impl ApprovalGate {
    /// Create a gate with nothing pending.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Park a call until a reviewer decides. Phase one of two.
    ///
    /// Nothing runs until [`ApprovalGate::resume`] is called with the
    /// returned request's id. A request that is never resumed stays pending.
    pub fn suspend(
        &self,
        operation: impl Into<String>,
        arguments: Value,
        policy: InterruptPolicy,
        continuation: Continuation,
    ) -> ApprovalRequest {
        let request = ApprovalRequest::new(operation, arguments, policy);
        info!(
            request_id = %request.id,
            operation = %request.operation_name,
            "Suspended call pending review"
        );
        self.lock_pending().insert(
            request.id,
            Pending {
                request: request.clone(),
                continuation,
            },
        );
        request
    }

    /// Resolve a pending request with a raw decision. Phase two of two.
    ///
    /// # Errors
    ///
    /// Returns [`ApprovalError::UnknownRequest`] if `id` is not pending,
    /// including when it was already resumed. Every decision problem resolves
    /// into [`GateState::Error`] rather than an `Err`.
    pub async fn resume(&self, id: &RequestId, decision: Option<Value>) -> ApprovalResult<GateOutcome> {
        let Pending {
            request,
            continuation,
        } = self
            .lock_pending()
            .remove(id)
            .ok_or(ApprovalError::UnknownRequest { id: *id })?;

        let decision =
            ApprovalDecision::parse(decision.as_ref()).and_then(|d| d.check(&request.policy));

        let (state, result) = match decision {
            Ok(ApprovalDecision::Accept) => {
                let args = request.arguments.clone();
                let result = run(continuation, args, &request.operation_name).await;
                (GateState::Accepted, result)
            },
            Ok(ApprovalDecision::Edit { arguments }) => {
                (GateState::Edited, run(continuation, arguments, &request.operation_name).await)
            },
            Ok(ApprovalDecision::Response { feedback }) => (GateState::Responded, Ok(feedback)),
            Ok(ApprovalDecision::Reject { reason }) => {
                let message = match reason {
                    Some(reason) => format!(
                        "Tool call '{}' was rejected by the reviewer: {reason}",
                        request.operation_name
                    ),
                    None => format!(
                        "Tool call '{}' was rejected by the reviewer",
                        request.operation_name
                    ),
                };
                (GateState::Error, Err(message))
            },
            Err(e) => (GateState::Error, Err(e.to_string())),
        };

        let (content, status) = match result {
            Ok(content) => (content, MessageStatus::Success),
            Err(content) => (content, MessageStatus::Error),
        };

        if status == MessageStatus::Error {
            warn!(request_id = %request.id, state = ?state, error = %content, "Review resolved with error");
        } else {
            info!(request_id = %request.id, state = ?state, "Review resolved");
        }

        self.lock_transcript().push(ToolMessage::new(
            request.id,
            request.operation_name.clone(),
            content.clone(),
            status,
        ));

        Ok(GateOutcome {
            request_id: request.id,
            operation: request.operation_name,
            state,
            content,
            status,
        })
    }

    /// Ask `handler` for a decision on a pending request, then resume it.
    ///
    /// # Errors
    ///
    /// Returns [`ApprovalError::HandlerUnavailable`] (leaving the request
    /// pending) if the handler cannot take requests, or any error from
    /// [`ApprovalGate::resume`].
    pub async fn review(
        &self,
        request: &ApprovalRequest,
        handler: &dyn ApprovalHandler,
    ) -> ApprovalResult<GateOutcome> {
        if !handler.is_available() {
            return Err(ApprovalError::HandlerUnavailable);
        }
        let decision = handler.request_decision(request).await;
        self.resume(&request.id, decision).await
    }

    /// Requests still waiting for a decision.
    #[must_use]
    pub fn pending(&self) -> Vec<ApprovalRequest> {
        let mut requests: Vec<_> = self
            .lock_pending()
            .values()
            .map(|p| p.request.clone())
            .collect();
        requests.sort_by_key(|r| r.created_at);
        requests
    }

    /// Number of requests waiting for a decision.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.lock_pending().len()
    }

    /// Check if `id` is waiting for a decision.
    #[must_use]
    pub fn is_pending(&self, id: &RequestId) -> bool {
        self.lock_pending().contains_key(id)
    }

    /// Every resolution so far, oldest first.
    #[must_use]
    pub fn transcript(&self) -> Vec<ToolMessage> {
        self.lock_transcript().clone()
    }

    fn lock_pending(&self) -> std::sync::MutexGuard<'_, HashMap<RequestId, Pending>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_transcript(&self) -> std::sync::MutexGuard<'_, Vec<ToolMessage>> {
        self.transcript.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Run a continuation, turning a panic into an error result.
///
/// The pending entry is already gone by the time this runs, so a panic
/// must still resolve into a transcript message.
async fn run(continuation: Continuation, args: Value, operation: &str) -> Result<String, String> {
    let outcome = AssertUnwindSafe(async move { continuation(args).await })
        .catch_unwind()
        .await;
    outcome.unwrap_or_else(|payload| {
        Err(format!(
            "Tool call '{operation}' panicked: {}",
            panic_message(payload.as_ref())
        ))
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "continuation panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::AutoApproveHandler;
    use serde_json::json;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Mutex as AsyncMutex;

    // ---------------------------------------------------------------------------
    // Helpers
    // ---------------------------------------------------------------------------

    /// Records every invocation of the continuation.
    #[derive(Clone, Default)]
    struct Recorder {
        calls: Arc<AtomicUsize>,
        seen: Arc<AsyncMutex<Vec<Value>>>,
    }

    impl Recorder {
        fn continuation(&self) -> Continuation {
            let calls = Arc::clone(&self.calls);
            let seen = Arc::clone(&self.seen);
            continuation(move |args| async move {
                calls.fetch_add(1, Ordering::SeqCst);
                seen.lock().await.push(args.clone());
                Ok(format!("ran with {args}"))
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    fn suspend(gate: &ApprovalGate, recorder: &Recorder) -> ApprovalRequest {
        gate.suspend(
            "op",
            json!({"a": 1}),
            InterruptPolicy::unrestricted(),
            recorder.continuation(),
        )
    }

    // ---------------------------------------------------------------------------
    // State transitions
    // ---------------------------------------------------------------------------

    #[tokio::test]
    async fn test_accept_runs_once_with_original_args() {
        let gate = ApprovalGate::new();
        let recorder = Recorder::default();
        let request = suspend(&gate, &recorder);

        let outcome = gate
            .resume(&request.id, Some(json!({"type": "accept"})))
            .await
            .unwrap();

        assert_eq!(outcome.state, GateState::Accepted);
        assert!(outcome.is_success());
        assert_eq!(recorder.calls(), 1);
        assert_eq!(*recorder.seen.lock().await, vec![json!({"a": 1})]);
    }

    #[tokio::test]
    async fn test_edit_runs_once_with_replacement_args() {
        let gate = ApprovalGate::new();
        let recorder = Recorder::default();
        let request = suspend(&gate, &recorder);

        let outcome = gate
            .resume(
                &request.id,
                Some(json!({"type": "edit", "args": {"args": {"a": 2}}})),
            )
            .await
            .unwrap();

        assert_eq!(outcome.state, GateState::Edited);
        assert_eq!(recorder.calls(), 1);
        assert_eq!(*recorder.seen.lock().await, vec![json!({"a": 2})]);
    }

    #[tokio::test]
    async fn test_response_never_runs() {
        let gate = ApprovalGate::new();
        let recorder = Recorder::default();
        let request = suspend(&gate, &recorder);

        let outcome = gate
            .resume(&request.id, Some(json!({"type": "response", "args": "skip"})))
            .await
            .unwrap();

        assert_eq!(outcome.state, GateState::Responded);
        assert_eq!(outcome.content, "skip");
        assert_eq!(recorder.calls(), 0);
    }

    #[tokio::test]
    async fn test_unrecognised_kind_is_error() {
        let gate = ApprovalGate::new();
        let recorder = Recorder::default();
        let request = suspend(&gate, &recorder);

        let outcome = gate
            .resume(&request.id, Some(json!({"type": "maybe"})))
            .await
            .unwrap();

        assert_eq!(outcome.state, GateState::Error);
        assert!(!outcome.is_success());
        assert!(outcome.content.contains("maybe"));
        assert_eq!(recorder.calls(), 0);
    }

    #[tokio::test]
    async fn test_missing_decision_is_error() {
        let gate = ApprovalGate::new();
        let recorder = Recorder::default();
        let request = suspend(&gate, &recorder);

        let outcome = gate.resume(&request.id, None).await.unwrap();

        assert_eq!(outcome.state, GateState::Error);
        assert_eq!(outcome.content, "No response from interrupt");
        assert_eq!(recorder.calls(), 0);
    }

    #[tokio::test]
    async fn test_reject_is_error_and_never_runs() {
        let gate = ApprovalGate::new();
        let recorder = Recorder::default();
        let request = suspend(&gate, &recorder);

        let outcome = gate
            .resume(&request.id, Some(json!({"type": "reject", "args": "not now"})))
            .await
            .unwrap();

        assert_eq!(outcome.state, GateState::Error);
        assert_eq!(
            outcome.content,
            "Tool call 'op' was rejected by the reviewer: not now"
        );
        assert_eq!(recorder.calls(), 0);
    }

    #[tokio::test]
    async fn test_policy_forbidden_decision_is_error() {
        let gate = ApprovalGate::new();
        let recorder = Recorder::default();
        let request = gate.suspend(
            "op",
            json!({"a": 1}),
            InterruptPolicy::default(),
            recorder.continuation(),
        );

        let outcome = gate
            .resume(&request.id, Some(json!({"type": "edit", "args": {"a": 9}})))
            .await
            .unwrap();

        assert_eq!(outcome.state, GateState::Error);
        assert!(outcome.content.contains("not allowed"));
        assert_eq!(recorder.calls(), 0);
    }

    #[tokio::test]
    async fn test_continuation_failure_is_reported() {
        let gate = ApprovalGate::new();
        let request = gate.suspend(
            "op",
            json!({}),
            InterruptPolicy::default(),
            continuation(|_| async { Err("clone failed".to_string()) }),
        );

        let outcome = gate
            .resume(&request.id, Some(json!({"type": "accept"})))
            .await
            .unwrap();

        assert_eq!(outcome.state, GateState::Accepted);
        assert_eq!(outcome.status, MessageStatus::Error);
        assert_eq!(outcome.content, "clone failed");
    }

    #[tokio::test]
    async fn test_continuation_panic_is_recorded() {
        let gate = ApprovalGate::new();
        let request = gate.suspend(
            "op",
            json!({}),
            InterruptPolicy::default(),
            continuation(|_| async { panic!("boom") }),
        );

        let outcome = gate
            .resume(&request.id, Some(json!({"type": "accept"})))
            .await
            .unwrap();

        assert!(!outcome.is_success());
        assert_eq!(outcome.state, GateState::Accepted);
        assert_eq!(outcome.content, "Tool call 'op' panicked: boom");
        assert_eq!(gate.pending_count(), 0);

        let transcript = gate.transcript();
        assert_eq!(transcript.len(), 1);
        assert!(transcript[0].is_error());
        assert!(!gate.is_pending(&request.id));
    }

    // ---------------------------------------------------------------------------
    // Table and transcript
    // ---------------------------------------------------------------------------

    #[tokio::test]
    async fn test_resume_is_single_use() {
        let gate = ApprovalGate::new();
        let recorder = Recorder::default();
        let request = suspend(&gate, &recorder);
        assert!(gate.is_pending(&request.id));

        gate.resume(&request.id, Some(json!({"type": "accept"})))
            .await
            .unwrap();
        let again = gate
            .resume(&request.id, Some(json!({"type": "accept"})))
            .await;

        assert!(matches!(again, Err(ApprovalError::UnknownRequest { .. })));
        assert_eq!(recorder.calls(), 1);
        assert_eq!(gate.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_one_message_per_resolution() {
        let gate = ApprovalGate::new();
        let recorder = Recorder::default();

        for decision in [
            Some(json!({"type": "accept"})),
            Some(json!({"type": "response", "args": "no"})),
            Some(json!({"type": "bogus"})),
            None,
        ] {
            let request = suspend(&gate, &recorder);
            gate.resume(&request.id, decision).await.unwrap();
        }

        let transcript = gate.transcript();
        assert_eq!(transcript.len(), 4);
        assert_eq!(
            transcript.iter().filter(|m| m.is_error()).count(),
            2
        );
    }

    #[tokio::test]
    async fn test_unresumed_requests_stay_pending() {
        let gate = ApprovalGate::new();
        let recorder = Recorder::default();
        let first = suspend(&gate, &recorder);
        let second = suspend(&gate, &recorder);

        let pending = gate.pending();
        assert_eq!(pending.len(), 2);
        assert!(pending.iter().any(|r| r.id == first.id));
        assert!(pending.iter().any(|r| r.id == second.id));
        assert!(gate.transcript().is_empty());
    }

    #[tokio::test]
    async fn test_review_with_handler() {
        let gate = ApprovalGate::new();
        let recorder = Recorder::default();
        let request = suspend(&gate, &recorder);

        let outcome = gate.review(&request, &AutoApproveHandler).await.unwrap();
        assert_eq!(outcome.state, GateState::Accepted);
        assert_eq!(recorder.calls(), 1);
    }
}
