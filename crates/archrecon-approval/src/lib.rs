//! Archrecon Approval - Human-in-the-loop review of tool calls.
//!
//! Two pieces cooperate here:
//!
//! - [`InterruptRegistry`]: maps each operation name to an [`InterruptPolicy`]
//!   (which decisions a reviewer may take, plus a description), or to nothing.
//! - [`ApprovalGate`]: suspends a call behind a [`RequestId`], waits for an
//!   external decision, and then runs, edits, short-circuits or refuses it.
//!
//! # Gate states
//!
//! ```text
//! PENDING ──accept──────▶ ACCEPTED   (runs with original arguments)
//!         ──edit────────▶ EDITED     (runs with replacement arguments)
//!         ──response────▶ RESPONDED  (never runs; feedback is the result)
//!         ──anything else▶ ERROR     (never runs; explicit error result)
//! ```
//!
//! # Example
//!
//! ```
//! use archrecon_approval::{ApprovalGate, GateState, InterruptPolicy, continuation};
//! use serde_json::json;
//!
//! # tokio_test_block_on(async {
//! let gate = ApprovalGate::new();
//! let request = gate.suspend(
//!     "git_clone",
//!     json!({"repo_url": "https://example.com/app.git"}),
//!     InterruptPolicy::permissive(),
//!     continuation(|args| async move { Ok(format!("cloned {args}")) }),
//! );
//!
//! let outcome = gate
//!     .resume(&request.id, Some(json!({"type": "response", "args": "skip"})))
//!     .await
//!     .unwrap();
//! assert_eq!(outcome.state, GateState::Responded);
//! assert_eq!(outcome.content, "skip");
//! # });
//! # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
//! #     futures::executor::block_on(f)
//! # }
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

/// Error types and results for the approval module.
pub mod error;
pub mod gate;
pub mod handler;
pub mod policy;
pub mod registry;
pub mod request;
pub mod transcript;

pub use error::{ApprovalError, ApprovalResult};
pub use gate::{ApprovalGate, Continuation, GateOutcome, GateState, continuation};
pub use handler::{ApprovalHandler, AutoApproveHandler};
pub use policy::{DEFAULT_INTERRUPT_DESCRIPTION, DecisionKind, InterruptPolicy};
pub use registry::{InterruptEntry, InterruptRegistry, InterruptSetting};
pub use request::{ApprovalDecision, ApprovalRequest, DecisionError, RequestId};
pub use transcript::{MessageStatus, ToolMessage};
