//! Approval request and decision types.
//!
//! Decisions arrive from the outside world as loosely-shaped JSON:
//!
//! ```text
//! {"type": "accept"}
//! {"type": "edit", "args": {"args": {...}}}      (or "args": {...})
//! {"type": "response", "args": "feedback text"}
//! {"type": "reject", "args": "optional reason"}
//! ```
//!
//! The `type` value is matched case-insensitively.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::policy::{DecisionKind, InterruptPolicy};

/// Unique identifier for an approval request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(pub Uuid);

impl RequestId {
    /// Create a new random request ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "req:{}", self.0)
    }
}

impl FromStr for RequestId {
    type Err = uuid::Error;

    /// Accepts both `req:<uuid>` and a bare uuid.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.strip_prefix("req:").unwrap_or(s);
        Uuid::parse_str(raw).map(Self)
    }
}

/// A suspended call waiting for a reviewer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalRequest {
    /// Unique request identifier.
    pub id: RequestId,
    /// The operation being called.
    pub operation_name: String,
    /// Arguments of the call as requested.
    pub arguments: Value,
    /// Decisions the reviewer may take.
    pub policy: InterruptPolicy,
    /// Shown to the reviewer.
    pub description: String,
    /// When the request was created.
    pub created_at: DateTime<Utc>,
}

impl ApprovalRequest {
    /// Create a request; the description comes from the policy.
    #[must_use]
    pub fn new(operation_name: impl Into<String>, arguments: Value, policy: InterruptPolicy) -> Self {
        let description = policy.description.clone();
        Self {
            id: RequestId::new(),
            operation_name: operation_name.into(),
            arguments,
            policy,
            description,
            created_at: Utc::now(),
        }
    }
}

impl fmt::Display for ApprovalRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}({})", self.id, self.operation_name, self.arguments)
    }
}

/// A reviewer's decision, parsed from its wire form.
#[derive(Debug, Clone, PartialEq)]
pub enum ApprovalDecision {
    /// Run with the original arguments.
    Accept,
    /// Run with these arguments instead.
    Edit {
        /// Replacement arguments.
        arguments: Value,
    },
    /// Do not run; this text is the result.
    Response {
        /// Feedback for the caller.
        feedback: String,
    },
    /// Do not run.
    Reject {
        /// Optional explanation.
        reason: Option<String>,
    },
}

impl ApprovalDecision {
    /// The policy decision kind this maps onto.
    #[must_use]
    pub fn kind(&self) -> DecisionKind {
        match self {
            Self::Accept => DecisionKind::Approve,
            Self::Edit { .. } => DecisionKind::Edit,
            Self::Response { .. } => DecisionKind::Respond,
            Self::Reject { .. } => DecisionKind::Reject,
        }
    }

    /// Parse a raw decision.
    ///
    /// # Errors
    ///
    /// Returns a [`DecisionError`] describing why the decision is unusable.
    pub fn parse(raw: Option<&Value>) -> Result<Self, DecisionError> {
        let raw = match raw {
            None | Some(Value::Null) => return Err(DecisionError::Missing),
            Some(raw) => raw,
        };
        let Some(kind) = raw.get("type").and_then(Value::as_str) else {
            return Err(DecisionError::Malformed {
                received: raw.to_string(),
            });
        };
        let args = raw.get("args");

        match kind.to_ascii_lowercase().as_str() {
            "accept" => Ok(Self::Accept),
            "edit" => {
                let arguments = match args {
                    Some(Value::Object(map)) => map
                        .get("args")
                        .cloned()
                        .unwrap_or_else(|| Value::Object(map.clone())),
                    Some(other) if !other.is_null() => other.clone(),
                    _ => return Err(DecisionError::MissingArguments),
                };
                Ok(Self::Edit { arguments })
            },
            "response" => match args {
                Some(Value::String(text)) => Ok(Self::Response {
                    feedback: text.clone(),
                }),
                Some(other) if !other.is_null() => Ok(Self::Response {
                    feedback: other.to_string(),
                }),
                _ => Err(DecisionError::MissingFeedback),
            },
            "reject" => Ok(Self::Reject {
                reason: args.and_then(Value::as_str).map(str::to_string),
            }),
            _ => Err(DecisionError::Unsupported {
                kind: kind.to_string(),
            }),
        }
    }

    /// Check this decision against a policy.
    ///
    /// # Errors
    ///
    /// Returns [`DecisionError::NotAllowed`] if the policy forbids it.
    pub fn check(self, policy: &InterruptPolicy) -> Result<Self, DecisionError> {
        let kind = self.kind();
        if policy.allows(kind) {
            Ok(self)
        } else {
            Err(DecisionError::NotAllowed {
                kind,
                allowed: policy
                    .allowed_decisions
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", "),
            })
        }
    }

    /// Render back into the wire form [`ApprovalDecision::parse`] accepts.
    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            Self::Accept => json!({"type": "accept"}),
            Self::Edit { arguments } => json!({"type": "edit", "args": {"args": arguments}}),
            Self::Response { feedback } => json!({"type": "response", "args": feedback}),
            Self::Reject { reason: Some(reason) } => json!({"type": "reject", "args": reason}),
            Self::Reject { reason: None } => json!({"type": "reject"}),
        }
    }
}

/// Why a raw decision could not be used.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecisionError {
    /// Nothing came back from the reviewer.
    #[error("No response from interrupt")]
    Missing,

    /// No usable `type` key.
    #[error(
        "Please make sure your response contains a key 'type' and a value for it (accept, edit, response). Response received: {received}"
    )]
    Malformed {
        /// The raw decision as received.
        received: String,
    },

    /// A `type` outside the recognised set.
    #[error("Unsupported interrupt response type: {kind}. Expected one of: accept, edit, response")]
    Unsupported {
        /// The kind as received.
        kind: String,
    },

    /// An edit without replacement arguments.
    #[error("Edit decision is missing replacement arguments under 'args'")]
    MissingArguments,

    /// A response without feedback text.
    #[error("Response decision is missing feedback text under 'args'")]
    MissingFeedback,

    /// The policy does not allow this decision.
    #[error("Decision '{kind}' is not allowed for this call. Allowed decisions: {allowed}")]
    NotAllowed {
        /// The attempted decision.
        kind: DecisionKind,
        /// Allowed decisions, comma-separated.
        allowed: String,
    },
}
