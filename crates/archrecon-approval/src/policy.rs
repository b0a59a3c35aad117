//! Interrupt policies: what a reviewer may decide about an operation.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Description shown to reviewers when none is given.
pub const DEFAULT_INTERRUPT_DESCRIPTION: &str = "Review the tool call.";

/// A decision a reviewer may be allowed to take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionKind {
    /// Run the call as requested.
    Approve,
    /// Run the call with replacement arguments.
    Edit,
    /// Refuse the call.
    Reject,
    /// Answer in place of the call.
    Respond,
}

impl fmt::Display for DecisionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Approve => "approve",
            Self::Edit => "edit",
            Self::Reject => "reject",
            Self::Respond => "respond",
        };
        f.write_str(s)
    }
}

/// Allowed decisions plus the description shown to the reviewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterruptPolicy {
    /// Decisions the reviewer may take.
    pub allowed_decisions: BTreeSet<DecisionKind>,
    /// Shown to the reviewer alongside the call.
    pub description: String,
}

impl InterruptPolicy {
    /// Create a policy.
    #[must_use]
    pub fn new(
        allowed_decisions: impl IntoIterator<Item = DecisionKind>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            allowed_decisions: allowed_decisions.into_iter().collect(),
            description: description.into(),
        }
    }

    /// Approve, edit or reject.
    #[must_use]
    pub fn permissive() -> Self {
        Self::new(
            [DecisionKind::Approve, DecisionKind::Edit, DecisionKind::Reject],
            DEFAULT_INTERRUPT_DESCRIPTION,
        )
    }

    /// Every decision kind.
    #[must_use]
    pub fn unrestricted() -> Self {
        Self::new(
            [
                DecisionKind::Approve,
                DecisionKind::Edit,
                DecisionKind::Reject,
                DecisionKind::Respond,
            ],
            DEFAULT_INTERRUPT_DESCRIPTION,
        )
    }

    /// Replace the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Check if the reviewer may take `kind`.
    #[must_use]
    pub fn allows(&self, kind: DecisionKind) -> bool {
        self.allowed_decisions.contains(&kind)
    }
}

impl Default for InterruptPolicy {
    /// Approve or reject.
    fn default() -> Self {
        Self::new(
            [DecisionKind::Approve, DecisionKind::Reject],
            DEFAULT_INTERRUPT_DESCRIPTION,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let policy = InterruptPolicy::default();
        assert!(policy.allows(DecisionKind::Approve));
        assert!(policy.allows(DecisionKind::Reject));
        assert!(!policy.allows(DecisionKind::Edit));
        assert_eq!(policy.description, "Review the tool call.");
    }

    #[test]
    fn test_permissive_policy() {
        let policy = InterruptPolicy::permissive();
        assert!(policy.allows(DecisionKind::Edit));
        assert!(!policy.allows(DecisionKind::Respond));
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(InterruptPolicy::default()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "allowed_decisions": ["approve", "reject"],
                "description": "Review the tool call."
            })
        );
    }
}
