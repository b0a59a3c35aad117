//! Per-call context for correlating log lines.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Correlation data for one tool call, carried from dispatch through any
/// approval round-trip to execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallContext {
    /// Unique call identifier.
    pub call_id: Uuid,
    /// Session the call belongs to, shared by every call of one agent.
    pub session_id: Uuid,
    /// When the call started.
    pub started_at: DateTime<Utc>,
    /// Component that issued the call.
    pub source: String,
    /// Operation (tool) being performed.
    pub operation: Option<String>,
}

impl CallContext {
    /// Create a context in a fresh session.
    #[must_use]
    pub fn new(source: impl Into<String>) -> Self {
        Self::in_session(Uuid::new_v4(), source)
    }

    /// Create a context in an existing session.
    #[must_use]
    pub fn in_session(session_id: Uuid, source: impl Into<String>) -> Self {
        Self {
            call_id: Uuid::new_v4(),
            session_id,
            started_at: Utc::now(),
            source: source.into(),
            operation: None,
        }
    }

    /// Set the operation name.
    #[must_use]
    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = Some(operation.into());
        self
    }

    /// Milliseconds since the call started.
    #[must_use]
    pub fn elapsed_ms(&self) -> i64 {
        Utc::now()
            .signed_duration_since(self.started_at)
            .num_milliseconds()
    }

    /// Create a tracing span with this context.
    #[must_use]
    pub fn span(&self) -> tracing::Span {
        tracing::info_span!(
            "call",
            call_id = %self.short_id(),
            session_id = %self.session_id,
            source = %self.source,
            operation = self.operation.as_deref(),
        )
    }

    /// First eight hex digits of the call id.
    #[must_use]
    pub fn short_id(&self) -> String {
        let mut id = self.call_id.simple().to_string();
        id.truncate(8);
        id
    }
}
