//! Audit messages produced when approval requests resolve.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::request::RequestId;

/// Whether a resolution produced a usable result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageStatus {
    /// The call ran, or the reviewer answered in its place.
    Success,
    /// The call failed, or was refused or never decided.
    Error,
}

/// One transcript entry, paired with the request it resolves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolMessage {
    /// The request this message resolves.
    pub request_id: RequestId,
    /// The operation that was called.
    pub operation: String,
    /// Result text, feedback, or error message.
    pub content: String,
    /// Success or error.
    pub status: MessageStatus,
    /// When the request resolved.
    pub timestamp: DateTime<Utc>,
}

impl ToolMessage {
    /// Create a message stamped with the current time.
    #[must_use]
    pub fn new(
        request_id: RequestId,
        operation: impl Into<String>,
        content: impl Into<String>,
        status: MessageStatus,
    ) -> Self {
        Self {
            request_id,
            operation: operation.into(),
            content: content.into(),
            status,
            timestamp: Utc::now(),
        }
    }

    /// Check if this message reports an error.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.status == MessageStatus::Error
    }
}
