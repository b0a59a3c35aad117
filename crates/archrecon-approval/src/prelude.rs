//! Prelude module - commonly used types for convenient import.
//!
//! Use `use archrecon_approval::prelude::*;` to import all essential types.

// Policies
pub use crate::{DecisionKind, InterruptEntry, InterruptPolicy, InterruptRegistry, InterruptSetting};

// Gate
pub use crate::{
    ApprovalDecision, ApprovalGate, ApprovalHandler, ApprovalRequest, GateOutcome, GateState,
    RequestId, continuation,
};

// Errors
pub use crate::{ApprovalError, ApprovalResult};
