//! Routes tool calls through the interrupt registry, the approval gate and
//! the workspace guard.
//!
//! ```text
//! dispatch(name, args)
//!   ├── no policy ──────────────▶ execute ──▶ Completed(output)
//!   └── policy ──▶ gate.suspend ──▶ AwaitingApproval(request)
//!                                      │
//! resume(id, decision) ◀───────────────┘
//!   └── accept/edit ──▶ execute ──▶ output
//! ```
//!
//! Errors never escape as `Err`: every failure becomes a [`ToolOutput`]
//! whose content starts with `Error:`.

use archrecon_approval::{
    ApprovalGate, ApprovalHandler, ApprovalRequest, ApprovalResult, GateOutcome,
    InterruptEntry, InterruptRegistry, RequestId, continuation,
};
use archrecon_telemetry::CallContext;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{Instrument, debug, info, warn};
use uuid::Uuid;

use crate::{BuiltinTool, ToolContext, ToolRegistry};

const ERROR_PREFIX: &str = "Error:";

/// Final result of a tool call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolOutput {
    /// Whether the tool completed. A tool may still report a failed
    /// operation inside its content (see `git_clone`).
    pub success: bool,
    /// Result text, or `Error: ...`.
    pub content: String,
}

impl ToolOutput {
    fn success(content: String) -> Self {
        Self {
            success: true,
            content,
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        let message = message.into();
        let content = if message.starts_with(ERROR_PREFIX) {
            message
        } else {
            format!("{ERROR_PREFIX} {message}")
        };
        Self {
            success: false,
            content,
        }
    }

    fn from_result(result: Result<String, String>) -> Self {
        match result {
            Ok(content) => Self::success(content),
            Err(message) => Self::failure(message),
        }
    }

    fn from_outcome(outcome: GateOutcome) -> Self {
        if outcome.is_success() {
            Self::success(outcome.content)
        } else {
            Self::failure(outcome.content)
        }
    }
}

/// What [`ToolDispatcher::dispatch`] did with a call.
#[derive(Debug, Clone)]
pub enum DispatchOutcome {
    /// The tool ran (or failed before running).
    Completed(ToolOutput),
    /// The call is parked until [`ToolDispatcher::resume`].
    AwaitingApproval(ApprovalRequest),
}

/// Runs tools for one agent session.
pub struct ToolDispatcher {
    registry: Arc<ToolRegistry>,
    interrupts: InterruptRegistry,
    gate: Arc<ApprovalGate>,
    ctx: ToolContext,
    session_id: Uuid,
}

impl std::fmt::Debug for ToolDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolDispatcher")
            .field("tools", &self.registry.len())
            .field("gate", &self.gate)
            .field("session_id", &self.session_id)
            .finish_non_exhaustive()
    }
}

impl ToolDispatcher {
    /// Create a dispatcher over `registry`, reviewing calls per `interrupts`.
    #[must_use]
    pub fn new(registry: ToolRegistry, interrupts: InterruptRegistry, ctx: ToolContext) -> Self {
        Self {
            registry: Arc::new(registry),
            interrupts,
            gate: Arc::new(ApprovalGate::new()),
            ctx,
            session_id: Uuid::new_v4(),
        }
    }

    /// Every default tool, none of them reviewed.
    #[must_use]
    pub fn with_defaults(ctx: ToolContext) -> Self {
        Self::new(ToolRegistry::with_defaults(), InterruptRegistry::new(), ctx)
    }

    /// Share an existing gate, e.g. with a front-end that lists pending
    /// requests.
    #[must_use]
    pub fn with_gate(mut self, gate: Arc<ApprovalGate>) -> Self {
        self.gate = gate;
        self
    }

    /// The registered tools.
    #[must_use]
    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// The interrupt configuration.
    #[must_use]
    pub fn interrupts(&self) -> &InterruptRegistry {
        &self.interrupts
    }

    /// The approval gate.
    #[must_use]
    pub fn gate(&self) -> &Arc<ApprovalGate> {
        &self.gate
    }

    /// The context tools run with.
    #[must_use]
    pub fn context(&self) -> &ToolContext {
        &self.ctx
    }

    /// Session identifier shared by every call's log span.
    #[must_use]
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Interrupt entry for every registered tool, `false` where none applies.
    #[must_use]
    pub fn interrupt_map(&self) -> BTreeMap<String, InterruptEntry> {
        self.interrupts.build_config_map(self.registry.names())
    }

    /// Run a call, or park it at the gate if its tool is reviewed.
    pub async fn dispatch(&self, name: &str, args: Value) -> DispatchOutcome {
        let Some(tool) = self.registry.get(name) else {
            warn!(tool = name, "Unknown tool");
            return DispatchOutcome::Completed(ToolOutput::failure(format!(
                "Unknown tool: {name}"
            )));
        };

        let call = CallContext::in_session(self.session_id, "dispatcher").with_operation(name);

        if let Some(policy) = self.interrupts.resolve(name).cloned() {
            let ctx = self.ctx.clone();
            let deferred = continuation(move |args| execute_tool(tool, args, ctx, call));
            let request = self.gate.suspend(name, args, policy, deferred);
            return DispatchOutcome::AwaitingApproval(request);
        }

        let result = execute_tool(tool, args, self.ctx.clone(), call).await;
        DispatchOutcome::Completed(ToolOutput::from_result(result))
    }

    /// Resolve a parked call with the reviewer's raw decision.
    ///
    /// # Errors
    ///
    /// Returns an error if `id` is not pending.
    pub async fn resume(&self, id: &RequestId, decision: Option<Value>) -> ApprovalResult<ToolOutput> {
        let outcome = self.gate.resume(id, decision).await?;
        Ok(ToolOutput::from_outcome(outcome))
    }

    /// Dispatch a call and, if it is parked, let `handler` decide at once.
    pub async fn call(&self, name: &str, args: Value, handler: &dyn ApprovalHandler) -> ToolOutput {
        match self.dispatch(name, args).await {
            DispatchOutcome::Completed(output) => output,
            DispatchOutcome::AwaitingApproval(request) => {
                match self.gate.review(&request, handler).await {
                    Ok(outcome) => ToolOutput::from_outcome(outcome),
                    Err(e) => ToolOutput::failure(e.to_string()),
                }
            },
        }
    }
}

/// Execute one tool, inside the workspace guard when it touches files.
async fn execute_tool(
    tool: Arc<dyn BuiltinTool>,
    args: Value,
    ctx: ToolContext,
    call: CallContext,
) -> Result<String, String> {
    let span = call.span();
    async move {
        debug!(args = %args, "Executing tool");
        let result = if tool.touches_filesystem() {
            ctx.workspace
                .enforce_async(|_| tool.execute(args, &ctx))
                .await
                .map_err(|e| e.to_string())
        } else {
            tool.execute(args, &ctx)
                .await
                .map_err(|e| format!("{ERROR_PREFIX} {e}"))
        };

        match &result {
            Ok(_) => info!(elapsed_ms = call.elapsed_ms(), "Tool completed"),
            Err(e) => warn!(elapsed_ms = call.elapsed_ms(), error = %e, "Tool failed"),
        }
        result
    }
    .instrument(span)
    .await
}
