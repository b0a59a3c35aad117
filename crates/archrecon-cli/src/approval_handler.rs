//! Terminal reviewer for suspended tool calls.
//!
//! Implements [`ApprovalHandler`] with `dialoguer` prompts. Only the
//! decisions the request's policy allows are offered.

use archrecon_approval::{ApprovalDecision, ApprovalHandler, ApprovalRequest, DecisionKind};
use async_trait::async_trait;
use dialoguer::{Input, Select, theme::ColorfulTheme};
use serde_json::Value;
use tracing::debug;

use crate::theme::Theme;

/// CLI implementation of the approval handler.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct CliApprovalHandler;

#[async_trait]
impl ApprovalHandler for CliApprovalHandler {
    async fn request_decision(&self, request: &ApprovalRequest) -> Option<Value> {
        let request = request.clone();
        // dialoguer blocks on the terminal.
        let decision = tokio::task::spawn_blocking(move || prompt(&request))
            .await
            .ok()??;
        Some(decision.to_value())
    }

    fn is_available(&self) -> bool {
        true
    }
}

fn label(kind: DecisionKind) -> &'static str {
    match kind {
        DecisionKind::Approve => "Accept",
        DecisionKind::Edit => "Edit arguments",
        DecisionKind::Respond => "Respond instead of running",
        DecisionKind::Reject => "Reject",
    }
}

/// Render the request the way the reviewer sees it.
pub(crate) fn describe(request: &ApprovalRequest) -> String {
    let args = serde_json::to_string_pretty(&request.arguments)
        .unwrap_or_else(|_| request.arguments.to_string());
    let allowed: Vec<String> = request
        .policy
        .allowed_decisions
        .iter()
        .map(ToString::to_string)
        .collect();

    let mut lines = vec![
        Theme::kv("Tool", &request.operation_name),
        format!("  {}", request.description),
        Theme::kv("Allowed", &allowed.join(", ")),
        Theme::kv("Arguments", ""),
    ];
    lines.extend(args.lines().map(|line| format!("  {line}")));
    lines.join("\n")
}

fn prompt(request: &ApprovalRequest) -> Option<ApprovalDecision> {
    println!("\n{}", Theme::review_box("Review Required", &describe(request)));

    let kinds: Vec<DecisionKind> = request.policy.allowed_decisions.iter().copied().collect();
    if kinds.is_empty() {
        return None;
    }
    let labels: Vec<&str> = kinds.iter().copied().map(label).collect();
    let theme = ColorfulTheme::default();

    let selection = Select::with_theme(&theme)
        .items(&labels)
        .default(0)
        .interact()
        .ok()?;
    let kind = *kinds.get(selection)?;
    debug!(request = %request.id, decision = %kind, "Reviewer chose");

    match kind {
        DecisionKind::Approve => Some(ApprovalDecision::Accept),
        DecisionKind::Edit => {
            let initial = request.arguments.to_string();
            let text: String = Input::with_theme(&theme)
                .with_prompt("Arguments (JSON)")
                .with_initial_text(initial)
                .validate_with(|input: &String| -> Result<(), String> {
                    serde_json::from_str::<Value>(input)
                        .map(|_| ())
                        .map_err(|e| format!("invalid JSON: {e}"))
                })
                .interact_text()
                .ok()?;
            let arguments = serde_json::from_str(&text).ok()?;
            Some(ApprovalDecision::Edit { arguments })
        },
        DecisionKind::Respond => {
            let feedback: String = Input::with_theme(&theme)
                .with_prompt("Response")
                .interact_text()
                .ok()?;
            Some(ApprovalDecision::Response { feedback })
        },
        DecisionKind::Reject => {
            let reason: String = Input::with_theme(&theme)
                .with_prompt("Reason (optional)")
                .allow_empty(true)
                .interact_text()
                .ok()?;
            let reason = Some(reason.trim().to_string()).filter(|r| !r.is_empty());
            Some(ApprovalDecision::Reject { reason })
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use archrecon_approval::InterruptPolicy;
    use serde_json::json;

    #[test]
    fn test_describe_lists_allowed_decisions() {
        let request = ApprovalRequest::new(
            "git_clone",
            json!({"repo_url": "https://example.invalid/app.git", "dest": "app"}),
            InterruptPolicy::permissive(),
        );
        let text = describe(&request);
        assert!(text.contains("git_clone"));
        assert!(text.contains("approve, edit, reject"));
        assert!(text.contains("\"dest\": \"app\""));
    }

    #[test]
    fn test_labels_cover_every_kind() {
        for kind in InterruptPolicy::unrestricted().allowed_decisions {
            assert!(!label(kind).is_empty());
        }
    }
}
