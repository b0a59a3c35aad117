//! Two-phase approval across real tools.

mod common;

use archrecon_approval::{GateState, InterruptPolicy, InterruptRegistry, InterruptSetting};
use archrecon_tools::{DispatchOutcome, ToolDispatcher, ToolRegistry};
use common::WorkspaceHarness;
use serde_json::json;

const OFFLINE_PLANTUML: &str = "http://127.0.0.1:9/plantuml";

fn reviewed_dispatcher(harness: &WorkspaceHarness, tools: &[&str]) -> ToolDispatcher {
    let mut interrupts = InterruptRegistry::new();
    interrupts.apply_or_default(tools.iter().copied(), InterruptSetting::Enabled, false);
    ToolDispatcher::new(ToolRegistry::with_defaults(), interrupts, harness.ctx.clone())
}

#[tokio::test]
async fn test_nothing_runs_before_decision() {
    let harness = WorkspaceHarness::new(OFFLINE_PLANTUML);
    let dispatcher = reviewed_dispatcher(&harness, &["save_uml"]);
    let target = harness.ctx.workspace.root().join("pending.puml");

    let DispatchOutcome::AwaitingApproval(request) = dispatcher
        .dispatch(
            "save_uml",
            json!({"uml_description": "@startuml\n@enduml", "file_path": "pending.puml"}),
        )
        .await
    else {
        panic!("save_uml should be reviewed");
    };
    assert!(!target.exists());
    assert_eq!(request.policy, InterruptPolicy::permissive());

    let output = dispatcher
        .resume(&request.id, Some(json!({"type": "accept"})))
        .await
        .unwrap();
    assert!(output.success);
    assert!(target.exists());
}

#[tokio::test]
async fn test_edit_changes_arguments() {
    let harness = WorkspaceHarness::new(OFFLINE_PLANTUML);
    let dispatcher = reviewed_dispatcher(&harness, &["save_uml"]);

    let DispatchOutcome::AwaitingApproval(request) = dispatcher
        .dispatch(
            "save_uml",
            json!({"uml_description": "@startuml\n@enduml", "file_path": "original.puml"}),
        )
        .await
    else {
        panic!("save_uml should be reviewed");
    };

    let edited = json!({
        "type": "edit",
        "args": {"args": {"uml_description": "@startuml\nclass Edited\n@enduml", "file_path": "edited.puml"}}
    });
    dispatcher.resume(&request.id, Some(edited)).await.unwrap();

    let root = harness.ctx.workspace.root();
    assert!(!root.join("original.puml").exists());
    assert_eq!(
        std::fs::read_to_string(root.join("edited.puml")).unwrap(),
        "@startuml\nclass Edited\n@enduml"
    );
}

#[tokio::test]
async fn test_response_replaces_result_without_running() {
    let harness = WorkspaceHarness::new(OFFLINE_PLANTUML);
    let mut interrupts = InterruptRegistry::new();
    interrupts.register("save_uml", InterruptPolicy::unrestricted());
    let dispatcher = ToolDispatcher::new(ToolRegistry::with_defaults(), interrupts, harness.ctx.clone());

    let DispatchOutcome::AwaitingApproval(request) = dispatcher
        .dispatch(
            "save_uml",
            json!({"uml_description": "x", "file_path": "never.puml"}),
        )
        .await
    else {
        panic!("save_uml should be reviewed");
    };

    let outcome = dispatcher
        .gate()
        .resume(&request.id, Some(json!({"type": "response", "args": "use a class diagram"})))
        .await
        .unwrap();
    assert_eq!(outcome.state, GateState::Responded);
    assert_eq!(outcome.content, "use a class diagram");
    assert!(!harness.ctx.workspace.root().join("never.puml").exists());
}

#[tokio::test]
async fn test_disallowed_decision_is_an_error() {
    let harness = WorkspaceHarness::new(OFFLINE_PLANTUML);
    let mut interrupts = InterruptRegistry::new();
    interrupts.apply_or_default(["save_uml"], InterruptSetting::Default, false);
    let dispatcher = ToolDispatcher::new(ToolRegistry::with_defaults(), interrupts, harness.ctx.clone());

    let DispatchOutcome::AwaitingApproval(request) = dispatcher
        .dispatch(
            "save_uml",
            json!({"uml_description": "x", "file_path": "edit.puml"}),
        )
        .await
    else {
        panic!("save_uml should be reviewed");
    };

    let output = dispatcher
        .resume(&request.id, Some(json!({"type": "edit", "args": {"file_path": "other.puml"}})))
        .await
        .unwrap();
    assert!(!output.success);
    assert!(output.content.starts_with("Error:"));
    assert!(!harness.ctx.workspace.root().join("other.puml").exists());
}

#[tokio::test]
async fn test_unreviewed_navigation_and_extraction() {
    let harness = WorkspaceHarness::new(OFFLINE_PLANTUML);
    harness.repository(
        "shop",
        &[("src/cart.rs", "pub struct Cart;"), ("README.md", "# shop")],
    );
    let dispatcher = reviewed_dispatcher(&harness, &["git_clone"]);

    let listed = dispatcher.dispatch("list_repositories", json!({})).await;
    let DispatchOutcome::Completed(listed) = listed else {
        panic!("list_repositories is not reviewed");
    };
    assert_eq!(listed.content, "Available repositories: shop");

    let DispatchOutcome::Completed(moved) = dispatcher
        .dispatch("navigate_to_repository", json!({"repo_name": "shop"}))
        .await
    else {
        panic!("navigation is not reviewed");
    };
    assert!(moved.success);

    let DispatchOutcome::Completed(extracted) = dispatcher
        .dispatch("extract_repository_details", json!({}))
        .await
    else {
        panic!("extraction is not reviewed here");
    };
    assert!(extracted.content.starts_with("Directory: shop\nFiles analyzed: 2"));
    assert!(harness.ctx.layout.temp_repositories_dir().join("shop.json").exists());

    let DispatchOutcome::Completed(read) = dispatcher
        .dispatch("read_file", json!({"file_path": "src/cart.rs"}))
        .await
    else {
        panic!("read_file is not reviewed");
    };
    assert_eq!(read.content, "pub struct Cart;");
}

#[tokio::test]
async fn test_wrapper_inherits_policy() {
    let harness = WorkspaceHarness::new(OFFLINE_PLANTUML);
    let mut interrupts = InterruptRegistry::new();
    interrupts.register("save_uml", InterruptPolicy::default());
    interrupts.register_wrapper("update_uml", "save_uml");
    let dispatcher = ToolDispatcher::new(ToolRegistry::with_defaults(), interrupts, harness.ctx.clone());

    let outcome = dispatcher
        .dispatch(
            "update_uml",
            json!({"uml_content": "@startuml\n@enduml", "file_path": "w.puml"}),
        )
        .await;
    assert!(matches!(outcome, DispatchOutcome::AwaitingApproval(_)));
    assert!(dispatcher.interrupt_map()["update_uml"].policy().is_some());
}
