//! Batch driver tests

use std::time::Duration;

use tooldeploy::app::options::DeployOptions;
use tooldeploy::app::run::{deploy_tools, select_tools, ToolResult};
use tooldeploy::deploy::controller::PollSettings;
use tooldeploy::errors::DeployerError;
use tooldeploy::models::deployment::DeploymentOutcome;

use crate::common::{tool, FakeApi, FakeTokens, ManualClock, Reply};

fn options() -> DeployOptions {
    DeployOptions {
        poll: PollSettings::unbounded(Duration::from_secs(1)),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_batch_continues_past_failures() {
    let api = FakeApi::new()
        .script("alpha", Reply::Http(500), vec![])
        .script("gamma", Reply::Accepted("g1"), vec![Reply::Status("successful")]);
    let tokens = FakeTokens::with(&["alpha", "gamma"]);
    let clock = ManualClock::new();

    let report = deploy_tools(
        vec![tool("alpha"), tool("beta"), tool("gamma")],
        &tokens,
        &api,
        &clock,
        &options(),
    )
    .await
    .unwrap();

    assert_eq!(report.results.len(), 3);
    assert!(matches!(
        &report.results[0].1,
        ToolResult::Errored(DeployerError::ApiError { status: 500, .. })
    ));
    // no token, the controller never ran for beta
    assert!(matches!(
        &report.results[1].1,
        ToolResult::Errored(DeployerError::TokenError(_))
    ));
    assert!(report.results[2].1.is_success());
    assert!(!report.all_succeeded());
    assert_eq!(report.unsuccessful(), vec![&tool("alpha"), &tool("beta")]);
    assert!(!api.calls().iter().any(|call| call.contains("beta")));
}

#[tokio::test]
async fn test_batch_records_rejections() {
    let api = FakeApi::new()
        .script("alpha", Reply::Http(409), vec![])
        .script("beta", Reply::Accepted("b1"), vec![Reply::Status("successful")]);
    let tokens = FakeTokens::with(&["alpha", "beta"]);
    let clock = ManualClock::new();

    let report = deploy_tools(vec![tool("alpha"), tool("beta")], &tokens, &api, &clock, &options())
        .await
        .unwrap();

    assert!(matches!(
        &report.results[0].1,
        ToolResult::Completed(DeploymentOutcome::Rejected { .. })
    ));
    assert!(report.results[1].1.is_success());
}

#[tokio::test]
async fn test_single_tool_propagates_errors() {
    let api = FakeApi::new().script("beta", Reply::Http(503), vec![]);
    let tokens = FakeTokens::with(&["alpha", "beta"]);
    let clock = ManualClock::new();
    let options = DeployOptions {
        target_tool: Some(tool("beta")),
        ..options()
    };

    let result = deploy_tools(vec![tool("alpha"), tool("beta")], &tokens, &api, &clock, &options).await;

    let err = result.unwrap_err();
    assert_eq!(err.to_string(), "503 Server Error: Service Unavailable");
    assert_eq!(api.calls(), vec!["start:beta"]);
}

#[tokio::test]
async fn test_single_tool_missing_token() {
    let api = FakeApi::new();
    let tokens = FakeTokens::with(&[]);
    let clock = ManualClock::new();
    let options = DeployOptions {
        target_tool: Some(tool("alpha")),
        ..options()
    };

    let result = deploy_tools(vec![tool("alpha")], &tokens, &api, &clock, &options).await;

    assert!(matches!(result, Err(DeployerError::TokenError(_))));
    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn test_single_tool_rejection_fails_the_run() {
    let api = FakeApi::new().script("alpha", Reply::Http(409), vec![]);
    let tokens = FakeTokens::with(&["alpha"]);
    let clock = ManualClock::new();
    let options = DeployOptions {
        target_tool: Some(tool("alpha")),
        ..options()
    };

    let report = deploy_tools(vec![tool("alpha")], &tokens, &api, &clock, &options)
        .await
        .unwrap();

    assert!(matches!(
        &report.results[0].1,
        ToolResult::Completed(DeploymentOutcome::Rejected { deploy_id: None, .. })
    ));
    assert!(report.should_fail(options.is_single_tool()));
}

#[tokio::test]
async fn test_single_tool_failed_status_fails_the_run() {
    let api = FakeApi::new().script(
        "alpha",
        Reply::Accepted("a1"),
        vec![Reply::Status("running"), Reply::Status("failed")],
    );
    let tokens = FakeTokens::with(&["alpha"]);
    let clock = ManualClock::new();
    let options = DeployOptions {
        target_tool: Some(tool("alpha")),
        ..options()
    };

    let report = deploy_tools(vec![tool("alpha")], &tokens, &api, &clock, &options)
        .await
        .unwrap();

    match &report.results[0].1 {
        ToolResult::Completed(outcome @ DeploymentOutcome::Failed { .. }) => {
            assert_eq!(outcome.polls(), 2);
        }
        other => panic!("expected a failed outcome, got {:?}", other),
    }
    assert!(report.should_fail(options.is_single_tool()));
}

#[tokio::test]
async fn test_single_tool_success_passes_the_run() {
    let api = FakeApi::new().script("alpha", Reply::Accepted("a1"), vec![Reply::Status("successful")]);
    let tokens = FakeTokens::with(&["alpha"]);
    let clock = ManualClock::new();
    let options = DeployOptions {
        target_tool: Some(tool("alpha")),
        ..options()
    };

    let report = deploy_tools(vec![tool("alpha")], &tokens, &api, &clock, &options)
        .await
        .unwrap();

    assert!(report.all_succeeded());
    assert!(!report.should_fail(options.is_single_tool()));
}

#[tokio::test]
async fn test_batch_with_failing_tool_passes_the_run() {
    let api = FakeApi::new()
        .script("alpha", Reply::Accepted("a1"), vec![Reply::Status("failed")])
        .script("beta", Reply::Accepted("b1"), vec![Reply::Status("successful")]);
    let tokens = FakeTokens::with(&["alpha", "beta"]);
    let clock = ManualClock::new();
    let options = options();

    let report = deploy_tools(vec![tool("alpha"), tool("beta")], &tokens, &api, &clock, &options)
        .await
        .unwrap();

    assert!(!report.all_succeeded());
    assert!(!report.should_fail(options.is_single_tool()));
}

#[test]
fn test_select_tools() {
    let tools = vec![tool("alpha"), tool("beta")];

    assert_eq!(select_tools(tools.clone(), None).unwrap(), tools);
    assert_eq!(
        select_tools(tools.clone(), Some(&tool("beta"))).unwrap(),
        vec![tool("beta")]
    );
    assert!(matches!(
        select_tools(tools, Some(&tool("delta"))),
        Err(DeployerError::NotFound(_))
    ));
}
