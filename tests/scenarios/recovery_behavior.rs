//! Failure recovery around the upgrade-or-install step

use crate::helpers::{fail, ok, timed_out, test_config, MockRunner};
use chartup::tasks::DeployChart;
use chartup::{DeployContext, InstallError, StepOutcome, Task};
use std::sync::Arc;

fn history(json: &str) -> chartup::CommandResult {
    ok(json)
}

#[tokio::test]
async fn test_successful_upgrade_runs_once_without_history_query() {
    let runner = Arc::new(MockRunner::scripted(vec![ok("")]));
    let config = test_config("/t".as_ref(), "/c".as_ref());
    let mut ctx = DeployContext::new();

    let outcome = DeployChart::new(runner.clone())
        .run(&config, &mut ctx)
        .await
        .unwrap();

    assert_eq!(outcome, StepOutcome::Done);
    assert_eq!(runner.count_calls_starting_with("helm upgrade --install"), 1);
    assert!(!runner.has_call_containing("helm history"));
}

#[tokio::test]
async fn test_failed_first_install_purges_and_retries() {
    let runner = Arc::new(MockRunner::scripted(vec![
        fail(1, "release workbench failed"),
        history(r#"[{"revision": 1, "status": "FAILED"}]"#),
        ok(""), // purge
        ok(""), // retry
    ]));
    let config = test_config("/t".as_ref(), "/c".as_ref());
    let mut ctx = DeployContext::new();

    DeployChart::new(runner.clone())
        .run(&config, &mut ctx)
        .await
        .unwrap();

    assert!(runner.has_call_containing("helm delete workbench --purge"));
    assert!(!runner.has_call_containing("helm rollback"));
    assert_eq!(runner.count_calls_starting_with("helm upgrade --install"), 2);
}

#[tokio::test]
async fn test_string_encoded_first_revision_also_purges() {
    let runner = Arc::new(MockRunner::scripted(vec![
        fail(1, "boom"),
        history(r#"[{"revision": "1"}]"#),
        ok(""),
        ok(""),
    ]));
    let config = test_config("/t".as_ref(), "/c".as_ref());
    let mut ctx = DeployContext::new();

    DeployChart::new(runner.clone())
        .run(&config, &mut ctx)
        .await
        .unwrap();

    assert!(runner.has_call_containing("helm delete workbench --purge"));
}

#[tokio::test]
async fn test_failed_upgrade_rolls_back_to_latest_revision() {
    let runner = Arc::new(MockRunner::scripted(vec![
        fail(1, "upgrade failed"),
        history(r#"[{"revision": 3}, {"revision": 2}, {"revision": 1}]"#),
        ok(""), // rollback
        ok(""), // retry
    ]));
    let config = test_config("/t".as_ref(), "/c".as_ref());
    let mut ctx = DeployContext::new();

    DeployChart::new(runner.clone())
        .run(&config, &mut ctx)
        .await
        .unwrap();

    assert!(runner.has_call_containing("helm rollback workbench 3"));
    assert!(!runner.has_call_containing("--purge"));
    assert_eq!(runner.count_calls_starting_with("helm upgrade --install"), 2);
}

#[tokio::test]
async fn test_retry_failure_is_fatal() {
    let runner = Arc::new(MockRunner::scripted(vec![
        fail(1, "first failure"),
        history(r#"[{"revision": 2}]"#),
        ok(""), // rollback
        fail(1, "second failure"),
    ]));
    let config = test_config("/t".as_ref(), "/c".as_ref());
    let mut ctx = DeployContext::new();

    let err = DeployChart::new(runner.clone())
        .run(&config, &mut ctx)
        .await
        .unwrap_err();

    assert!(matches!(err, InstallError::UnrecoverableAfterRetry { .. }));
    // Exactly one retry: no third attempt after the second failure.
    assert_eq!(runner.count_calls_starting_with("helm upgrade --install"), 2);
}

#[tokio::test]
async fn test_history_query_failure_surfaces_original_stderr() {
    let runner = Arc::new(MockRunner::scripted(vec![
        fail(1, "original upgrade error"),
        fail(1, "release not found"),
    ]));
    let config = test_config("/t".as_ref(), "/c".as_ref());
    let mut ctx = DeployContext::new();

    let err = DeployChart::new(runner.clone())
        .run(&config, &mut ctx)
        .await
        .unwrap_err();

    match err {
        InstallError::HistoryQueryFailed { stderr, .. } => {
            assert_eq!(stderr, "original upgrade error");
        }
        other => panic!("expected HistoryQueryFailed, got {:?}", other),
    }
    // No retry after failed recovery.
    assert_eq!(runner.count_calls_starting_with("helm upgrade --install"), 1);
}

#[tokio::test]
async fn test_unparseable_history_is_fatal() {
    let runner = Arc::new(MockRunner::scripted(vec![
        fail(1, "boom"),
        ok("this is not json"),
    ]));
    let config = test_config("/t".as_ref(), "/c".as_ref());
    let mut ctx = DeployContext::new();

    let err = DeployChart::new(runner.clone())
        .run(&config, &mut ctx)
        .await
        .unwrap_err();
    assert!(matches!(err, InstallError::HistoryParseFailed { .. }));
}

#[tokio::test]
async fn test_empty_history_is_fatal() {
    let runner = Arc::new(MockRunner::scripted(vec![fail(1, "boom"), ok("[]")]));
    let config = test_config("/t".as_ref(), "/c".as_ref());
    let mut ctx = DeployContext::new();

    let err = DeployChart::new(runner.clone())
        .run(&config, &mut ctx)
        .await
        .unwrap_err();

    assert!(matches!(err, InstallError::NoHistory { .. }));
    assert!(!runner.has_call_containing("--purge"));
    assert!(!runner.has_call_containing("helm rollback"));
}

#[tokio::test]
async fn test_purge_failure_is_suppressed_and_retry_proceeds() {
    let runner = Arc::new(MockRunner::scripted(vec![
        fail(1, "boom"),
        history(r#"[{"revision": 1}]"#),
        fail(1, "purge refused"),
        ok(""), // retry still happens and succeeds
    ]));
    let config = test_config("/t".as_ref(), "/c".as_ref());
    let mut ctx = DeployContext::new();

    DeployChart::new(runner.clone())
        .run(&config, &mut ctx)
        .await
        .unwrap();

    assert_eq!(runner.count_calls_starting_with("helm upgrade --install"), 2);
}

#[tokio::test]
async fn test_rollback_failure_aborts_before_retry() {
    let runner = Arc::new(MockRunner::scripted(vec![
        fail(1, "boom"),
        history(r#"[{"revision": 4}]"#),
        fail(1, "rollback refused"),
    ]));
    let config = test_config("/t".as_ref(), "/c".as_ref());
    let mut ctx = DeployContext::new();

    let err = DeployChart::new(runner.clone())
        .run(&config, &mut ctx)
        .await
        .unwrap_err();

    assert!(matches!(err, InstallError::CommandFailed { .. }));
    assert_eq!(runner.count_calls_starting_with("helm upgrade --install"), 1);
}

#[tokio::test]
async fn test_timed_out_attempt_triggers_recovery() {
    let runner = Arc::new(MockRunner::scripted(vec![
        timed_out(),
        history(r#"[{"revision": 2}]"#),
        ok(""), // rollback
        ok(""), // retry
    ]));
    let config = test_config("/t".as_ref(), "/c".as_ref());
    let mut ctx = DeployContext::new();

    DeployChart::new(runner.clone())
        .run(&config, &mut ctx)
        .await
        .unwrap();

    assert!(runner.has_call_containing("helm rollback workbench 2"));
    assert_eq!(runner.count_calls_starting_with("helm upgrade --install"), 2);
}

#[tokio::test]
async fn test_retry_reuses_the_identical_command() {
    let runner = Arc::new(MockRunner::scripted(vec![
        fail(1, "boom"),
        history(r#"[{"revision": 2}]"#),
        ok(""),
        ok(""),
    ]));
    let config = test_config("/t".as_ref(), "/c".as_ref());
    let mut ctx = DeployContext::new();

    DeployChart::new(runner.clone())
        .run(&config, &mut ctx)
        .await
        .unwrap();

    let upgrades: Vec<String> = runner
        .calls()
        .into_iter()
        .filter(|call| call.starts_with("helm upgrade --install"))
        .collect();
    assert_eq!(upgrades.len(), 2);
    assert_eq!(upgrades[0], upgrades[1]);
}
