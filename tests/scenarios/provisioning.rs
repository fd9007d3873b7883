//! Idempotent resource provisioning behavior

use crate::helpers::{fail, ok, test_config, MockRunner};
use chartup::tasks::{ApplyManagerRbac, EnsureResource, ManagedResource};
use chartup::{DeployContext, InstallError, StepOutcome, Task};
use std::sync::Arc;

#[tokio::test]
async fn test_existing_resource_is_not_recreated() {
    let runner = Arc::new(MockRunner::scripted(vec![ok("NAME AGE\ntiller 2d")]));
    let config = test_config("/t".as_ref(), "/c".as_ref());
    let mut ctx = DeployContext::new();

    let outcome = EnsureResource::new(ManagedResource::ManagerServiceAccount, runner.clone())
        .run(&config, &mut ctx)
        .await
        .unwrap();

    assert_eq!(outcome, StepOutcome::AlreadyExists);
    assert_eq!(
        runner.calls(),
        vec!["kubectl get serviceaccount tiller -n kube-system"]
    );
}

#[tokio::test]
async fn test_absent_resource_is_created() {
    let runner = Arc::new(MockRunner::scripted(vec![
        fail(1, "NotFound"),
        ok("clusterrolebinding created"),
    ]));
    let config = test_config("/t".as_ref(), "/c".as_ref());
    let mut ctx = DeployContext::new();

    let outcome = EnsureResource::new(ManagedResource::ClusterAdminBinding, runner.clone())
        .run(&config, &mut ctx)
        .await
        .unwrap();

    assert_eq!(outcome, StepOutcome::Done);
    assert_eq!(
        runner.calls(),
        vec![
            "kubectl get clusterrolebinding add-cluster-admin",
            "kubectl create clusterrolebinding add-cluster-admin \
             --clusterrole=cluster-admin --serviceaccount=kube-system:default",
        ]
    );
}

#[tokio::test]
async fn test_absent_manager_service_triggers_init() {
    let runner = Arc::new(MockRunner::scripted(vec![fail(1, "NotFound"), ok("")]));
    let config = test_config("/t".as_ref(), "/c".as_ref());
    let mut ctx = DeployContext::new();

    EnsureResource::new(ManagedResource::ManagerService, runner.clone())
        .run(&config, &mut ctx)
        .await
        .unwrap();

    assert!(runner.has_call_containing("helm init --service-account tiller --wait"));
}

#[tokio::test]
async fn test_creation_failure_propagates() {
    let runner = Arc::new(MockRunner::scripted(vec![
        fail(1, "NotFound"),
        fail(1, "forbidden"),
    ]));
    let config = test_config("/t".as_ref(), "/c".as_ref());
    let mut ctx = DeployContext::new();

    let err = EnsureResource::new(ManagedResource::ManagerServiceAccount, runner)
        .run(&config, &mut ctx)
        .await
        .unwrap_err();

    match err {
        InstallError::CommandFailed { stderr, .. } => assert_eq!(stderr, "forbidden"),
        other => panic!("expected CommandFailed, got {:?}", other),
    }
}

#[tokio::test]
async fn test_rbac_manifest_applied_from_templates_dir() {
    let runner = Arc::new(MockRunner::new());
    let config = test_config("/t".as_ref(), "/c".as_ref());
    let mut ctx = DeployContext::new();

    ApplyManagerRbac::new(runner.clone())
        .run(&config, &mut ctx)
        .await
        .unwrap();

    assert_eq!(
        runner.calls(),
        vec!["kubectl apply -f /t/helm/manager-rbac.yaml"]
    );
}

#[tokio::test]
async fn test_rbac_apply_failure_propagates() {
    let runner = Arc::new(MockRunner::scripted(vec![fail(1, "no such file")]));
    let config = test_config("/t".as_ref(), "/c".as_ref());
    let mut ctx = DeployContext::new();

    let err = ApplyManagerRbac::new(runner)
        .run(&config, &mut ctx)
        .await
        .unwrap_err();
    assert!(matches!(err, InstallError::CommandFailed { .. }));
}
