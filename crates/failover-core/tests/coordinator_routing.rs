//! End-to-end coordination: candidate selection feeding the attempt sequencer

mod common;

use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use tokio::sync::oneshot;

use common::{accounts_with, busy, congested, default_selector, directory_with, Behavior, MockProvider};
use rvoip_failover_core::{
    AccountId, ConnectionCoordinator, ConnectionOutcome, FailoverConfig, FailoverError, OutgoingCall,
    ProviderAccount, RunPhase,
};

#[tokio::test]
async fn test_pre_assigned_account_connects() {
    let sip = MockProvider::new("sip", Behavior::SucceedLater);
    let voip = ProviderAccount::new("work-line", "sip");
    let call = Arc::new(OutgoingCall::new("sip:bob@example.com").with_account(voip));

    let coordinator = ConnectionCoordinator::new(
        call.clone(),
        default_selector(accounts_with(&[])),
        directory_with(&[sip.clone()]),
    );

    let outcome = coordinator.connect().await.unwrap();
    assert!(outcome.is_success());
    assert_eq!(sip.attempted_accounts(), vec!["work-line"]);
    assert_eq!(coordinator.phase(), RunPhase::Succeeded);
}

#[tokio::test]
async fn test_call_without_account_fails_unspecified() {
    let telephony = MockProvider::new("telephony", Behavior::SucceedNow);
    let coordinator = ConnectionCoordinator::new(
        Arc::new(OutgoingCall::new("tel:+15551234567")),
        default_selector(accounts_with(&[ProviderAccount::new("sim1", "telephony")])),
        directory_with(&[telephony.clone()]),
    );

    match coordinator.connect().await.unwrap() {
        ConnectionOutcome::Failed(cause) => assert!(cause.is_unspecified()),
        other => panic!("Expected failure, got {:?}", other),
    }
    assert_eq!(telephony.create_count(), 0);
}

#[tokio::test]
async fn test_emergency_call_uses_only_enabled_telephony_accounts() {
    let telephony = MockProvider::new("telephony", Behavior::FailNow(busy()));
    let sip = MockProvider::new("sip", Behavior::SucceedNow);

    let voip = ProviderAccount::new("work-line", "sip");
    let accounts = accounts_with(&[
        ProviderAccount::new("sim1", "telephony"),
        voip.clone(),
        ProviderAccount::new("sim2", "telephony"),
        ProviderAccount::new("sim3", "telephony"),
    ]);
    accounts.set_enabled(&AccountId::new("sim2"), false);

    let call = Arc::new(OutgoingCall::new("tel:911").with_account(voip));
    let coordinator = ConnectionCoordinator::new(
        call.clone(),
        default_selector(accounts),
        directory_with(&[telephony.clone(), sip.clone()]),
    );

    let outcome = coordinator.connect().await.unwrap();

    assert_eq!(outcome, ConnectionOutcome::Failed(busy()));
    assert_eq!(telephony.attempted_accounts(), vec!["sim1", "sim3"]);
    assert_eq!(sip.create_count(), 0);
}

#[tokio::test]
async fn test_emergency_call_connects_on_first_working_telephony_account() {
    let primary = MockProvider::new("pstn-primary", Behavior::FailNow(congested()));
    let secondary = MockProvider::new("pstn-secondary", Behavior::SucceedNow);
    let config = FailoverConfig::from_toml_str(
        r#"
        telephony_providers = ["pstn-primary", "pstn-secondary"]
        emergency_numbers = ["112"]
        "#,
    )
    .unwrap();

    let accounts = accounts_with(&[
        ProviderAccount::new("sim1", "pstn-primary"),
        ProviderAccount::new("sim2", "pstn-secondary"),
    ]);
    let selector = Arc::new(config.selector(accounts));
    let registry = directory_with(&[primary.clone(), secondary.clone()]);
    let call = Arc::new(OutgoingCall::new("sip:112@ims.example.com"));

    let coordinator =
        ConnectionCoordinator::with_sequencer(call.clone(), selector, config.sequencer(registry));

    let outcome = coordinator.connect().await.unwrap();
    assert!(outcome.is_success());
    assert_eq!(call.phone_account().unwrap().id.0, "sim2");
    assert_eq!(primary.create_count(), 1);
    assert_eq!(secondary.create_count(), 1);
}

#[tokio::test]
async fn test_abort_before_process_reports_cancelled() {
    let telephony = MockProvider::new("telephony", Behavior::SucceedNow);
    let call = Arc::new(OutgoingCall::new("tel:100").with_account(ProviderAccount::new("sim1", "telephony")));
    let coordinator = ConnectionCoordinator::new(
        call,
        default_selector(accounts_with(&[])),
        directory_with(&[telephony.clone()]),
    );

    coordinator.abort();
    let outcome = coordinator.connect().await.unwrap();

    assert_eq!(outcome, ConnectionOutcome::Cancelled);
    assert_eq!(telephony.create_count(), 0);
}

#[tokio::test]
async fn test_abort_while_connecting() {
    let telephony = MockProvider::new("telephony", Behavior::Hold);
    let call = Arc::new(OutgoingCall::new("tel:100").with_account(ProviderAccount::new("sim1", "telephony")));
    let coordinator = ConnectionCoordinator::new(
        call.clone(),
        default_selector(accounts_with(&[])),
        directory_with(&[telephony.clone()]),
    );

    let waiter = coordinator.clone();
    let pending = tokio::spawn(async move { waiter.connect().await });

    // wait until the provider holds the attempt
    tokio::time::timeout(Duration::from_secs(5), async {
        while telephony.create_count() == 0 {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("attempt issued");

    coordinator.abort();
    let outcome = pending.await.unwrap().unwrap();
    assert_eq!(outcome, ConnectionOutcome::Cancelled);
    assert_eq!(telephony.abort_count(), 1);
    assert!(call.connection_provider().is_none());

    let late = telephony.take_held().unwrap();
    late.succeeded(telephony.request_for(&call));
    assert_eq!(telephony.abort_count(), 2);
}

#[tokio::test]
async fn test_process_twice_is_rejected() {
    let coordinator = ConnectionCoordinator::new(
        Arc::new(OutgoingCall::new("tel:100")),
        default_selector(accounts_with(&[])),
        directory_with(&[]),
    );

    let (tx, rx) = oneshot::channel();
    coordinator.process(tx).unwrap();
    assert!(rx.await.unwrap().is_failed());

    let err = coordinator.connect().await.unwrap_err();
    assert!(matches!(err, FailoverError::InvalidState { .. }));
}
