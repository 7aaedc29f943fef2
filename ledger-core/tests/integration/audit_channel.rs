use crate::fixtures::{metadata, CredentialEncoding, Harness, PLATFORM_ACCOUNT, TEST_CALLER, TEST_EVENT_TYPE, TEST_SUBJECT_ID};
use ledger_core::application::{AuditChannel, OperatorResolver};
use ledger_core::domain::ChannelMessageFilter;
use ledger_core::foundation::{CallerId, ChannelId, LedgerError, ProtocolStep, ReceiptStatus, FALLBACK_USED_KEY, NATIVE_UNITS_PER_COIN};
use ledger_core::infrastructure::keys::KeyMaterialResolver;
use ledger_core::infrastructure::ledger::{InjectedFault, TransactionKind};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn ensure_channel_when_called_concurrently_then_creates_exactly_one_channel() {
    let harness = Harness::builder().latency(Duration::from_millis(20)).build();
    let mut handles = Vec::new();
    for _ in 0..16 {
        let orchestrator = Arc::clone(&harness.orchestrator);
        handles.push(tokio::spawn(async move { orchestrator.audit().ensure_channel(None).await }));
    }
    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await.expect("join").expect("channel"));
    }

    assert_eq!(harness.ledger.submission_count_of(TransactionKind::TopicCreate), 1);
    assert!(ids.iter().all(|id| *id == ids[0]));
    assert_eq!(harness.orchestrator.audit().channel_id(), Some(ids[0]));
}

#[tokio::test]
async fn ensure_channel_when_preconfigured_then_loads_without_creating() {
    let harness = Harness::new();
    let existing = harness.orchestrator.audit().ensure_channel(None).await.expect("create");

    let second = AuditChannel::new(
        Arc::new(harness.ledger.clone()),
        Arc::new(harness.ledger.clone()),
        Arc::new(OperatorResolver::new(
            harness.orchestrator.operators().platform(),
            Arc::new(harness.directory.clone()),
            KeyMaterialResolver::new(),
        )),
        Some(existing),
        "unused",
    );
    assert_eq!(second.ensure_channel(None).await.expect("load"), existing);
    assert_eq!(harness.ledger.submission_count_of(TransactionKind::TopicCreate), 1);
}

#[tokio::test]
async fn ensure_channel_when_preconfigured_channel_missing_then_fails_and_retries_later() {
    let harness = Harness::new();
    let audit = harness.orchestrator.audit();
    let err = audit.ensure_channel(Some(ChannelId::from_num(999_999))).await.expect_err("missing channel");
    assert_eq!(err.failed_step(), Some(ProtocolStep::ChannelResolution));
    assert!(matches!(err.root_cause(), LedgerError::ChannelNotFound(_)));
    assert_eq!(audit.channel_id(), None);

    let created = audit.ensure_channel(None).await.expect("second attempt creates");
    assert_eq!(audit.channel_id(), Some(created));
}

#[tokio::test]
async fn append_when_delegated_account_has_zero_balance_then_falls_back_to_platform_once() {
    let harness = Harness::new();
    let (delegated, _) = harness.register_caller(TEST_CALLER, 31, 0, CredentialEncoding::DerHex);

    let receipt = harness
        .orchestrator
        .append(&CallerId::new(TEST_CALLER), TEST_EVENT_TYPE, TEST_SUBJECT_ID, metadata(&[("claimId", "c-1")]))
        .await
        .expect("append");
    assert!(receipt.fallback_used);
    assert_eq!(receipt.status, ReceiptStatus::Success);

    let attempts: Vec<_> =
        harness.ledger.submissions().into_iter().filter(|record| record.kind == TransactionKind::TopicMessageSubmit).collect();
    assert_eq!(attempts.len(), 2);
    assert_eq!(attempts[0].payer, delegated);
    assert_eq!(attempts[0].status, Some(ReceiptStatus::InsufficientPayerBalance));
    assert_eq!(attempts[1].payer, PLATFORM_ACCOUNT);
    assert_eq!(attempts[1].status, Some(ReceiptStatus::Success));

    let records = harness
        .orchestrator
        .queries()
        .get_channel_messages(&receipt.channel_id, &ChannelMessageFilter::default())
        .await
        .expect("messages");
    assert_eq!(records.len(), 1);
    let stored = &records[0].message;
    assert_eq!(stored.metadata[FALLBACK_USED_KEY], Value::Bool(true));
    assert_eq!(stored.metadata["claimId"], "c-1");
    assert_eq!(stored.operator_info.account_id, PLATFORM_ACCOUNT);
    assert!(!stored.operator_info.is_delegated);
    assert_eq!(Some(records[0].sequence_number), receipt.sequence_number);
}

#[tokio::test]
async fn append_when_delegated_account_funded_then_attributes_to_caller() {
    let harness = Harness::new();
    let (delegated, _) = harness.register_caller(TEST_CALLER, 32, NATIVE_UNITS_PER_COIN, CredentialEncoding::RawHex);

    let receipt = harness
        .orchestrator
        .append(&CallerId::new(TEST_CALLER), TEST_EVENT_TYPE, TEST_SUBJECT_ID, Map::new())
        .await
        .expect("append");
    assert!(!receipt.fallback_used);
    assert_eq!(harness.ledger.submission_count_of(TransactionKind::TopicMessageSubmit), 1);

    let records = harness
        .orchestrator
        .queries()
        .get_channel_messages(&receipt.channel_id, &ChannelMessageFilter::default())
        .await
        .expect("messages");
    assert_eq!(records[0].message.operator_info.account_id, delegated);
    assert!(records[0].message.operator_info.is_delegated);
    assert!(!records[0].message.fallback_used());
}

#[tokio::test]
async fn append_when_platform_submission_fails_then_error_propagates_without_retry() {
    let harness = Harness::new();
    harness.orchestrator.audit().ensure_channel(None).await.expect("channel");
    harness
        .ledger
        .fail_next(TransactionKind::TopicMessageSubmit, InjectedFault::Network("consensus node unavailable".to_string()));

    let err = harness
        .orchestrator
        .append(&CallerId::new("no-delegated-account"), TEST_EVENT_TYPE, TEST_SUBJECT_ID, Map::new())
        .await
        .expect_err("platform failure surfaces");
    assert_eq!(err.failed_step(), Some(ProtocolStep::Submission));
    assert!(err.is_transient());
    assert_eq!(harness.ledger.submission_count_of(TransactionKind::TopicMessageSubmit), 1);
}

#[tokio::test]
async fn append_when_both_operators_fail_then_surfaces_platform_error() {
    let harness = Harness::new();
    harness.register_caller(TEST_CALLER, 33, 0, CredentialEncoding::DerHex);
    harness.orchestrator.audit().ensure_channel(None).await.expect("channel");
    harness.ledger.fail_payer(PLATFORM_ACCOUNT, ReceiptStatus::InsufficientPayerBalance);

    let err = harness
        .orchestrator
        .append(&CallerId::new(TEST_CALLER), TEST_EVENT_TYPE, TEST_SUBJECT_ID, Map::new())
        .await
        .expect_err("no further fallback");
    assert_eq!(err.receipt_status(), Some(&ReceiptStatus::InsufficientPayerBalance));
    assert_eq!(harness.ledger.submission_count_of(TransactionKind::TopicMessageSubmit), 2);

    harness.ledger.clear_faults();
    let receipt = harness
        .orchestrator
        .append(&CallerId::new(TEST_CALLER), TEST_EVENT_TYPE, TEST_SUBJECT_ID, Map::new())
        .await
        .expect("platform recovers");
    assert!(receipt.fallback_used);
}

#[tokio::test]
async fn channel_messages_filter_by_event_subject_and_limit() {
    let harness = Harness::new();
    let caller = CallerId::new("platform-only");
    for (event_type, subject) in [("minted", "cert-1"), ("transferred", "cert-1"), ("minted", "cert-2"), ("minted", "cert-3")] {
        harness.orchestrator.append(&caller, event_type, subject, Map::new()).await.expect("append");
    }
    let channel = harness.orchestrator.audit().channel_id().expect("channel");
    let queries = harness.orchestrator.queries();

    let minted = queries.get_channel_messages(&channel, &ChannelMessageFilter::default().event_type("minted")).await.expect("minted");
    assert_eq!(minted.len(), 3);
    assert!(minted.windows(2).all(|pair| pair[0].sequence_number < pair[1].sequence_number));

    let cert_one = queries.get_channel_messages(&channel, &ChannelMessageFilter::default().subject_id("cert-1")).await.expect("subject");
    assert_eq!(cert_one.len(), 2);

    let tail = queries
        .get_channel_messages(&channel, &ChannelMessageFilter::default().event_type("minted").since_sequence(2).limit(1))
        .await
        .expect("since");
    assert_eq!(tail.len(), 1);
    assert_eq!(tail[0].message.subject_id, "cert-2");
}
