use crate::fixtures::Harness;
use ledger_core::application::DistributionCoordinator;
use ledger_core::domain::{CreateTokenRequest, DistributionJob, Recipient, RecipientStatus};
use ledger_core::foundation::AccountId;
use ledger_core::infrastructure::ledger::{LedgerQuery, TransactionKind};
use std::time::Duration;

const MISSING_ACCOUNT: AccountId = AccountId::from_num(987_654);

#[tokio::test]
async fn distribute_batch_when_third_recipient_has_no_account_then_reports_four_successes_and_one_failure() {
    let harness = Harness::new();
    let mut recipients = Vec::new();
    for seed in 51..=55u8 {
        if seed == 53 {
            recipients.push(Recipient::new(MISSING_ACCOUNT, 25));
        } else {
            let (account, _) = harness.open_account(seed, 0);
            recipients.push(Recipient::new(account, 25));
        }
    }

    let report = harness.orchestrator.distribute_batch(&DistributionJob::native(recipients.clone())).await;
    assert_eq!(report.success_count, 4);
    assert_eq!(report.fail_count, 1);
    assert_eq!(report.total, 5);
    assert_eq!(report.per_recipient_results.len(), 5);
    assert_eq!(report.success_count + report.fail_count, recipients.len());

    let third = &report.per_recipient_results[2];
    assert_eq!(third.account_id, MISSING_ACCOUNT);
    assert!(matches!(&third.status, RecipientStatus::Failed { reason } if reason.contains("INVALID_ACCOUNT_ID")));
    for (index, outcome) in report.per_recipient_results.iter().enumerate() {
        assert_eq!(outcome.index, index);
        assert_eq!(outcome.account_id, recipients[index].account_id);
    }
    let paid = harness.ledger.account_balance(&recipients[4].account_id).await.expect("balance");
    assert_eq!(paid.native_balance, 25);
}

#[tokio::test]
async fn distribute_batch_when_token_recipients_partially_associated_then_isolates_failures() {
    let harness = Harness::builder().max_concurrency(2).build();
    let fungible = harness.orchestrator.fungible();
    let token = fungible.create_token(&CreateTokenRequest::infinite("Reward", "RWD", 1_000_000, 2)).await.expect("token");

    let mut recipients = Vec::new();
    for seed in 61..=64u8 {
        let (account, key) = harness.open_account(seed, ledger_core::foundation::NATIVE_UNITS_PER_COIN);
        if seed != 62 {
            fungible.associate_with_key(account, &key, &token.token_id).await.expect("associate");
        }
        recipients.push(Recipient::new(account, 1_000));
    }

    let report = harness.orchestrator.distribute_batch(&DistributionJob::token(token.token_id, recipients.clone())).await;
    assert_eq!((report.success_count, report.fail_count, report.skipped_count), (3, 1, 0));
    assert!(report.is_partial_failure());
    let failed: Vec<_> = report.failures().map(|outcome| outcome.account_id).collect();
    assert_eq!(failed, vec![recipients[1].account_id]);

    let treasury = harness.orchestrator.queries().get_token_balance(&token.treasury_account_id, &token.token_id).await.expect("treasury");
    assert_eq!(treasury, Some(1_000_000 - 3_000));
}

#[tokio::test]
async fn distribute_when_deadline_passes_then_stops_launching_and_keeps_partial_results() {
    let harness = Harness::builder().latency(Duration::from_millis(100)).build();
    let recipients: Vec<_> = (71..=76u8).map(|seed| Recipient::new(harness.open_account(seed, 0).0, 10)).collect();
    let job = DistributionJob::native(recipients);

    let coordinator = DistributionCoordinator::new(1, Some(Duration::from_millis(250)));
    let report = coordinator.distribute(&job, harness.orchestrator.fungible()).await;

    assert_eq!(report.total, 6);
    assert!(report.success_count >= 1, "at least the first recipient is paid");
    assert!(report.skipped_count >= 1, "late recipients are skipped");
    assert_eq!(report.success_count + report.fail_count, report.total);
    assert_eq!(harness.ledger.submission_count_of(TransactionKind::CryptoTransfer), report.total - report.skipped_count);
    let last = report.per_recipient_results.last().expect("last");
    assert_eq!(last.status, RecipientStatus::Skipped);
}
