use ledger_core::domain::{DistributionReport, Recipient, RecipientStatus};
use ledger_core::foundation::{AccountId, TransactionRef};

fn recipients(n: u64) -> Vec<Recipient> {
    (1..=n).map(|num| Recipient::new(AccountId::from_num(1000 + num), num * 10)).collect()
}

#[test]
fn report_when_all_slots_filled_then_counts_match_statuses() {
    let recipients = recipients(3);
    let slots = vec![
        Some(RecipientStatus::Succeeded { transaction_ref: TransactionRef::new("tx-1") }),
        Some(RecipientStatus::Failed { reason: "INVALID_ACCOUNT_ID".to_string() }),
        Some(RecipientStatus::Succeeded { transaction_ref: TransactionRef::new("tx-3") }),
    ];
    let report = DistributionReport::from_slots(&recipients, slots);
    assert_eq!((report.total, report.success_count, report.fail_count, report.skipped_count), (3, 2, 1, 0));
    let failures: Vec<_> = report.failures().map(|outcome| outcome.index).collect();
    assert_eq!(failures, vec![1]);
    assert_eq!(report.per_recipient_results[2].amount, 30);
}

#[test]
fn report_when_no_slot_filled_then_every_recipient_is_skipped() {
    let report = DistributionReport::from_slots(&recipients(4), Vec::new());
    assert_eq!(report.total, 4);
    assert_eq!(report.success_count, 0);
    assert_eq!(report.fail_count, 4);
    assert_eq!(report.skipped_count, 4);
    assert!(!report.is_partial_failure());
}

#[test]
fn report_serializes_status_with_tag() {
    let report = DistributionReport::from_slots(
        &recipients(1),
        vec![Some(RecipientStatus::Failed { reason: "boom".to_string() })],
    );
    let json = serde_json::to_value(&report).expect("json");
    assert_eq!(json["per_recipient_results"][0]["status"]["status"], "failed");
    assert_eq!(json["per_recipient_results"][0]["account_id"], "0.0.1001");
}
