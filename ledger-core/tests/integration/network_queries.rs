use crate::fixtures::{Harness, PLATFORM_ACCOUNT, PLATFORM_BALANCE};
use ledger_core::domain::CreateTokenRequest;
use ledger_core::foundation::{AccountId, ChannelId, LedgerError, MIN_OPERATIONAL_BALANCE};

#[tokio::test]
async fn get_balance_when_at_or_below_minimum_then_flags_sufficiency() {
    let harness = Harness::new();
    let queries = harness.orchestrator.queries();
    let (at_minimum, _) = harness.open_account(91, MIN_OPERATIONAL_BALANCE);
    let (below, _) = harness.open_account(92, MIN_OPERATIONAL_BALANCE - 1);

    let platform = queries.get_balance(&PLATFORM_ACCOUNT).await.expect("platform");
    assert_eq!(platform.native_balance, PLATFORM_BALANCE);
    assert!(platform.has_sufficient_balance);
    assert!(queries.get_balance(&at_minimum).await.expect("at minimum").has_sufficient_balance);
    let report = queries.get_balance(&below).await.expect("below");
    assert_eq!(report.account_id, below);
    assert!(!report.has_sufficient_balance);
}

#[tokio::test]
async fn get_token_balance_when_not_associated_then_none() {
    let harness = Harness::new();
    let fungible = harness.orchestrator.fungible();
    let token = fungible.create_token(&CreateTokenRequest::infinite("Reward", "RWD", 100, 0)).await.expect("token");
    let (account, key) = harness.open_account(93, MIN_OPERATIONAL_BALANCE);
    let queries = harness.orchestrator.queries();

    assert_eq!(queries.get_token_balance(&account, &token.token_id).await.expect("before"), None);
    fungible.associate_with_key(account, &key, &token.token_id).await.expect("associate");
    assert_eq!(queries.get_token_balance(&account, &token.token_id).await.expect("after"), Some(0));

    let info = queries.get_token_info(&token.token_id).await.expect("info");
    assert_eq!(info.total_supply, 100);
    assert_eq!(info.treasury_account_id, PLATFORM_ACCOUNT);
}

#[tokio::test]
async fn queries_when_entity_missing_then_not_found() {
    let harness = Harness::new();
    let queries = harness.orchestrator.queries();
    let err = queries.get_balance(&AccountId::from_num(424_242)).await.expect_err("missing account");
    assert!(matches!(err, LedgerError::AccountNotFound(_)));
    assert!(!err.is_transient());
    assert!(!queries.channel_exists(&ChannelId::from_num(424_243)).await.expect("channel lookup"));
}
