use crate::fixtures::{ecdsa_key, Harness, PLATFORM_ACCOUNT};
use ledger_core::domain::{AssociationStatus, CreateTokenRequest, SupplyPolicy, TokenKind};
use ledger_core::foundation::{LedgerError, ProtocolStep, ReceiptStatus, NATIVE_UNITS_PER_COIN};
use ledger_core::infrastructure::keys::SecretBytes;
use ledger_core::infrastructure::ledger::{InjectedFault, TransactionKind};

#[tokio::test]
async fn create_token_when_infinite_then_initial_supply_lands_in_treasury() {
    let harness = Harness::new();
    let token = harness
        .orchestrator
        .create_fungible_token(&CreateTokenRequest::infinite("Reward", "RWD", 500_000, 2))
        .await
        .expect("token");
    assert_eq!(token.kind, TokenKind::Fungible);
    assert_eq!(token.treasury_account_id, PLATFORM_ACCOUNT);
    assert_eq!(token.decimals, 2);
    let treasury = harness.orchestrator.queries().get_token_balance(&PLATFORM_ACCOUNT, &token.token_id).await.expect("balance");
    assert_eq!(treasury, Some(500_000));
}

#[tokio::test]
async fn create_token_when_initial_supply_exceeds_cap_then_rejected_locally() {
    let harness = Harness::new();
    let err = harness
        .orchestrator
        .create_fungible_token(&CreateTokenRequest::finite("Capped", "CAP", 2_000, 0, 1_000))
        .await
        .expect_err("over cap");
    assert!(matches!(err, LedgerError::SupplyExceeded { requested: 2_000, max: 1_000 }));
    assert_eq!(harness.ledger.submission_count(), 0);
}

#[tokio::test]
async fn associate_when_called_twice_then_both_calls_succeed() {
    let harness = Harness::new();
    let fungible = harness.orchestrator.fungible();
    let token = fungible.create_token(&CreateTokenRequest::infinite("Reward", "RWD", 1_000, 0)).await.expect("token");
    let key = ecdsa_key(81);
    let account = harness.ledger.create_account(key.public_key(), NATIVE_UNITS_PER_COIN);
    let credential = SecretBytes::from(key.to_der_hex());

    let first = fungible.associate(account, &credential, &token.token_id).await.expect("first");
    let second = fungible.associate(account, &credential, &token.token_id).await.expect("second");
    assert_eq!(first, AssociationStatus::Associated);
    assert_eq!(second, AssociationStatus::AlreadyAssociated);
    assert!(first.newly_associated() && !second.newly_associated());
    assert_eq!(harness.ledger.submission_count_of(TransactionKind::TokenAssociate), 2);
}

#[tokio::test]
async fn associate_when_raw_hex_credential_and_ledger_reports_already_associated_then_normalizes() {
    let harness = Harness::new();
    let fungible = harness.orchestrator.fungible();
    let token = fungible.create_token(&CreateTokenRequest::infinite("Reward", "RWD", 1_000, 0)).await.expect("token");
    let key = ecdsa_key(82);
    let account = harness.ledger.create_account(key.public_key(), NATIVE_UNITS_PER_COIN);
    harness
        .ledger
        .fail_next(TransactionKind::TokenAssociate, InjectedFault::Status(ReceiptStatus::TokenAlreadyAssociatedToAccount));

    let raw = SecretBytes::from(format!("0x{}", key.to_raw_hex().expect("raw")));
    let status = fungible.associate(account, &raw, &token.token_id).await.expect("normalized");
    assert_eq!(status, AssociationStatus::AlreadyAssociated);
}

#[tokio::test]
async fn associate_when_credential_unparsable_then_key_parse_error() {
    let harness = Harness::new();
    let fungible = harness.orchestrator.fungible();
    let token = fungible.create_token(&CreateTokenRequest::infinite("Reward", "RWD", 1_000, 0)).await.expect("token");
    let (account, _) = harness.open_account(83, NATIVE_UNITS_PER_COIN);
    let err = fungible.associate(account, &SecretBytes::from("garbage"), &token.token_id).await.expect_err("bad credential");
    assert!(matches!(err, LedgerError::KeyParse { ref attempts } if attempts.len() == 2));
}

#[tokio::test]
async fn transfer_when_both_parties_associated_then_moves_smallest_units() {
    let harness = Harness::new();
    let orchestrator = &harness.orchestrator;
    let token = orchestrator.create_fungible_token(&CreateTokenRequest::infinite("Reward", "RWD", 10_000, 2)).await.expect("token");
    let (alice, alice_key) = harness.open_account(84, NATIVE_UNITS_PER_COIN);
    let (bob, bob_key) = harness.open_account(85, NATIVE_UNITS_PER_COIN);
    for (account, key) in [(alice, &alice_key), (bob, &bob_key)] {
        orchestrator.fungible().associate_with_key(account, key, &token.token_id).await.expect("associate");
    }
    let platform = orchestrator.operators().platform();
    orchestrator.transfer_fungible(&token.token_id, PLATFORM_ACCOUNT, alice, 700, &platform.signing_key).await.expect("fund alice");

    let tx = orchestrator.transfer_fungible(&token.token_id, alice, bob, 250, &alice_key).await.expect("alice to bob");
    assert!(tx.as_str().starts_with(&alice.to_string()));
    let queries = orchestrator.queries();
    assert_eq!(queries.get_token_balance(&alice, &token.token_id).await.expect("alice"), Some(450));
    assert_eq!(queries.get_token_balance(&bob, &token.token_id).await.expect("bob"), Some(250));
}

#[tokio::test]
async fn transfer_when_recipient_not_associated_or_signer_wrong_then_rejected() {
    let harness = Harness::new();
    let orchestrator = &harness.orchestrator;
    let token = orchestrator.create_fungible_token(&CreateTokenRequest::infinite("Reward", "RWD", 10_000, 2)).await.expect("token");
    let (carol, carol_key) = harness.open_account(86, NATIVE_UNITS_PER_COIN);
    let platform = orchestrator.operators().platform();

    let err = orchestrator.transfer_fungible(&token.token_id, PLATFORM_ACCOUNT, carol, 1, &platform.signing_key).await.expect_err("unassociated");
    assert_eq!(err.receipt_status(), Some(&ReceiptStatus::TokenNotAssociatedToAccount));

    let err = orchestrator.transfer_fungible(&token.token_id, PLATFORM_ACCOUNT, carol, 1, &carol_key).await.expect_err("wrong key");
    assert_eq!(err.receipt_status(), Some(&ReceiptStatus::InvalidSignature));

    let err = orchestrator.transfer_fungible(&token.token_id, PLATFORM_ACCOUNT, carol, 0, &platform.signing_key).await.expect_err("zero");
    assert!(matches!(err, LedgerError::InvalidAmount(_)));
}

#[tokio::test]
async fn mint_supply_when_finite_cap_reached_then_rejected_before_submission() {
    let harness = Harness::new();
    let fungible = harness.orchestrator.fungible();
    let token = fungible.create_token(&CreateTokenRequest::finite("Capped", "CAP", 900, 0, 1_000)).await.expect("token");
    assert_eq!(token.supply_policy, SupplyPolicy::Finite { max_supply: 1_000 });

    assert_eq!(fungible.mint_supply(&token.token_id, 100).await.expect("up to cap"), 1_000);
    let mints_before = harness.ledger.submission_count_of(TransactionKind::TokenMint);
    let err = fungible.mint_supply(&token.token_id, 1).await.expect_err("over cap");
    assert!(matches!(err, LedgerError::SupplyExceeded { requested: 1_001, max: 1_000 }));
    assert_eq!(harness.ledger.submission_count_of(TransactionKind::TokenMint), mints_before);
}

#[tokio::test]
async fn mint_supply_when_ledger_rejects_then_reports_mint_step() {
    let harness = Harness::new();
    let fungible = harness.orchestrator.fungible();
    let token = fungible.create_token(&CreateTokenRequest::infinite("Reward", "RWD", 0, 0)).await.expect("token");
    harness.ledger.fail_next(TransactionKind::TokenMint, InjectedFault::Status(ReceiptStatus::TokenHasNoSupplyKey));
    let err = fungible.mint_supply(&token.token_id, 10).await.expect_err("rejected");
    assert_eq!(err.failed_step(), Some(ProtocolStep::Mint));
    assert_eq!(err.receipt_status(), Some(&ReceiptStatus::TokenHasNoSupplyKey));
}
