use crate::fixtures::{platform_key, PLATFORM_ACCOUNT, PLATFORM_BALANCE};
use ledger_core::foundation::{ErrorCode, LedgerError};
use ledger_core::infrastructure::config::{load_app_config_from_path, AppConfig};
use ledger_core::infrastructure::identity::InMemoryCallerDirectory;
use ledger_core::infrastructure::ledger::InMemoryLedger;
use ledger_core::LedgerOrchestrator;
use std::io::Write;
use std::sync::Arc;

fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("tempfile");
    file.write_all(contents.as_bytes()).expect("write config");
    file
}

fn orchestrator_for(config: &AppConfig) -> Result<LedgerOrchestrator, LedgerError> {
    let ledger = InMemoryLedger::new();
    ledger.create_account_with_id(PLATFORM_ACCOUNT, platform_key().public_key(), PLATFORM_BALANCE).expect("platform account");
    LedgerOrchestrator::from_config(config, Arc::new(ledger.clone()), Arc::new(ledger), Arc::new(InMemoryCallerDirectory::new()))
}

#[tokio::test]
async fn from_config_when_toml_carries_der_credential_then_platform_key_resolves() {
    let file = write_config(&format!(
        "[platform]\naccount_id = \"{}\"\ncredential = \"{}\"\n\n[distribution]\nmax_concurrency = 3\n",
        PLATFORM_ACCOUNT,
        platform_key().to_der_hex()
    ));
    let config = load_app_config_from_path(file.path()).expect("load");
    assert_eq!(config.distribution.max_concurrency, 3);

    let orchestrator = orchestrator_for(&config).expect("orchestrator");
    let platform = orchestrator.operators().platform();
    assert_eq!(platform.account_id, PLATFORM_ACCOUNT);
    assert_eq!(platform.public_key(), platform_key().public_key());
    assert!(!platform.is_delegated);
}

#[tokio::test]
async fn from_config_when_credential_comes_from_named_env_var_then_resolves() {
    let var = "ORCHESTRATOR_ITEST_PLATFORM_CREDENTIAL";
    std::env::set_var(var, format!("  {}  ", platform_key().to_der_hex()));
    let mut config = AppConfig::default();
    config.platform.account_id = PLATFORM_ACCOUNT.to_string();
    config.platform.credential_env = Some(var.to_string());

    let orchestrator = orchestrator_for(&config);
    std::env::remove_var(var);
    let orchestrator = orchestrator.expect("orchestrator");
    assert_eq!(orchestrator.operators().platform().public_key(), platform_key().public_key());
}

#[tokio::test]
async fn from_config_when_platform_credential_is_garbage_then_key_parse_error() {
    let mut config = AppConfig::default();
    config.platform.account_id = PLATFORM_ACCOUNT.to_string();
    config.platform.credential = Some("not-a-key".to_string());
    let err = orchestrator_for(&config).err().expect("garbage credential");
    assert_eq!(err.code(), ErrorCode::KeyParse);
    assert!(!err.to_string().contains("not-a-key"));
}

#[tokio::test]
async fn load_when_config_invalid_then_config_error_lists_problems() {
    let file = write_config("[platform]\naccount_id = \"nope\"\n\n[distribution]\nmax_concurrency = 0\n");
    let err = load_app_config_from_path(file.path()).expect_err("invalid");
    let LedgerError::ConfigError(message) = err else {
        panic!("expected config error, got {err:?}");
    };
    assert!(message.contains("platform.account_id"));
    assert!(message.contains("max_concurrency"));

    let err = orchestrator_for(&AppConfig::default()).err().expect("defaults lack a platform");
    assert_eq!(err.code(), ErrorCode::ConfigError);
}

#[tokio::test]
async fn with_mirror_node_when_mirror_unreachable_then_balance_query_is_transient_network_error() {
    let mut config = crate::fixtures::platform_config();
    config.network.mirror_url = "http://127.0.0.1:9".to_string();
    config.network.request_timeout_secs = 1;
    config.query.retry_attempts = 1;
    let ledger = InMemoryLedger::new();
    let orchestrator =
        LedgerOrchestrator::with_mirror_node(&config, Arc::new(ledger), Arc::new(InMemoryCallerDirectory::new())).expect("orchestrator");
    let err = orchestrator.queries().get_balance(&PLATFORM_ACCOUNT).await.expect_err("unreachable mirror");
    assert!(err.is_transient());
}
