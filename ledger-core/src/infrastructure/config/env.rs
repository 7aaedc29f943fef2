use crate::foundation::{LedgerError, Result};
use std::path::PathBuf;

/// Prefix of environment overrides: `LEDGER_FUNDING__COOLDOWN_SECS` -> `funding.cooldown_secs`.
pub const ENV_PREFIX: &str = "LEDGER_";
pub const CONFIG_PATH_ENV: &str = "LEDGER_CONFIG_PATH";
pub const DEFAULT_CONFIG_FILE: &str = "ledger-config.toml";

pub fn resolve_config_path() -> Result<PathBuf> {
    if let Some(path) = non_empty_env(CONFIG_PATH_ENV) {
        return Ok(PathBuf::from(path));
    }
    let cwd = std::env::current_dir().map_err(|err| LedgerError::ConfigError(format!("current dir: {err}")))?;
    Ok(cwd.join(DEFAULT_CONFIG_FILE))
}

pub fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().map(|value| value.trim().to_string()).filter(|value| !value.is_empty())
}
