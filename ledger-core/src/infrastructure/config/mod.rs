mod env;
mod loader;
mod types;
mod validation;

pub use env::{non_empty_env, resolve_config_path, CONFIG_PATH_ENV, DEFAULT_CONFIG_FILE, ENV_PREFIX};
pub use loader::{load_config_from_file, load_config_from_str};
pub use types::*;

use crate::foundation::{AccountId, ChannelId, LedgerError, Result};
use crate::infrastructure::keys::SecretBytes;
use std::path::Path;

/// Resolves the config path from `LEDGER_CONFIG_PATH` (or `./ledger-config.toml`), loads and validates it.
pub fn load_app_config() -> Result<AppConfig> {
    load_app_config_from_path(&resolve_config_path()?)
}

pub fn load_app_config_from_path(path: &Path) -> Result<AppConfig> {
    let config = load_config_from_file(path)?;
    config.validate().map_err(|errors| LedgerError::ConfigError(format!("validation failed: {}", errors.join("; "))))?;
    Ok(config)
}

impl AppConfig {
    pub fn platform_account_id(&self) -> Result<AccountId> {
        self.platform.account_id.parse()
    }

    pub fn audit_channel_id(&self) -> Result<Option<ChannelId>> {
        self.audit.channel_id.as_deref().map(|id| id.parse::<ChannelId>()).transpose()
    }

    /// Raw platform credential, still in its stored encoding.
    pub fn platform_credential(&self) -> Result<SecretBytes> {
        if let Some(credential) = self.platform.credential.as_deref() {
            return Ok(SecretBytes::from(credential.trim()));
        }
        let name = self
            .platform
            .credential_env
            .as_deref()
            .ok_or_else(|| LedgerError::ConfigError("platform credential is not configured".to_string()))?;
        non_empty_env(name)
            .map(SecretBytes::from)
            .ok_or_else(|| LedgerError::ConfigError(format!("platform credential env var {name} is unset or empty")))
    }
}
