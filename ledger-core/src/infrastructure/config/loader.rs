//! Layered configuration: compiled defaults, then the TOML file, then `LEDGER_*` environment overrides.

use crate::foundation::Result;
use crate::infrastructure::config::env::ENV_PREFIX;
use crate::infrastructure::config::types::AppConfig;
use crate::infrastructure::ledger::mirror::redact_url;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use log::{debug, info};
use std::path::Path;

/// Loads from `path`; a missing file falls back to defaults plus environment.
pub fn load_config_from_file(path: &Path) -> Result<AppConfig> {
    load_with_env_prefix(path, ENV_PREFIX)
}

/// Loads from an in-memory TOML document, without environment overrides.
pub fn load_config_from_str(toml: &str) -> Result<AppConfig> {
    let figment = Figment::new().merge(Serialized::defaults(AppConfig::default())).merge(Toml::string(toml));
    Ok(figment.extract()?)
}

pub(crate) fn load_with_env_prefix(path: &Path, env_prefix: &str) -> Result<AppConfig> {
    info!("loading configuration path={} env_prefix={}", path.display(), env_prefix);
    let mut figment = Figment::new().merge(Serialized::defaults(AppConfig::default()));
    if path.exists() {
        figment = figment.merge(Toml::file(path));
    } else {
        debug!("configuration file missing; using defaults and env only path={}", path.display());
    }
    let config: AppConfig = figment.merge(Env::prefixed(env_prefix).split("__")).extract()?;
    debug!(
        "configuration loaded mirror_url={} platform_account={} audit_channel={:?} max_concurrency={}",
        redact_url(&config.network.mirror_url),
        config.platform.account_id,
        config.audit.channel_id,
        config.distribution.max_concurrency
    );
    Ok(config)
}
