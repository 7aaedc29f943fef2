use crate::foundation::{AccountId, ChannelId};
use crate::infrastructure::config::types::AppConfig;

impl AppConfig {
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.network.mirror_url.trim().is_empty() {
            errors.push("network.mirror_url must not be empty".to_string());
        } else if !self.network.mirror_url.starts_with("http://") && !self.network.mirror_url.starts_with("https://") {
            errors.push(format!("network.mirror_url must be http(s): {}", self.network.mirror_url));
        }
        if self.network.request_timeout_secs == 0 {
            errors.push("network.request_timeout_secs must be > 0".to_string());
        }

        if self.platform.account_id.trim().is_empty() {
            errors.push("platform.account_id is required".to_string());
        } else if let Err(err) = self.platform.account_id.parse::<AccountId>() {
            errors.push(format!("platform.account_id: {err}"));
        }
        match (&self.platform.credential, &self.platform.credential_env) {
            (None, None) => errors.push("one of platform.credential or platform.credential_env is required".to_string()),
            (Some(_), Some(_)) => errors.push("platform.credential and platform.credential_env are mutually exclusive".to_string()),
            _ => {}
        }

        if let Some(channel_id) = self.audit.channel_id.as_deref() {
            if let Err(err) = channel_id.parse::<ChannelId>() {
                errors.push(format!("audit.channel_id: {err}"));
            }
        }

        if self.certificates.max_metadata_bytes == 0 {
            errors.push("certificates.max_metadata_bytes must be > 0".to_string());
        }

        if self.funding.top_up_amount < self.funding.min_operational_balance {
            errors.push(format!(
                "funding.top_up_amount ({}) must be >= funding.min_operational_balance ({})",
                self.funding.top_up_amount, self.funding.min_operational_balance
            ));
        }

        if self.distribution.max_concurrency == 0 {
            errors.push("distribution.max_concurrency must be > 0".to_string());
        }
        if self.distribution.deadline_secs == Some(0) {
            errors.push("distribution.deadline_secs must be > 0 when set".to_string());
        }

        if self.query.retry_attempts == 0 {
            errors.push("query.retry_attempts must be > 0".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
