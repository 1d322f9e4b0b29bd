use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use askdesk_engine::{BackendSettings, EngineConfig, PollSettings, TransportPolicy};
use serde::{Deserialize, Serialize};

const CONFIG_FILENAME: &str = "askdesk.ron";
const CONFIG_ENV: &str = "ASKDESK_CONFIG";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) enum TransportPolicySetting {
    FailFast,
    RetryWithinBudget,
}

/// On-disk configuration. Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct AppConfig {
    pub base_url: String,
    pub submit_path: String,
    pub status_path: String,
    pub query_field: String,
    pub poll_interval_ms: u64,
    pub max_attempts: u32,
    pub transport_policy: TransportPolicySetting,
    pub connect_timeout_ms: u64,
    pub request_timeout_ms: u64,
    pub max_bytes: u64,
    pub log_level: String,
    pub log_to_file: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        let backend = BackendSettings::default();
        let polling = PollSettings::default();
        Self {
            base_url: backend.base_url,
            submit_path: backend.submit_path,
            status_path: backend.status_path,
            query_field: backend.query_field,
            poll_interval_ms: polling.interval.as_millis() as u64,
            max_attempts: polling.max_attempts,
            transport_policy: match polling.transport_policy {
                TransportPolicy::FailFast => TransportPolicySetting::FailFast,
                TransportPolicy::RetryWithinBudget => TransportPolicySetting::RetryWithinBudget,
            },
            connect_timeout_ms: backend.connect_timeout.as_millis() as u64,
            request_timeout_ms: backend.request_timeout.as_millis() as u64,
            max_bytes: backend.max_bytes,
            log_level: "info".to_string(),
            log_to_file: false,
        }
    }
}

impl AppConfig {
    pub(crate) fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            backend: BackendSettings {
                base_url: self.base_url.clone(),
                submit_path: self.submit_path.clone(),
                status_path: self.status_path.clone(),
                query_field: self.query_field.clone(),
                connect_timeout: Duration::from_millis(self.connect_timeout_ms),
                request_timeout: Duration::from_millis(self.request_timeout_ms),
                max_bytes: self.max_bytes,
            },
            polling: PollSettings {
                interval: Duration::from_millis(self.poll_interval_ms),
                max_attempts: self.max_attempts,
                transport_policy: match self.transport_policy {
                    TransportPolicySetting::FailFast => TransportPolicy::FailFast,
                    TransportPolicySetting::RetryWithinBudget => {
                        TransportPolicy::RetryWithinBudget
                    }
                },
            },
        }
    }
}

/// `$ASKDESK_CONFIG` if set, else `./askdesk.ron`.
pub(crate) fn config_path() -> PathBuf {
    std::env::var_os(CONFIG_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILENAME))
}

/// A missing file is not an error; it yields the defaults.
pub(crate) fn load_config(path: &Path) -> anyhow::Result<AppConfig> {
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Ok(AppConfig::default());
        }
        Err(err) => {
            return Err(err).with_context(|| format!("failed to read {}", path.display()));
        }
    };
    ron::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))
}
