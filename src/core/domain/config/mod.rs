//! Client tuning and the persisted integration configuration.

use crate::core::domain::{
    error::{ProxmoxResult, ValidationError},
    value_object::{
        DEFAULT_PORT, DEFAULT_REALM, validate_api_token, validate_host, validate_password,
        validate_port, validate_realm, validate_username,
    },
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default polling period of every coordinator.
pub const DEFAULT_SCAN_INTERVAL: Duration = Duration::from_secs(60);
/// Default timeout applied to each network call.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Token bucket settings for outgoing requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub requests_per_second: u32,
    pub burst_size: u32,
}

/// Connection-level behavior of the API client.
#[derive(Debug, Clone)]
pub struct ValidationConfig {
    /// Tickets older than this are renewed before the next request.
    pub ticket_lifetime: Duration,
    /// Optional request rate limit.
    pub rate_limit: Option<RateLimitConfig>,
    /// Timeout applied to every HTTP call.
    pub request_timeout: Duration,
    /// Upper bound of requests in flight across all coordinators.
    pub max_concurrent_requests: usize,
    /// Reject passwords below this strength.
    pub password_min_score: Option<zxcvbn::Score>,
    /// Reject `root`, `admin` and similar account names.
    pub block_reserved_usernames: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            ticket_lifetime: Duration::from_secs(2 * 60 * 60),
            rate_limit: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            max_concurrent_requests: 4,
            password_min_score: None,
            block_reserved_usernames: false,
        }
    }
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_realm() -> String {
    DEFAULT_REALM.to_string()
}

fn default_true() -> bool {
    true
}

fn default_scan_interval() -> u64 {
    DEFAULT_SCAN_INTERVAL.as_secs()
}

/// Operator toggles that do not change the resource selection itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrationOptions {
    /// Poll the disks of every selected node.
    #[serde(default = "default_true")]
    pub disks_enable: bool,
    /// Poll the pending package list of every selected node.
    #[serde(default = "default_true")]
    pub update_enable: bool,
}

impl Default for IntegrationOptions {
    fn default() -> Self {
        Self {
            disks_enable: true,
            update_enable: true,
        }
    }
}

/// The resources the operator chose to monitor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceSelection {
    #[serde(default)]
    pub nodes: Vec<String>,
    #[serde(default)]
    pub qemu: Vec<u32>,
    #[serde(default)]
    pub lxc: Vec<u32>,
    #[serde(default)]
    pub storage: Vec<String>,
}

/// The persisted configuration of one monitored endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrationConfig {
    /// Scope of every device identity and repair issue created for this endpoint.
    pub entry_id: String,
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub username: String,
    /// Password, or the token secret when `token_name` is set.
    pub password: String,
    #[serde(default)]
    pub token_name: Option<String>,
    #[serde(default = "default_realm")]
    pub realm: String,
    #[serde(default = "default_true")]
    pub verify_ssl: bool,
    #[serde(flatten)]
    pub selection: ResourceSelection,
    #[serde(default)]
    pub options: IntegrationOptions,
    #[serde(default = "default_scan_interval")]
    pub scan_interval: u64,
}

impl IntegrationConfig {
    /// Parses a configuration from JSON text and validates it.
    pub fn from_json_str(raw: &str) -> ProxmoxResult<Self> {
        let config: Self = serde_json::from_str(raw).map_err(|e| {
            ValidationError::Format(format!("Invalid integration configuration: {}", e))
        })?;
        config.validate(&ValidationConfig::default())?;
        Ok(config)
    }

    /// Reads and validates a configuration file.
    pub async fn from_path(path: impl AsRef<Path>) -> ProxmoxResult<Self> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
            ValidationError::Field {
                field: "path".to_string(),
                message: format!("Cannot read {}: {}", path.display(), e),
            }
        })?;
        Self::from_json_str(&raw)
    }

    /// Checks every connection field against the value-object rules.
    pub fn validate(&self, rules: &ValidationConfig) -> Result<(), ValidationError> {
        if self.entry_id.trim().is_empty() {
            return Err(ValidationError::Field {
                field: "entry_id".to_string(),
                message: "Entry id cannot be empty".to_string(),
            });
        }
        validate_host(&self.host)?;
        validate_port(self.port)?;
        validate_username(&self.username, rules.block_reserved_usernames)?;
        validate_realm(&self.realm)?;
        match &self.token_name {
            Some(token) => validate_api_token(token)?,
            None => validate_password(&self.password, rules.password_min_score)?,
        }
        if self.scan_interval == 0 {
            return Err(ValidationError::ConstraintViolation(
                "Scan interval must be at least one second".to_string(),
            ));
        }
        Ok(())
    }

    /// The polling period shared by every coordinator of this endpoint.
    pub fn scan_interval(&self) -> Duration {
        Duration::from_secs(self.scan_interval)
    }
}
