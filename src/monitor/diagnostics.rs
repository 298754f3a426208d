//! Redacted snapshot of one endpoint for support requests.

use crate::core::domain::{
    config::IntegrationConfig,
    error::{ProxmoxError, ProxmoxResult},
    model::repair_issue::RepairIssue,
};
use crate::monitor::application::coordinator::runner::CoordinatorSnapshot;
use serde::Serialize;
use serde_json::Value;

pub const REDACTED: &str = "**REDACTED**";

const REDACTED_KEYS: [&str; 4] = ["host", "username", "password", "token_name"];

#[derive(Debug, Clone, Serialize)]
pub struct Diagnostics {
    pub config: Value,
    pub needs_reauth: bool,
    pub coordinators: Vec<CoordinatorSnapshot>,
    pub issues: Vec<RepairIssue>,
}

impl Diagnostics {
    pub fn to_json(&self) -> ProxmoxResult<Value> {
        serde_json::to_value(self).map_err(|e| ProxmoxError::Parse(e.to_string()))
    }
}

/// The configuration as JSON with connection secrets and identities masked.
pub fn redact_config(config: &IntegrationConfig) -> ProxmoxResult<Value> {
    let mut value = serde_json::to_value(config).map_err(|e| ProxmoxError::Parse(e.to_string()))?;
    if let Some(object) = value.as_object_mut() {
        for key in REDACTED_KEYS {
            if let Some(field) = object.get_mut(key) {
                if !field.is_null() {
                    *field = Value::String(REDACTED.to_string());
                }
            }
        }
    }
    Ok(value)
}
