//! Polling and reconciliation core for Proxmox VE.
//!
//! Exposes nodes, virtual machines, containers, storages, disks and pending
//! package updates of one Proxmox VE endpoint as periodically refreshed typed
//! records, keeps the device topology of the host platform in sync, and turns
//! per-resource permission problems into repair issues.

mod auth;
pub mod core;
pub mod monitor;

#[cfg(test)]
mod tests;

pub use crate::core::domain::{
    config::{IntegrationConfig, IntegrationOptions, RateLimitConfig, ResourceSelection, ValidationConfig},
    error::{FailureKind, ProxmoxError, ProxmoxResult, ValidationError},
    model::{
        DeviceEntry, DeviceIdentity, DeviceInfo, DiskRecord, DiskType, Field, GuestCommand,
        IssueReason, IssueSeverity, LxcRecord, NodeCommand, NodeRecord, RepairIssue,
        ResourceKind, ResourceRecord, StorageRecord, UpdateRecord, VmRecord,
        proxmox_auth::ProxmoxAuth,
        proxmox_connection::{ProxmoxConnection, ProxmoxCredential},
    },
    registry::{DeviceRegistry, IssueRegistry},
    value_object::{
        ProxmoxApiToken, ProxmoxCSRFToken, ProxmoxHost, ProxmoxPassword, ProxmoxPort,
        ProxmoxRealm, ProxmoxTicket, ProxmoxUrl, ProxmoxUsername,
    },
};
pub use crate::core::infrastructure::memory_registry::{InMemoryDeviceRegistry, InMemoryIssueRegistry};
pub use crate::monitor::{
    application::{
        coordinator::{
            CoordinatorTarget,
            runner::{CoordinatorHandle, CoordinatorState},
        },
        service::command_service::GuestTarget,
    },
    diagnostics::Diagnostics,
    integration::Integration,
};

use crate::core::{
    domain::value_object::{
        DEFAULT_PORT, DEFAULT_REALM, validate_api_token, validate_host, validate_password,
        validate_port, validate_realm, validate_username,
    },
    infrastructure::api_client::ApiClient,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

/// An authenticated session with one Proxmox VE endpoint.
///
/// # Examples
///
/// ```no_run
/// use proxmoxve_monitor::{ProxmoxClient, ProxmoxResult};
///
/// #[tokio::main]
/// async fn main() -> ProxmoxResult<()> {
///     let client = ProxmoxClient::builder()
///         .host("proxmox.example.com")
///         .port(8006)
///         .credentials("monitor", "password", "pve")
///         .build()?;
///
///     client.login().await?;
///     let version = client.get_value("version").await?;
///     println!("{:?}", version);
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct ProxmoxClient {
    api_client: Arc<ApiClient>,
}

/// Builder for ProxmoxClient configuration
#[derive(Debug)]
pub struct ProxmoxClientBuilder {
    host: Option<String>,
    port: u16,
    username: Option<String>,
    password: Option<String>,
    realm: String,
    token_name: Option<String>,
    secure: bool,
    verify_ssl: bool,
    config: ValidationConfig,
}

impl Default for ProxmoxClientBuilder {
    fn default() -> Self {
        Self {
            host: None,
            port: DEFAULT_PORT,
            username: None,
            password: None,
            realm: DEFAULT_REALM.to_string(),
            token_name: None,
            secure: true,
            verify_ssl: true,
            config: ValidationConfig::default(),
        }
    }
}

impl ProxmoxClientBuilder {
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Password login; `username` may already carry `@realm`.
    pub fn credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
        realm: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self.realm = realm.into();
        self
    }

    /// API token login; no ticket is requested.
    pub fn api_token(mut self, token_name: impl Into<String>, secret: impl Into<String>) -> Self {
        self.token_name = Some(token_name.into());
        self.password = Some(secret.into());
        self
    }

    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn realm(mut self, realm: impl Into<String>) -> Self {
        self.realm = realm.into();
        self
    }

    /// Use `https` (default) or plain `http`.
    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Verify the server certificate (default). Disable for self-signed setups.
    pub fn verify_ssl(mut self, verify_ssl: bool) -> Self {
        self.verify_ssl = verify_ssl;
        self
    }

    pub fn with_config(mut self, config: ValidationConfig) -> Self {
        self.config = config;
        self
    }

    /// Validates every field and builds the client. No request is sent.
    ///
    /// # Errors
    /// `Validation` for a missing or malformed field.
    pub fn build(self) -> ProxmoxResult<ProxmoxClient> {
        let host = required("host", self.host)?;
        let username = required("username", self.username)?;
        let secret = required("password", self.password)?;

        validate_host(&host)?;
        validate_port(self.port)?;
        validate_username(&username, self.config.block_reserved_usernames)?;
        validate_realm(&self.realm)?;
        let credential = match self.token_name {
            Some(token) => {
                validate_api_token(&token)?;
                ProxmoxCredential::ApiToken {
                    token: ProxmoxApiToken::new_unchecked(token),
                    secret: ProxmoxPassword::new_unchecked(secret),
                }
            }
            None => {
                validate_password(&secret, self.config.password_min_score)?;
                ProxmoxCredential::Password(ProxmoxPassword::new_unchecked(secret))
            }
        };

        let connection = ProxmoxConnection::new(
            ProxmoxHost::new_unchecked(host),
            ProxmoxPort::new_unchecked(self.port),
            ProxmoxUsername::new_unchecked(username),
            credential,
            ProxmoxRealm::new_unchecked(self.realm),
            self.secure,
            self.verify_ssl,
        )?;
        let api_client = ApiClient::new(connection, self.config)?;
        Ok(ProxmoxClient {
            api_client: Arc::new(api_client),
        })
    }
}

fn required(field: &str, value: Option<String>) -> Result<String, ValidationError> {
    value.ok_or_else(|| ValidationError::Field {
        field: field.to_string(),
        message: format!("{} is required", field),
    })
}

impl ProxmoxClient {
    /// Creates a new builder for ProxmoxClient configuration
    pub fn builder() -> ProxmoxClientBuilder {
        ProxmoxClientBuilder::default()
    }

    /// Builds the client described by a persisted configuration.
    ///
    /// # Errors
    /// `Validation` when the configuration does not pass the field checks.
    pub fn from_config(config: &IntegrationConfig) -> ProxmoxResult<Self> {
        let builder = Self::builder()
            .host(config.host.clone())
            .port(config.port)
            .username(config.username.clone())
            .realm(config.realm.clone())
            .verify_ssl(config.verify_ssl);
        let builder = match &config.token_name {
            Some(token) => builder.api_token(token.clone(), config.password.clone()),
            None => builder.credentials(
                config.username.clone(),
                config.password.clone(),
                config.realm.clone(),
            ),
        };
        builder.build()
    }

    #[cfg(test)]
    pub(crate) fn from_api_client(api_client: Arc<ApiClient>) -> Self {
        Self { api_client }
    }

    /// Establishes the session: a ticket login, or a probe for API tokens.
    ///
    /// # Errors
    /// `Authentication` when the credentials are refused; `Tls`, `Timeout`
    /// or `Connection` when the endpoint cannot be reached.
    pub async fn login(&self) -> ProxmoxResult<()> {
        self.api_client.login().await
    }

    pub async fn is_authenticated(&self) -> bool {
        self.api_client.is_authenticated().await
    }

    /// Returns the current authentication ticket if logged in with a password.
    pub async fn auth_token(&self) -> Option<ProxmoxTicket> {
        self.api_client.auth().await.map(|auth| auth.ticket().clone())
    }

    /// Returns the current CSRF token if logged in with a password.
    pub async fn csrf_token(&self) -> Option<ProxmoxCSRFToken> {
        self.api_client
            .auth()
            .await
            .and_then(|auth| auth.csrf_token().cloned())
    }

    /// Reads `path` and returns the `data` member; `None` for `null`.
    pub async fn get_value(&self, path: &str) -> ProxmoxResult<Option<Value>> {
        self.api_client.get_value(path).await
    }

    /// Reads and decodes `path`.
    pub async fn get<T>(&self, path: &str) -> ProxmoxResult<Option<T>>
    where
        T: DeserializeOwned,
    {
        self.api_client.get(path).await
    }

    pub fn connection(&self) -> &ProxmoxConnection {
        self.api_client.connection()
    }

    pub(crate) fn api_client(&self) -> Arc<ApiClient> {
        self.api_client.clone()
    }
}
