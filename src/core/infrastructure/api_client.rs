//! Internal HTTP client that handles authentication, automatic ticket refresh
//! and translation of HTTP failures into [`ProxmoxError`] variants.

use crate::{
    auth::application::service::login_service::LoginService,
    core::domain::{
        config::ValidationConfig,
        error::{ProxmoxError, ProxmoxResult, ValidationError},
        model::{
            proxmox_auth::ProxmoxAuth,
            proxmox_connection::{ProxmoxConnection, ProxmoxCredential},
        },
    },
};
use governor::{DefaultDirectRateLimiter, Quota};
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::error::Error as StdError;
use std::num::NonZeroU32;
use std::sync::Arc;
use tokio::sync::{RwLock, Semaphore};
use tracing::debug;

/// Maps a transport-level reqwest failure to a timeout, TLS or connection error.
pub(crate) fn transport_error(context: &str, error: reqwest::Error) -> ProxmoxError {
    if error.is_timeout() {
        return ProxmoxError::Timeout(format!("{}: {}", context, error));
    }
    let mut source: Option<&dyn StdError> = Some(&error as &dyn StdError);
    while let Some(current) = source {
        let text = current.to_string().to_ascii_lowercase();
        if text.contains("certificate") || text.contains("tls") || text.contains("ssl") {
            return ProxmoxError::Tls(format!("{}: {}", context, current));
        }
        source = current.source();
    }
    ProxmoxError::Connection(format!("{}: {}", context, error))
}

/// Pulls the server's explanation out of an error body.
fn error_message(status: StatusCode, body: &str) -> String {
    let from_json = serde_json::from_str::<Value>(body).ok().and_then(|value| {
        value
            .get("message")
            .and_then(Value::as_str)
            .map(|m| m.trim().to_string())
    });
    match from_json {
        Some(message) if !message.is_empty() => message,
        _ if !body.trim().is_empty() && !body.trim_start().starts_with('{') => {
            body.trim().to_string()
        }
        _ => status
            .canonical_reason()
            .unwrap_or("Unknown error")
            .to_string(),
    }
}

/// Internal HTTP client that manages authentication and provides methods to call the Proxmox API.
///
/// Ticket connections carry `PVEAuthCookie` and `CSRFPreventionToken`; a
/// `401 Unauthorized` triggers exactly one re-login and retry. Token
/// connections carry the `PVEAPIToken` authorization header and treat `401`
/// as final. Every call waits for a slot of the shared in-flight semaphore and,
/// when configured, the rate limiter.
#[derive(Debug)]
pub struct ApiClient {
    http_client: Client,
    connection: Arc<ProxmoxConnection>,
    auth: Arc<RwLock<Option<ProxmoxAuth>>>,
    config: Arc<ValidationConfig>,
    rate_limiter: Option<Arc<DefaultDirectRateLimiter>>,
    in_flight: Arc<Semaphore>,
    login_service: LoginService,
}

impl ApiClient {
    /// Creates a new `ApiClient`. The client starts unauthenticated.
    ///
    /// # Errors
    /// Returns `ProxmoxError::Connection` if the HTTP client cannot be built and
    /// `ProxmoxError::Validation` for a zero rate limit or concurrency bound.
    pub fn new(connection: ProxmoxConnection, config: ValidationConfig) -> ProxmoxResult<Self> {
        let http_client = Client::builder()
            .danger_accept_invalid_certs(!connection.verify_ssl())
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ProxmoxError::Connection(e.to_string()))?;

        let rate_limiter = match config.rate_limit {
            Some(rl) => {
                let per_second = NonZeroU32::new(rl.requests_per_second).ok_or_else(|| {
                    ValidationError::ConstraintViolation(
                        "Rate limit must allow at least one request per second".to_string(),
                    )
                })?;
                let burst = NonZeroU32::new(rl.burst_size).ok_or_else(|| {
                    ValidationError::ConstraintViolation(
                        "Rate limit burst size must be at least one".to_string(),
                    )
                })?;
                let quota = Quota::per_second(per_second).allow_burst(burst);
                Some(Arc::new(DefaultDirectRateLimiter::direct(quota)))
            }
            None => None,
        };

        if config.max_concurrent_requests == 0 {
            return Err(ValidationError::ConstraintViolation(
                "At least one concurrent request must be allowed".to_string(),
            )
            .into());
        }
        let in_flight = Arc::new(Semaphore::new(config.max_concurrent_requests));

        Ok(Self {
            http_client,
            connection: Arc::new(connection),
            auth: Arc::new(RwLock::new(None)),
            config: Arc::new(config),
            rate_limiter,
            in_flight,
            login_service: LoginService::new(),
        })
    }

    /// Returns a reference to the underlying connection details.
    pub fn connection(&self) -> &ProxmoxConnection {
        &self.connection
    }

    /// Sets the authentication state (used after a successful login or session restore).
    pub async fn set_auth(&self, auth: ProxmoxAuth) {
        let mut lock = self.auth.write().await;
        *lock = Some(auth);
    }

    /// Returns the current authentication state, if any.
    pub async fn auth(&self) -> Option<ProxmoxAuth> {
        self.auth.read().await.clone()
    }

    /// Returns `true` if requests can be sent without logging in first.
    pub async fn is_authenticated(&self) -> bool {
        if self.connection.uses_api_token() {
            return true;
        }
        let lock = self.auth.read().await;
        lock.as_ref()
            .map(|a| !a.ticket().is_expired(self.config.ticket_lifetime))
            .unwrap_or(false)
    }

    /// Establishes the session: a ticket login, or a version probe for tokens.
    ///
    /// # Errors
    /// `Authentication` for refused credentials; transport errors otherwise.
    pub async fn login(&self) -> ProxmoxResult<()> {
        if self.connection.uses_api_token() {
            self.get_value("version").await?;
            return Ok(());
        }
        self.refresh_auth().await
    }

    /// Performs an authenticated GET and returns the `data` member of the
    /// response envelope; `None` when the server answered `null`.
    ///
    /// # Errors
    /// See [`ProxmoxError::failure_kind`] for how each variant is meant to be handled.
    pub async fn get_value(&self, path: &str) -> ProxmoxResult<Option<Value>> {
        let data = self.execute_request(Method::GET, path).await?;
        debug!("API GET Response - {}: {}", path, data);
        Ok((!data.is_null()).then_some(data))
    }

    /// Performs an authenticated GET and decodes the `data` member.
    ///
    /// # Errors
    /// `Parse` when the payload does not have the shape of `T`.
    pub async fn get<T>(&self, path: &str) -> ProxmoxResult<Option<T>>
    where
        T: DeserializeOwned,
    {
        match self.get_value(path).await? {
            Some(data) => serde_json::from_value(data)
                .map(Some)
                .map_err(|e| ProxmoxError::Parse(format!("{}: {}", path, e))),
            None => Ok(None),
        }
    }

    /// Performs an authenticated POST without a body (power commands).
    pub async fn post(&self, path: &str) -> ProxmoxResult<Option<Value>> {
        let data = self.execute_request(Method::POST, path).await?;
        debug!("API POST - {}: {}", path, data);
        Ok((!data.is_null()).then_some(data))
    }

    /// Core request execution method. It waits for capacity, ensures
    /// authentication, sends the request, handles 401 by refreshing once, and
    /// unwraps the `{"data": ...}` envelope.
    async fn execute_request(&self, method: Method, path: &str) -> ProxmoxResult<Value> {
        let _permit = self
            .in_flight
            .acquire()
            .await
            .map_err(|e| ProxmoxError::Connection(format!("Client closed: {}", e)))?;

        if let Some(limiter) = &self.rate_limiter {
            limiter.until_ready().await;
        }

        self.ensure_authenticated().await?;

        let response = self.send(method.clone(), path).await?;
        let response = if response.status() == StatusCode::UNAUTHORIZED {
            if self.connection.uses_api_token() {
                return Err(ProxmoxError::Authentication(
                    "API token was rejected".to_string(),
                ));
            }
            debug!("Ticket rejected on {}, logging in again", path);
            self.refresh_auth().await?;
            let retried = self.send(method, path).await?;
            if retried.status() == StatusCode::UNAUTHORIZED {
                return Err(ProxmoxError::Authentication(
                    "Credentials rejected after re-login".to_string(),
                ));
            }
            retried
        } else {
            response
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = error_message(status, &body);
            return Err(if status == StatusCode::FORBIDDEN {
                ProxmoxError::Forbidden {
                    path: path.to_string(),
                    message,
                }
            } else {
                ProxmoxError::Api {
                    status: status.as_u16(),
                    message,
                }
            });
        }

        let mut envelope = response
            .json::<Value>()
            .await
            .map_err(|e| ProxmoxError::Parse(format!("{}: {}", path, e)))?;
        Ok(envelope
            .get_mut("data")
            .map(Value::take)
            .unwrap_or(Value::Null))
    }

    async fn send(&self, method: Method, path: &str) -> ProxmoxResult<reqwest::Response> {
        let url = self.connection.proxmox_url().api_path(path);
        let mut req_builder = self.http_client.request(method.clone(), &url);

        match self.connection.proxmox_credential() {
            ProxmoxCredential::ApiToken { token, secret } => {
                req_builder = req_builder.header(
                    "Authorization",
                    token.as_authorization_header(&self.connection.user_id(), secret.as_str()),
                );
            }
            ProxmoxCredential::Password(_) => {
                let auth_guard = self.auth.read().await;
                if let Some(auth) = auth_guard.as_ref() {
                    req_builder = req_builder.header("Cookie", auth.ticket().as_cookie_header());
                    if method != Method::GET {
                        if let Some(csrf) = auth.csrf_token() {
                            req_builder = req_builder.header("CSRFPreventionToken", csrf.as_str());
                        }
                    }
                }
            }
        }

        req_builder
            .send()
            .await
            .map_err(|e| transport_error("HTTP request failed", e))
    }

    /// Ensures that we have a valid (non-expired) ticket. If not, attempts to refresh.
    async fn ensure_authenticated(&self) -> ProxmoxResult<()> {
        if self.is_authenticated().await {
            return Ok(());
        }
        self.refresh_auth().await
    }

    /// Performs a fresh login using the stored credentials to obtain a new ticket.
    async fn refresh_auth(&self) -> ProxmoxResult<()> {
        let auth = self
            .login_service
            .execute(&self.http_client, &self.connection)
            .await?;
        self.set_auth(auth).await;
        Ok(())
    }
}
