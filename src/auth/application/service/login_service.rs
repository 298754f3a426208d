use crate::{
    auth::application::{
        request::login_request::LoginRequest, response::login_response::LoginResponse,
    },
    core::{
        domain::{
            error::{ProxmoxError, ProxmoxResult, ValidationError},
            model::{
                proxmox_auth::ProxmoxAuth,
                proxmox_connection::{ProxmoxConnection, ProxmoxCredential},
            },
            value_object::{
                ProxmoxCSRFToken, ProxmoxTicket, validate_csrf_token, validate_ticket,
            },
        },
        infrastructure::api_client::transport_error,
    },
};

use reqwest::{
    Client, StatusCode,
    header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue},
};
use tracing::debug;

/// Performs the ticket login against `access/ticket`.
#[derive(Debug, Clone)]
pub struct LoginService {
    default_headers: HeaderMap,
}

impl LoginService {
    pub fn new() -> Self {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        default_headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        Self { default_headers }
    }

    /// Logs in with the connection's password.
    ///
    /// # Errors
    /// `Authentication` when the server refuses the credentials or the
    /// connection is configured for an API token; transport errors otherwise.
    pub async fn execute(
        &self,
        http_client: &Client,
        connection: &ProxmoxConnection,
    ) -> ProxmoxResult<ProxmoxAuth> {
        let url = connection.proxmox_url().api_path("access/ticket");
        let request = self.build_login_request(connection)?;
        debug!("Logging in to {} as {}", url, request.username);
        let response = http_client
            .post(&url)
            .headers(self.default_headers.clone())
            .json(&request)
            .send()
            .await
            .map_err(|e| transport_error("Login request failed", e))?;

        match response.status() {
            StatusCode::OK => self.handle_successful_login(response).await,
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(ProxmoxError::Authentication(
                "Invalid credentials provided".to_string(),
            )),
            StatusCode::BAD_REQUEST => Err(ProxmoxError::Validation(ValidationError::Field {
                field: "request".to_string(),
                message: "Invalid request format".to_string(),
            })),
            StatusCode::NOT_FOUND => Err(ProxmoxError::Connection(
                "Login endpoint not found".to_string(),
            )),
            status => Err(ProxmoxError::Api {
                status: status.as_u16(),
                message: format!("Unexpected login response status: {}", status),
            }),
        }
    }

    fn build_login_request(&self, connection: &ProxmoxConnection) -> ProxmoxResult<LoginRequest> {
        match connection.proxmox_credential() {
            ProxmoxCredential::Password(password) => Ok(LoginRequest {
                username: connection.user_id(),
                password: password.as_str().to_string(),
            }),
            ProxmoxCredential::ApiToken { .. } => Err(ProxmoxError::Authentication(
                "API token connections do not use ticket login".to_string(),
            )),
        }
    }

    async fn handle_successful_login(
        &self,
        response: reqwest::Response,
    ) -> ProxmoxResult<ProxmoxAuth> {
        let login_response = response.json::<LoginResponse>().await.map_err(|e| {
            ProxmoxError::Authentication(format!("Failed to parse login response: {}", e))
        })?;

        validate_ticket(&login_response.data.ticket)?;
        validate_csrf_token(&login_response.data.csrf_token)?;
        if let Some(user) = &login_response.data.username {
            debug!("Authenticated as {}", user);
        }

        Ok(ProxmoxAuth::new(
            ProxmoxTicket::new_unchecked(login_response.data.ticket),
            Some(ProxmoxCSRFToken::new_unchecked(login_response.data.csrf_token)),
        ))
    }
}

impl Default for LoginService {
    fn default() -> Self {
        Self::new()
    }
}
