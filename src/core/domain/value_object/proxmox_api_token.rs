use crate::core::domain::error::ValidationError;

/// The id of an API token (`user@realm!tokenid`), used instead of a ticket login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxmoxApiToken(String);

impl ProxmoxApiToken {
    /// Creates a new token name without validation.
    pub(crate) fn new_unchecked(name: String) -> Self {
        Self(name)
    }

    /// Returns the token name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Formats the `Authorization` header value for a token request.
    #[must_use]
    pub fn as_authorization_header(&self, user_id: &str, secret: &str) -> String {
        format!("PVEAPIToken={}!{}={}", user_id, self.0, secret)
    }
}

/// Validates a token name.
pub(crate) fn validate_api_token(name: &str) -> Result<(), ValidationError> {
    if name.is_empty() {
        return Err(ValidationError::Field {
            field: "token_name".to_string(),
            message: "Token name cannot be empty".to_string(),
        });
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
    {
        return Err(ValidationError::Format(
            "Token name contains invalid characters".to_string(),
        ));
    }
    Ok(())
}
