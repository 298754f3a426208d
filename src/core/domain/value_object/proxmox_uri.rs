use crate::core::domain::{
    error::ValidationError,
    value_object::{ProxmoxHost, ProxmoxPort},
};

/// The base URL of the management API (`https://host:port/`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxmoxUrl(url::Url);

impl ProxmoxUrl {
    /// Builds the base URL from a validated host and port.
    pub fn from_parts(
        host: &ProxmoxHost,
        port: &ProxmoxPort,
        secure: bool,
    ) -> Result<Self, ValidationError> {
        let scheme = if secure { "https" } else { "http" };
        let raw = format!("{}://{}:{}/", scheme, host.as_str(), port.get());
        validate_url(&raw)?;
        url::Url::parse(&raw)
            .map(Self)
            .map_err(|e| ValidationError::Format(format!("Invalid URL format: {}", e)))
    }

    /// Wraps a URL string without validation (tests point this at a mock server).
    #[cfg(test)]
    pub(crate) fn new_unchecked(raw: &str) -> Self {
        Self(url::Url::parse(raw).expect("test URL must parse"))
    }

    /// Returns the URL as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Joins an API path under `/api2/json/`.
    #[must_use]
    pub fn api_path(&self, path: &str) -> String {
        format!(
            "{}/api2/json/{}",
            self.0.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Returns the web UI link for a resource fragment (`node/pve1`, `qemu/100`).
    #[must_use]
    pub fn console_url(&self, fragment: &str) -> String {
        format!("{}#v1:0:={}", self.0.as_str(), fragment)
    }
}

/// Validates a base URL: http(s) scheme, a host, no path beyond `/`.
pub(crate) fn validate_url(raw: &str) -> Result<(), ValidationError> {
    if raw.is_empty() {
        return Err(ValidationError::Field {
            field: "url".to_string(),
            message: "URL cannot be empty".to_string(),
        });
    }
    if raw.len() > 2083 {
        return Err(ValidationError::Format(
            "URL exceeds maximum length of 2083 characters".to_string(),
        ));
    }
    let parsed = url::Url::parse(raw)
        .map_err(|e| ValidationError::Format(format!("Invalid URL format: {}", e)))?;
    if !matches!(parsed.scheme(), "https" | "http") {
        return Err(ValidationError::ConstraintViolation(
            "Invalid scheme. Must be one of: https, http".to_string(),
        ));
    }
    if parsed.host_str().is_none() {
        return Err(ValidationError::Field {
            field: "url".to_string(),
            message: "URL must contain a host".to_string(),
        });
    }
    Ok(())
}
