use thiserror::Error;

/// The main error type for Proxmox VE monitoring operations.
///
/// Every failure that can surface from the API access layer, the resource
/// poller or a coordinator cycle is one of these variants. Callers that need
/// to decide between "reauthenticate", "retry next cycle" and "recover
/// locally" use [`ProxmoxError::failure_kind`].
#[derive(Error, Debug)]
pub enum ProxmoxError {
    /// The endpoint could not be reached (refused, reset, DNS, ...)
    ///
    /// # Fields
    /// * `0` - A description of what went wrong during the connection attempt
    #[error("Connection error: {0}")]
    Connection(String),

    /// The request did not complete within the configured timeout
    #[error("Timeout: {0}")]
    Timeout(String),

    /// The TLS handshake failed (usually an untrusted or self-signed certificate)
    #[error("TLS error: {0}")]
    Tls(String),

    /// Represents authentication failures
    ///
    /// # Fields
    /// * `0` - A description of the authentication failure
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// The authenticated user lacks the ACL permission for a resource (HTTP 403)
    ///
    /// # Fields
    /// * `path` - The API path that was refused
    /// * `message` - The permission message returned by the server
    #[error("Permission denied on {path}: {message}")]
    Forbidden { path: String, message: String },

    /// Any other non-success HTTP status
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The response body could not be decoded
    #[error("Parse error: {0}")]
    Parse(String),

    /// A refresh cycle could not assemble a record
    #[error("Update failed: {0}")]
    UpdateFailed(String),

    /// Represents validation failures with detailed context
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

/// How the owner of a failed call should react.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The whole connection needs reconfiguration; every coordinator halts.
    Fatal,
    /// Keep stale data, mark unavailable, retry on the next cycle.
    Transient,
    /// A single resource is not readable by the configured user.
    Forbidden,
}

impl ProxmoxError {
    /// Classifies the error for the coordinator failure policy.
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            ProxmoxError::Authentication(_) => FailureKind::Fatal,
            ProxmoxError::Forbidden { .. } => FailureKind::Forbidden,
            ProxmoxError::Connection(_)
            | ProxmoxError::Timeout(_)
            | ProxmoxError::Tls(_)
            | ProxmoxError::Api { .. }
            | ProxmoxError::Parse(_)
            | ProxmoxError::UpdateFailed(_)
            | ProxmoxError::Validation(_) => FailureKind::Transient,
        }
    }

    /// Returns true when the error means the credentials are no longer accepted.
    pub fn is_fatal(&self) -> bool {
        self.failure_kind() == FailureKind::Fatal
    }
}

/// Specialized error type for validation failures.
///
/// This enum provides detailed context about why a validation
/// failed, including field-specific errors and format violations.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Represents a validation failure for a specific field
    ///
    /// # Fields
    /// * `field` - The name of the field that failed validation
    /// * `message` - A detailed message about why validation failed
    #[error("Field '{field}' validation failed: {message}")]
    Field { field: String, message: String },

    /// Represents format/syntax validation failures
    ///
    /// # Fields
    /// * `0` - Description of the format violation
    #[error("Format error: {0}")]
    Format(String),

    /// Represents violations of domain constraints
    ///
    /// # Fields
    /// * `0` - Description of the constraint violation
    #[error("Domain constraint violation: {0}")]
    ConstraintViolation(String),
}

/// Type alias for Results that may fail with a ProxmoxError
pub type ProxmoxResult<T> = Result<T, ProxmoxError>;
