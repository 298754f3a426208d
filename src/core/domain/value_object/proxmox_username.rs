use crate::core::domain::error::ValidationError;

/// A validated Proxmox username, optionally carrying its realm (`user@realm`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxmoxUsername(String);

impl ProxmoxUsername {
    /// Creates a new username without validation.
    pub(crate) fn new_unchecked(username: String) -> Self {
        Self(username)
    }

    /// Returns the username as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the user id sent to the server.
    ///
    /// A username that already names its realm is used verbatim, otherwise the
    /// configured realm is appended.
    #[must_use]
    pub fn user_id(&self, realm: &str) -> String {
        if self.0.contains('@') {
            self.0.clone()
        } else {
            format!("{}@{}", self.0, realm)
        }
    }
}

/// Validates a username.
pub(crate) fn validate_username(
    username: &str,
    block_reserved: bool,
) -> Result<(), ValidationError> {
    if username.is_empty() {
        return Err(ValidationError::Field {
            field: "username".to_string(),
            message: "Username cannot be empty".to_string(),
        });
    }
    if username.len() < 3 || username.len() > 64 {
        return Err(ValidationError::Format(format!(
            "Username length must be between 3 and 64 characters (got {})",
            username.len()
        )));
    }
    let allowed =
        |c: char| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' || c == '@';
    if !username.chars().all(allowed) {
        return Err(ValidationError::Format(
            "Username contains invalid characters. Allowed: alphanumeric, -, _, ., @".to_string(),
        ));
    }
    if block_reserved {
        let bare = username.split('@').next().unwrap_or(username);
        if ["root", "admin", "administrator", "nobody", "guest"].contains(&bare) {
            return Err(ValidationError::ConstraintViolation(
                "Username is reserved".to_string(),
            ));
        }
    }
    Ok(())
}
