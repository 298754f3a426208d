use crate::core::domain::error::ValidationError;

/// The default authentication realm.
pub const DEFAULT_REALM: &str = "pam";

/// An authentication realm (`pam`, `pve` or a configured LDAP/AD realm id).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxmoxRealm(String);

impl ProxmoxRealm {
    /// Creates a new realm without validation.
    pub(crate) fn new_unchecked(realm: String) -> Self {
        Self(realm)
    }

    /// Returns the realm as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ProxmoxRealm {
    fn default() -> Self {
        Self(DEFAULT_REALM.to_string())
    }
}

/// Validates a realm identifier.
pub(crate) fn validate_realm(realm: &str) -> Result<(), ValidationError> {
    if realm.is_empty() {
        return Err(ValidationError::Field {
            field: "realm".to_string(),
            message: "Realm cannot be empty".to_string(),
        });
    }
    if realm.len() < 2 || realm.len() > 32 {
        return Err(ValidationError::Format(
            "Realm length must be between 2 and 32 characters".to_string(),
        ));
    }
    if !realm
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
    {
        return Err(ValidationError::Format(
            "Realm contains invalid characters".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_realm() {
        for realm in ["pam", "pve", "corp-ad", "ldap_1"] {
            assert!(validate_realm(realm).is_ok(), "{} should be valid", realm);
        }
        for realm in ["", "p", "PAM", "my realm", &"a".repeat(33)] {
            assert!(validate_realm(realm).is_err(), "{} should be invalid", realm);
        }
    }
}
