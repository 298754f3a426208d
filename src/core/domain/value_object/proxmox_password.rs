use crate::core::domain::error::ValidationError;
use zxcvbn::zxcvbn;

/// A Proxmox password or API token secret (only held in memory).
#[derive(Clone)]
pub struct ProxmoxPassword(String);

impl ProxmoxPassword {
    /// Creates a new password without validation.
    pub(crate) fn new_unchecked(password: String) -> Self {
        Self(password)
    }

    /// Returns the password as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for ProxmoxPassword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ProxmoxPassword(**REDACTED**)")
    }
}

/// Validates a password. Strength is only enforced when a minimum score is set.
pub(crate) fn validate_password(
    password: &str,
    min_score: Option<zxcvbn::Score>,
) -> Result<(), ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::Field {
            field: "password".to_string(),
            message: "Password cannot be empty".to_string(),
        });
    }
    if password.len() > 128 {
        return Err(ValidationError::Format(
            "Password cannot exceed 128 characters".to_string(),
        ));
    }
    if let Some(min_score) = min_score {
        let entropy = zxcvbn(password, &[]);
        if entropy.score() < min_score {
            return Err(ValidationError::ConstraintViolation(
                "Password is too weak (increase complexity)".to_string(),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_password() {
        assert!(validate_password("secret", None).is_ok());
        assert!(validate_password("", None).is_err());
        assert!(validate_password(&"x".repeat(129), None).is_err());
    }

    #[test]
    fn test_weak_password_rejected_with_min_score() {
        assert!(validate_password("password", Some(zxcvbn::Score::Three)).is_err());
        assert!(validate_password("correct-Horse-battery-Staple-42", Some(zxcvbn::Score::Three)).is_ok());
    }

    #[test]
    fn test_debug_is_redacted() {
        let password = ProxmoxPassword::new_unchecked("hunter22".to_string());
        assert!(!format!("{:?}", password).contains("hunter22"));
        assert_eq!(password.as_str(), "hunter22");
    }
}
