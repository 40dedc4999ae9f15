//! Password strength rules applied at registration.

use crate::domain::error::PapertradeError;
use crate::ports::config_port::ConfigPort;

/// Minimum requirements a new password must meet.
///
/// The defaults ask for eight characters mixing lowercase, uppercase, a
/// digit and a symbol. Both the length and the accepted symbol set can be
/// overridden from the `[auth]` config section.
#[derive(Debug, Clone, PartialEq)]
pub struct PasswordPolicy {
    pub min_length: usize,
    pub symbols: String,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        PasswordPolicy {
            min_length: 8,
            symbols: "#?!@$%^&*-".to_string(),
        }
    }
}

impl PasswordPolicy {
    /// Policy from the `[auth]` config section, defaults for absent keys.
    pub fn from_config(config: &dyn ConfigPort) -> Self {
        let default = PasswordPolicy::default();
        PasswordPolicy {
            min_length: config
                .get_int("auth", "password_min_length", default.min_length as i64)
                .max(1) as usize,
            symbols: config
                .get_string("auth", "password_symbols")
                .unwrap_or(default.symbols),
        }
    }

    /// Check a candidate password, reporting the first unmet requirement.
    pub fn validate(&self, password: &str) -> Result<(), PapertradeError> {
        if password.chars().count() < self.min_length {
            return Err(self.weak(format!(
                "must be at least {} characters",
                self.min_length
            )));
        }
        if !password.chars().any(|c| c.is_ascii_lowercase()) {
            return Err(self.weak("must contain a lowercase letter"));
        }
        if !password.chars().any(|c| c.is_ascii_uppercase()) {
            return Err(self.weak("must contain an uppercase letter"));
        }
        if !password.chars().any(|c| c.is_ascii_digit()) {
            return Err(self.weak("must contain a digit"));
        }
        if !password.chars().any(|c| self.symbols.contains(c)) {
            return Err(self.weak(format!("must contain one of {}", self.symbols)));
        }
        Ok(())
    }

    fn weak(&self, reason: impl Into<String>) -> PapertradeError {
        PapertradeError::WeakPassword {
            reason: reason.into(),
        }
    }
}
