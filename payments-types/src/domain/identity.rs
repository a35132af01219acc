//! Identity and payment reference value objects.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Longest reference accepted from callers.
pub const MAX_REFERENCE_LEN: usize = 100;

/// End-user key for wallet and transaction lookup (an e-mail address).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Identity(String);

impl Identity {
    /// Parses an e-mail shaped identity.
    pub fn parse(value: &str) -> Result<Self, DomainError> {
        let value = value.trim();
        if value.is_empty() {
            return Err(DomainError::ValidationError("Email is required".into()));
        }

        let valid = match value.split_once('@') {
            Some((local, domain)) => {
                !local.is_empty()
                    && !domain.is_empty()
                    && !domain.contains('@')
                    && !value.chars().any(char::is_whitespace)
            }
            None => false,
        };
        if !valid {
            return Err(DomainError::ValidationError(format!(
                "Invalid email address: {}",
                value
            )));
        }

        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Identity {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Identity::parse(&value)
    }
}

impl From<Identity> for String {
    fn from(identity: Identity) -> Self {
        identity.0
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unique string identifying one payment or transfer attempt.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Reference(String);

impl Reference {
    /// Parses a caller-supplied reference.
    pub fn parse(value: &str) -> Result<Self, DomainError> {
        let value = value.trim();
        if value.is_empty() {
            return Err(DomainError::ValidationError(
                "Reference cannot be empty".into(),
            ));
        }
        if value.len() > MAX_REFERENCE_LEN {
            return Err(DomainError::ValidationError(format!(
                "Reference cannot be longer than {} characters",
                MAX_REFERENCE_LEN
            )));
        }
        if !value.chars().all(is_reference_char) || value.chars().all(|c| c == '.') {
            return Err(DomainError::ValidationError(
                "Reference may only contain letters, digits, '-', '_', '.' and '='".into(),
            ));
        }
        Ok(Self(value.to_string()))
    }

    /// Generates a fresh reference such as `DEP_6f1c...`.
    pub fn generate(prefix: &str) -> Self {
        Self(format!("{}_{}", prefix, Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn is_reference_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '=')
}

impl TryFrom<String> for Reference {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Reference::parse(&value)
    }
}

impl From<Reference> for String {
    fn from(reference: Reference) -> Self {
        reference.0
    }
}

impl std::fmt::Display for Reference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_is_trimmed() {
        let identity = Identity::parse("  ada@example.com ").unwrap();
        assert_eq!(identity.as_str(), "ada@example.com");
    }

    #[test]
    fn test_identity_requires_email_shape() {
        for bad in ["", "   ", "ada", "@example.com", "ada@", "ada@@x", "a da@x.com"] {
            assert!(
                matches!(Identity::parse(bad), Err(DomainError::ValidationError(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_generated_reference_has_prefix() {
        let reference = Reference::generate("DEP");
        assert!(reference.as_str().starts_with("DEP_"));
        assert_ne!(reference, Reference::generate("DEP"));
    }

    #[test]
    fn test_reference_validation() {
        assert!(Reference::parse("ref-123").is_ok());
        assert!(Reference::parse("").is_err());
        assert!(Reference::parse("has space").is_err());
        assert!(Reference::parse(&"x".repeat(MAX_REFERENCE_LEN + 1)).is_err());
    }

    #[test]
    fn test_reference_rejects_path_characters() {
        assert!(Reference::parse("T.1=a_b-C").is_ok());
        for bad in ["../../bank?", "a/b", "ref%2Fx", "ref#1", "ref?x=1", "réf", ".", ".."] {
            assert!(
                matches!(Reference::parse(bad), Err(DomainError::ValidationError(_))),
                "{bad:?} should be rejected"
            );
        }
    }
}
