//! Provider credential.
//!
//! # Security Note
//!
//! The credential is only ever handed to the image provider as its
//! authorization parameter. It must never be logged; `Debug` is redacted.

use std::fmt;

use crate::error::{Result, RoomcraftError};

/// Opaque bearer token for the image-generation provider.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Trims the value and rejects it when nothing is left.
    pub fn new(value: impl AsRef<str>) -> Result<Self> {
        let trimmed = value.as_ref().trim();
        if trimmed.is_empty() {
            return Err(RoomcraftError::EmptyCredential);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_is_trimmed() {
        let credential = Credential::new("  abc123 \n").unwrap();
        assert_eq!(credential.expose(), "abc123");
    }

    #[test]
    fn test_blank_credential_rejected() {
        assert!(matches!(Credential::new("   "), Err(RoomcraftError::EmptyCredential)));
        assert!(matches!(Credential::new(""), Err(RoomcraftError::EmptyCredential)));
    }

    #[test]
    fn test_debug_is_redacted() {
        let credential = Credential::new("secret-key").unwrap();
        assert!(!format!("{credential:?}").contains("secret-key"));
    }
}
