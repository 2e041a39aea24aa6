//! In-memory credential wrapper.

use std::fmt;

use secrecy::{ExposeSecret, SecretString};

use crate::{Error, Result};

/// Opaque API credential.
///
/// The value lives only in process memory: the type implements neither
/// `Serialize` nor `Display`, and its `Debug` output is redacted.
pub struct Credential {
    secret: SecretString,
}

impl Credential {
    /// Wraps a secret value exactly as given.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyCredential`] if the value is empty or only
    /// whitespace.
    pub fn new(value: impl AsRef<str>) -> Result<Self> {
        let value = value.as_ref();
        if value.trim().is_empty() {
            return Err(Error::EmptyCredential);
        }
        Ok(Self {
            secret: SecretString::new(value.to_owned()),
        })
    }

    /// Like [`Credential::new`] but maps blank input to `None`.
    #[must_use]
    pub fn non_empty(value: impl AsRef<str>) -> Option<Self> {
        Self::new(value).ok()
    }

    /// Exposes the secret value for use in an outgoing request.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.secret.expose_secret()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential([REDACTED])")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_value_verbatim() {
        let credential = Credential::new(" sk-test ").unwrap();
        assert_eq!(credential.expose(), " sk-test ");
    }

    #[test]
    fn rejects_blank_values() {
        assert!(matches!(Credential::new("   "), Err(Error::EmptyCredential)));
        assert!(Credential::non_empty("").is_none());
    }

    #[test]
    fn debug_output_is_redacted() {
        let credential = Credential::new("super-secret").unwrap();
        let rendered = format!("{credential:?}");
        assert!(!rendered.contains("super-secret"));
    }
}
