//! # Provisioning Errors
//!
//! Errors carry a typed [`Err`] kind wrapped in `anyhow` context so callers
//! can tell what went wrong without parsing messages, while the message chain
//! keeps the strategy and key involved.

use std::fmt::Display;

use thiserror::Error;

/// Log an error and return early with it.
///
/// # Example
/// ```
/// use did_provision::error::Err;
/// use did_provision::{tracerr, Result};
///
/// fn with_msg() -> Result<()> {
///     tracerr!(Err::InvalidKeyId, "key id has no fragment: {}", "did:example:123")
/// }
///
/// fn no_msg() -> Result<()> {
///     tracerr!(Err::InvalidKeyId)
/// }
/// ```
#[macro_export]
macro_rules! tracerr {
    // with context
    ($code:expr, $($msg:tt)*) => {
        {
        use $crate::error::Context as _;
        tracing::error!($($msg)*);
        return Err($code).context(format!($($msg)*));
        }
    };
    // no context
    ($code:expr) => {
        {
        tracing::error!("{}", $code);
        return Err($code.into());
        }
    }
}

/// Public error type for DID provisioning.
#[derive(Error, Debug)]
#[error(transparent)]
pub struct Error(#[from] anyhow::Error);

impl Error {
    /// Render the error for a client-facing response.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        let code = self.kind().map_or_else(|| self.0.root_cause().to_string(), |k| k.to_string());
        serde_json::json!({
            "error": code,
            "error_description": self.to_string(),
        })
    }

    /// Returns true if the error is of kind `err`.
    #[must_use]
    pub fn is(&self, err: Err) -> bool {
        self.kind() == Some(err)
    }

    /// The typed kind of the error, if one was attached where it originated.
    #[must_use]
    pub fn kind(&self) -> Option<Err> {
        self.0.downcast_ref::<Err>().copied()
    }

    /// Whether the error was caused by the request rather than a backend.
    #[must_use]
    pub fn is_bad_input(&self) -> bool {
        self.kind().is_some_and(Err::is_bad_input)
    }
}

/// Typed error kinds.
#[derive(Clone, Copy, Error, Debug, PartialEq, Eq)]
pub enum Err {
    /// The key manager failed to generate a key pair.
    #[error("key_generation_error")]
    KeyGeneration,

    /// The key manager failed to export a public key, or the exported bytes
    /// are not a valid key for the algorithm.
    #[error("key_export_error")]
    KeyExport,

    /// The key manager failed to import a private key.
    #[error("key_import_error")]
    KeyImport,

    /// Private key import was requested for an algorithm other than Ed25519.
    #[error("unsupported_import_algorithm")]
    UnsupportedImportAlgorithm,

    /// The requested key algorithm and signature suite pair is not one of the
    /// provisioned combinations.
    #[error("unsupported_key_combination")]
    UnsupportedKeyCombination,

    /// An existing DID could not be resolved.
    #[error("resolution_error")]
    Resolution,

    /// The DID registry failed to create a DID document.
    #[error("document_creation_error")]
    DocumentCreation,

    /// The universal registrar call failed or returned malformed data.
    #[error("registrar_creation_error")]
    RegistrarCreation,

    /// The registrar response does not contain the key selected for signing.
    #[error("selected_key_not_found")]
    SelectedKeyNotFound,

    /// The registrar response has no key with the requested purpose.
    #[error("no_key_for_purpose")]
    NoKeyForPurpose,

    /// Private key material is malformed.
    #[error("invalid_key")]
    InvalidKey,

    /// A key identifier is missing or is not a DID URL with a fragment.
    #[error("invalid_key_id")]
    InvalidKeyId,

    /// Configuration could not be applied.
    #[error("invalid_config")]
    InvalidConfig,
}

impl Err {
    /// Whether the kind describes a problem with the caller's request.
    #[must_use]
    pub const fn is_bad_input(self) -> bool {
        matches!(
            self,
            Self::UnsupportedImportAlgorithm
                | Self::UnsupportedKeyCombination
                | Self::InvalidKey
                | Self::InvalidKeyId
        )
    }
}

/// Context is used to decorate errors with useful context information.
pub trait Context<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    /// Adds context to the error.
    ///
    /// # Errors
    ///
    /// * Original error with context appended.
    fn context<C>(self, context: C) -> Result<T, Error>
    where
        C: Display + Send + Sync + 'static;
}

impl<T, E> Context<T, E> for core::result::Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn context<C>(self, context: C) -> Result<T, Error>
    where
        C: Display + Send + Sync + 'static,
    {
        match self {
            Ok(ok) => Ok(ok),
            Err(e) => Err(Error(anyhow::Error::from(e).context(context))),
        }
    }
}

/// Attach an error kind to a collaborator failure.
pub trait Classify<T> {
    /// Tag the error with `kind`, add `context` and log it.
    ///
    /// # Errors
    ///
    /// * Original error tagged with the kind and context.
    fn kind_context<C>(self, kind: Err, context: C) -> Result<T, Error>
    where
        C: Display + Send + Sync + 'static;
}

impl<T> Classify<T> for anyhow::Result<T> {
    fn kind_context<C>(self, kind: Err, context: C) -> Result<T, Error>
    where
        C: Display + Send + Sync + 'static,
    {
        self.map_err(|e| {
            tracing::error!("{context}: {e:#}");
            Error(e.context(kind).context(context))
        })
    }
}

impl From<Err> for Error {
    fn from(error: Err) -> Self {
        Self(error.into())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self(err.into())
    }
}

#[cfg(test)]
mod test {
    use anyhow::anyhow;
    use serde_json::json;

    use super::*;
    use crate::Result;

    #[test]
    fn base_err() {
        let err: Error = Err::UnsupportedKeyCombination.into();

        assert_eq!(
            err.to_json(),
            json!({
                "error": "unsupported_key_combination",
                "error_description": "unsupported_key_combination"
            })
        );
        assert!(err.is_bad_input());
    }

    #[test]
    fn context_err() {
        let res: Result<()> = Err(Err::InvalidKeyId).context("key id has no fragment");
        let err = res.expect_err("expected error");

        assert!(err.is(Err::InvalidKeyId));
        assert_eq!(
            err.to_json(),
            json!({"error": "invalid_key_id", "error_description": "key id has no fragment"})
        );
    }

    #[test]
    fn classified_backend_err() {
        let res: anyhow::Result<()> = Err(anyhow!("vault unavailable"));
        let err = res.kind_context(Err::KeyGeneration, "create key").expect_err("expected error");

        assert_eq!(err.kind(), Some(Err::KeyGeneration));
        assert!(!err.is_bad_input());
        assert_eq!(err.to_string(), "create key");
        assert_eq!(format!("{err:#}"), "create key: key_generation_error: vault unavailable");
    }

    #[test]
    fn test_macro() {
        let Err(e) = run_macro() else {
            panic!("expected error");
        };

        assert_eq!(e.to_string(), "test me");
        assert!(e.is(Err::NoKeyForPurpose));
    }

    fn run_macro() -> Result<()> {
        tracerr!(Err::NoKeyForPurpose, "test {}", "me")
    }
}
