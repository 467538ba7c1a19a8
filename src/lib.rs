//! # DID Provisioning
//!
//! Provision the DID a credential issuer signs with. Given the key algorithm
//! and signature suite an issuer wants to use, the [`Provisioner`] either
//! creates a new DID (with a universal registrar or a local DID registry) or
//! adopts an existing one, and returns the DID together with the DID URL of
//! the key to sign with.
//!
//! Key storage, DID method registries and the universal registrar are
//! external collaborators, consumed through the traits in [`provider`].
//! [`HttpRegistrar`] is an HTTP implementation of the registrar collaborator.

pub mod client;
pub mod config;
pub mod create;
pub mod document;
pub mod domain;
pub mod error;
pub mod key;
pub mod provider;
pub mod registrar;
pub mod verification;

pub use self::client::HttpRegistrar;
pub use self::config::{ClientConfig, Config};
pub use self::create::{CreateDidRequest, CreateDidResult, Provisioner, Strategy};
pub use self::document::Document;
pub use self::key::KeyAlgorithm;
pub use self::provider::{CreateOptions, DidRegistry, KeyManager, UniversalRegistrar};
pub use self::registrar::{RegisterRequest, RegisteredKey, Registration, RegistrarDescriptor};
pub use self::verification::{MethodType, SignatureSuite, SuiteTable};

/// Result type for DID provisioning.
pub type Result<T, E = error::Error> = core::result::Result<T, E>;
