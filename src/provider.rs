//! # Provider
//!
//! Collaborators the provisioning engine depends on. Implementations are
//! shared across concurrent provisioning calls so must be `Send + Sync`.

use std::future::Future;

use anyhow::Result;

use crate::document::Document;
use crate::key::KeyAlgorithm;
use crate::registrar::{RegisterRequest, Registration};

/// Key generation and storage.
pub trait KeyManager: Send + Sync {
    /// Create a new key pair, returning its identifier. Identifiers must be
    /// usable as DID URL fragments.
    fn create(&self, algorithm: KeyAlgorithm) -> impl Future<Output = Result<String>> + Send;

    /// Export the public key for `key_id`: the raw 32 bytes for Ed25519, the
    /// SEC1 encoded point for P-256.
    fn export_public_key(&self, key_id: &str) -> impl Future<Output = Result<Vec<u8>>> + Send;

    /// Store private key material under `key_id`, returning the identifier
    /// used.
    fn import_private_key(
        &self, secret: &[u8], algorithm: KeyAlgorithm, key_id: &str,
    ) -> impl Future<Output = Result<String>> + Send;
}

/// Options for creating a DID with a [`DidRegistry`].
#[derive(Clone, Debug, Default)]
pub struct CreateOptions {
    /// Ed25519 public key authorizing recovery of the DID.
    pub recovery_key: Vec<u8>,

    /// Ed25519 public key authorizing updates to the DID.
    pub update_key: Vec<u8>,
}

/// Local DID method registry.
pub trait DidRegistry: Send + Sync {
    /// Resolve a DID to its document.
    fn resolve(&self, did: &str) -> impl Future<Output = Result<Document>> + Send;

    /// Register `document` with the DID method `method`, returning the
    /// registered document. Its `id` is the new DID.
    fn create(
        &self, method: &str, document: Document, options: CreateOptions,
    ) -> impl Future<Output = Result<Document>> + Send;
}

/// Universal registrar client.
pub trait UniversalRegistrar: Send + Sync {
    /// Ask the registrar driver at `driver_url` to create a DID.
    fn create_did(
        &self, driver_url: &str, request: &RegisterRequest,
    ) -> impl Future<Output = Result<Registration>> + Send;
}
