//! # Create
//!
//! Provision a DID for a credential issuer. A request is handled by exactly
//! one [`Strategy`]:
//!
//! 1. a universal registrar, when a registrar driver URL is given;
//! 2. the local DID registry, when no existing DID is given;
//! 3. otherwise, the existing DID is adopted.
//!
//! The resulting DID is then mapped to its domain form (see
//! [`domain_did`](crate::domain::domain_did)).

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::client::HttpRegistrar;
use crate::config::Config;
use crate::domain::domain_did;
use crate::error::{Classify, Err};
use crate::key::{create_key, decode_base58, import_private_key, KeyAlgorithm};
use crate::provider::{CreateOptions, DidRegistry, KeyManager, UniversalRegistrar};
use crate::registrar::{register, RegistrarDescriptor};
use crate::verification::{select_key, KeySet, KeySlot, SignatureSuite};
use crate::{tracerr, Result};

/// Request to provision a DID.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CreateDidRequest {
    /// Algorithm of the signing key.
    #[serde(rename = "keyType")]
    pub key_algorithm: KeyAlgorithm,

    /// Signature suite credentials will be signed with.
    #[serde(rename = "signatureType")]
    pub signature_suite: SignatureSuite,

    /// Existing DID to adopt.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub did: Option<String>,

    /// Base58 private key for `key_id`, when adopting a DID.
    #[serde(rename = "didPrivateKey", skip_serializing_if = "Option::is_none")]
    pub private_key: Option<String>,

    /// Signing key of the adopted DID.
    #[serde(rename = "didKeyId", skip_serializing_if = "Option::is_none")]
    pub key_id: Option<String>,

    /// Verification relationship of the signing key, for registrars that
    /// label keys by purpose.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,

    /// Universal registrar to create the DID with.
    #[serde(rename = "uniRegistrar", skip_serializing_if = "Option::is_none")]
    pub registrar: Option<RegistrarDescriptor>,
}

impl CreateDidRequest {
    /// Request a new DID signing with `key_algorithm` keys and
    /// `signature_suite` proofs.
    #[must_use]
    pub const fn new(key_algorithm: KeyAlgorithm, signature_suite: SignatureSuite) -> Self {
        Self {
            key_algorithm,
            signature_suite,
            did: None,
            private_key: None,
            key_id: None,
            purpose: None,
            registrar: None,
        }
    }

    /// Adopt an existing DID.
    #[must_use]
    pub fn did(mut self, did: impl Into<String>) -> Self {
        self.did = Some(did.into());
        self
    }

    /// Signing key of the adopted DID.
    #[must_use]
    pub fn key_id(mut self, key_id: impl Into<String>) -> Self {
        self.key_id = Some(key_id.into());
        self
    }

    /// Base58 private key of the adopted DID's signing key.
    #[must_use]
    pub fn private_key(mut self, private_key: impl Into<String>) -> Self {
        self.private_key = Some(private_key.into());
        self
    }

    /// Verification relationship of the signing key.
    #[must_use]
    pub fn purpose(mut self, purpose: impl Into<String>) -> Self {
        self.purpose = Some(purpose.into());
        self
    }

    /// Create the DID with a universal registrar.
    #[must_use]
    pub fn registrar(mut self, registrar: RegistrarDescriptor) -> Self {
        self.registrar = Some(registrar);
        self
    }
}

/// A provisioned DID.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CreateDidResult {
    /// The DID.
    pub did: String,

    /// DID URL of the key to sign with.
    pub public_key_id: String,
}

/// How a [`CreateDidRequest`] is fulfilled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Strategy<'a> {
    /// Create the DID with a universal registrar.
    Registrar(&'a RegistrarDescriptor),

    /// Create the DID with the local DID registry.
    New,

    /// Use an existing DID.
    Adopt(&'a str),
}

impl<'a> Strategy<'a> {
    /// Choose the strategy for `request`.
    #[must_use]
    pub fn from_request(request: &'a CreateDidRequest) -> Self {
        if let Some(registrar) = &request.registrar {
            if !registrar.driver_url.is_empty() {
                return Self::Registrar(registrar);
            }
        }
        match request.did.as_deref() {
            None | Some("") => Self::New,
            Some(did) => Self::Adopt(did),
        }
    }
}

/// DID provisioning engine.
#[derive(Clone, Debug)]
pub struct Provisioner<K, R, U> {
    config: Config,
    keys: K,
    registry: R,
    registrar: U,
}

impl<K, R, U> Provisioner<K, R, U>
where
    K: KeyManager,
    R: DidRegistry,
    U: UniversalRegistrar,
{
    /// Create a provisioner using the given collaborators.
    pub const fn new(config: Config, keys: K, registry: R, registrar: U) -> Self {
        Self {
            config,
            keys,
            registry,
            registrar,
        }
    }

    /// The configuration in use.
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Provision a DID and select the key credentials should be signed with.
    ///
    /// # Errors
    ///
    /// * `Err::UnsupportedKeyCombination` if the key algorithm and signature
    ///   suite pair is not supported, whatever the strategy.
    /// * Any error from the strategy used. Errors are never recovered from by
    ///   falling back to another strategy.
    #[instrument(level = "debug", skip(self, request), fields(
        key_algorithm = %request.key_algorithm,
        signature_suite = %request.signature_suite,
    ))]
    pub async fn create_did(&self, request: &CreateDidRequest) -> Result<CreateDidResult> {
        let slot =
            select_key(request.key_algorithm, &request.signature_suite, &self.config.suites)?;

        let strategy = Strategy::from_request(request);
        tracing::debug!(?strategy, "creating did");

        let (did, public_key_id) = match strategy {
            Strategy::Registrar(descriptor) => {
                self.create_with_registrar(slot, request.purpose.as_deref(), descriptor).await?
            }
            Strategy::New => self.create_with_registry(slot).await?,
            Strategy::Adopt(did) => self.adopt(did, request).await?,
        };

        let (did, public_key_id) = domain_did(&did, &public_key_id, &self.config.domain);
        tracing::info!(%did, %public_key_id, "provisioned did");

        Ok(CreateDidResult { did, public_key_id })
    }

    async fn create_with_registrar(
        &self, slot: KeySlot, purpose: Option<&str>, descriptor: &RegistrarDescriptor,
    ) -> Result<(String, String)> {
        let key_set = KeySet::generate(&self.keys).await?;
        let selected = key_set.key_id(slot);

        register(
            &self.keys,
            &self.registrar,
            &key_set,
            selected,
            purpose.unwrap_or_default(),
            descriptor,
        )
        .await
    }

    async fn create_with_registry(&self, slot: KeySlot) -> Result<(String, String)> {
        let key_set = KeySet::generate(&self.keys).await?;
        let (_, recovery_key) = create_key(&self.keys, KeyAlgorithm::Ed25519).await?;
        let (_, update_key) = create_key(&self.keys, KeyAlgorithm::Ed25519).await?;

        let options = CreateOptions {
            recovery_key,
            update_key,
        };
        let doc = self
            .registry
            .create(&self.config.method, key_set.document.clone(), options)
            .await
            .kind_context(Err::DocumentCreation, "failed to create did doc")?;

        let public_key_id = format!("{}#{}", doc.id, key_set.key_id(slot));
        Ok((doc.id, public_key_id))
    }

    // The key ID is trusted as given: resolution only shows the DID exists.
    async fn adopt(&self, did: &str, request: &CreateDidRequest) -> Result<(String, String)> {
        let doc = self
            .registry
            .resolve(did)
            .await
            .kind_context(Err::Resolution, format!("failed to resolve did {did}"))?;

        let Some(key_id) = request.key_id.as_deref().filter(|k| !k.is_empty()) else {
            tracerr!(Err::InvalidKeyId, "no key id given for did {did}");
        };

        if let Some(private_key) = request.private_key.as_deref().filter(|k| !k.is_empty()) {
            let secret = decode_base58(private_key)?;
            import_private_key(&self.keys, key_id, KeyAlgorithm::Ed25519, &secret).await?;
        }

        Ok((doc.id, key_id.to_string()))
    }
}

impl<K, R> Provisioner<K, R, HttpRegistrar>
where
    K: KeyManager,
    R: DidRegistry,
{
    /// Create a provisioner that calls universal registrars over HTTP, with
    /// the client built from `config.registrar`.
    ///
    /// # Errors
    ///
    /// * `Err::InvalidConfig` if the HTTP client cannot be built.
    pub fn with_http_registrar(config: Config, keys: K, registry: R) -> Result<Self> {
        let registrar = HttpRegistrar::new(&config.registrar)?;
        Ok(Self::new(config, keys, registry, registrar))
    }
}
