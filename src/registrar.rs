//! # Universal Registrar
//!
//! Delegates DID creation to a universal registrar driver.
//!
//! Registrar drivers differ in how they return keys. Some echo back the keys
//! submitted, others generate their own and hand back the private material.
//! [`Vendor`] captures those differences so the signing key can be located
//! (and imported when needed) in a uniform way.
//!
//! See <https://identity.foundation/did-registration/>

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Classify, Err};
use crate::key::{create_key, decode_base58, import_private_key, KeyAlgorithm};
use crate::provider::{KeyManager, UniversalRegistrar};
use crate::verification::{KeySet, PublicKey};
use crate::{tracerr, Result};

/// Where to register a DID and the vendor options to pass along.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct RegistrarDescriptor {
    /// Registrar driver endpoint.
    #[serde(rename = "driverURL", default)]
    pub driver_url: String,

    /// Options passed to the driver unchanged.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub options: HashMap<String, Value>,
}

/// Register request sent to a registrar driver.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    /// Vendor options.
    #[serde(default)]
    pub options: HashMap<String, Value>,

    /// Keys to register with the DID.
    pub did_document: RegisterDocument,
}

/// Document content submitted with a [`RegisterRequest`].
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RegisterDocument {
    /// Signing and control keys.
    #[serde(default)]
    pub public_key: Vec<PublicKey>,
}

impl RegisterRequest {
    /// Create an empty request.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a public key.
    #[must_use]
    pub fn public_key(mut self, key: PublicKey) -> Self {
        self.did_document.public_key.push(key);
        self
    }

    /// Add vendor options. Later values replace earlier ones with the same
    /// name.
    #[must_use]
    pub fn options(mut self, options: HashMap<String, Value>) -> Self {
        self.options.extend(options);
        self
    }
}

/// The registrar's answer to a [`RegisterRequest`].
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct Registration {
    /// The DID created.
    pub identifier: String,

    /// Keys registered for the DID.
    pub keys: Vec<RegisteredKey>,
}

/// A key registered for a DID by the registrar.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RegisteredKey {
    /// Key identifier, usually a DID URL.
    pub id: String,

    /// Verification relationships the key is registered for.
    #[serde(default)]
    pub purposes: Vec<String>,

    /// Base58 private key, for registrars that generate keys.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_key_base58: Option<String>,
}

/// Registrar response shapes, keyed by DID method.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Vendor {
    /// `did:trustbloc` registers the submitted keys.
    Trustbloc,

    /// `did:v1` generates its own keys, labelled with purposes.
    V1,

    /// Anything else. The first returned key is used.
    Generic,
}

/// The key to sign with, as found in a [`Registration`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Selection<'a> {
    /// The signing key.
    pub key: &'a RegisteredKey,

    /// The key's private material must be imported into the key manager.
    pub import: bool,
}

impl Vendor {
    /// Determine the vendor from the DID the registrar created.
    #[must_use]
    pub fn from_identifier(identifier: &str) -> Self {
        let method = identifier.strip_prefix("did:").and_then(|rest| rest.split(':').next());
        match method {
            Some("trustbloc") => Self::Trustbloc,
            Some("v1") => Self::V1,
            _ => Self::Generic,
        }
    }

    /// Find the signing key among the keys returned by the registrar.
    ///
    /// # Errors
    ///
    /// * `Err::SelectedKeyNotFound` if the `Trustbloc` response does not
    ///   contain `selected`.
    /// * `Err::NoKeyForPurpose` if no `V1` key has `purpose`.
    /// * `Err::RegistrarCreation` if a `Generic` response has no keys.
    pub fn normalize<'a>(
        self, keys: &'a [RegisteredKey], selected: &str, purpose: &str,
    ) -> Result<Selection<'a>> {
        match self {
            Self::Trustbloc => {
                let fragment = format!("#{selected}");
                let Some(key) = keys.iter().find(|k| k.id.contains(&fragment)) else {
                    tracerr!(Err::SelectedKeyNotFound, "selected key not found {selected}");
                };
                Ok(Selection { key, import: false })
            }
            Self::V1 => {
                let Some(key) = keys.iter().find(|k| k.purposes.iter().any(|p| p == purpose))
                else {
                    tracerr!(
                        Err::NoKeyForPurpose,
                        "did:v1 - not able to find key with purpose {purpose}"
                    );
                };
                Ok(Selection { key, import: true })
            }
            Self::Generic => {
                let Some(key) = keys.first() else {
                    tracerr!(Err::RegistrarCreation, "registrar returned no keys");
                };
                Ok(Selection { key, import: true })
            }
        }
    }
}

/// Create a DID with a universal registrar, returning the DID and the ID of
/// the key to sign with.
///
/// # Errors
///
/// * Key manager errors while generating keys or importing a returned key.
/// * `Err::RegistrarCreation` if the registrar fails or its response is
///   incomplete.
/// * `Err::SelectedKeyNotFound` or `Err::NoKeyForPurpose` if the signing key
///   cannot be found in the response.
pub async fn register(
    keys: &impl KeyManager, registrar: &impl UniversalRegistrar, key_set: &KeySet,
    selected: &str, purpose: &str, descriptor: &RegistrarDescriptor,
) -> Result<(String, String)> {
    let (_, recovery_key) = create_key(keys, KeyAlgorithm::Ed25519).await?;
    let (_, update_key) = create_key(keys, KeyAlgorithm::Ed25519).await?;

    let mut request = RegisterRequest::new();
    for pk in &key_set.public_keys {
        request = request.public_key(pk.clone());
    }
    let request = request
        .public_key(PublicKey::recovery(&recovery_key))
        .public_key(PublicKey::update(&update_key))
        .options(descriptor.options.clone());

    let registration = registrar.create_did(&descriptor.driver_url, &request).await.kind_context(
        Err::RegistrarCreation,
        format!("failed to create did doc from uni-registrar {}", descriptor.driver_url),
    )?;
    if registration.identifier.is_empty() {
        tracerr!(Err::RegistrarCreation, "uni-registrar returned no identifier");
    }

    let vendor = Vendor::from_identifier(&registration.identifier);
    tracing::debug!(identifier = %registration.identifier, ?vendor, "registered did");

    let selection = vendor.normalize(&registration.keys, selected, purpose)?;
    if selection.import {
        let Some(encoded) = &selection.key.private_key_base58 else {
            tracerr!(
                Err::RegistrarCreation,
                "uni-registrar returned no private key for {}",
                selection.key.id
            );
        };
        let secret = decode_base58(encoded)?;
        import_private_key(keys, &selection.key.id, KeyAlgorithm::Ed25519, &secret).await?;
    }

    Ok((registration.identifier.clone(), selection.key.id.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(id: &str, purposes: &[&str]) -> RegisteredKey {
        RegisteredKey {
            id: id.to_string(),
            purposes: purposes.iter().map(ToString::to_string).collect(),
            private_key_base58: Some("2g".to_string()),
        }
    }

    #[test]
    fn vendor_from_identifier() {
        assert_eq!(Vendor::from_identifier("did:trustbloc:testnet:EiA"), Vendor::Trustbloc);
        assert_eq!(Vendor::from_identifier("did:v1:test:nym:z6Mk"), Vendor::V1);
        assert_eq!(Vendor::from_identifier("did:key:z6Mk"), Vendor::Generic);
        assert_eq!(Vendor::from_identifier("did:trustblocx:a:b"), Vendor::Generic);
        assert_eq!(Vendor::from_identifier("trustbloc"), Vendor::Generic);
    }

    #[test]
    fn trustbloc_selected_key() {
        let keys = [key("did:trustbloc:a:b#key-1", &[]), key("did:trustbloc:a:b#key-2", &[])];

        let selection = Vendor::Trustbloc.normalize(&keys, "key-2", "").expect("should find key");
        assert_eq!(selection.key.id, "did:trustbloc:a:b#key-2");
        assert!(!selection.import);

        let err = Vendor::Trustbloc.normalize(&keys, "key-3", "").expect_err("should fail");
        assert!(err.is(Err::SelectedKeyNotFound));
    }

    #[test]
    fn v1_purpose() {
        let keys = [
            key("did:v1:test:nym:z#auth", &["authentication"]),
            key("did:v1:test:nym:z#assert", &["assertionMethod", "capabilityInvocation"]),
        ];

        let selection =
            Vendor::V1.normalize(&keys, "ignored", "assertionMethod").expect("should find key");
        assert_eq!(selection.key.id, "did:v1:test:nym:z#assert");
        assert!(selection.import);

        let err = Vendor::V1.normalize(&keys, "ignored", "keyAgreement").expect_err("should fail");
        assert!(err.is(Err::NoKeyForPurpose));
    }

    #[test]
    fn generic_first_key() {
        let keys = [key("did:sov:abc#key-1", &[]), key("did:sov:abc#key-2", &[])];

        let selection = Vendor::Generic.normalize(&keys, "key-2", "").expect("should find key");
        assert_eq!(selection.key.id, "did:sov:abc#key-1");
        assert!(selection.import);

        let err = Vendor::Generic.normalize(&[], "key-2", "").expect_err("should fail");
        assert!(err.is(Err::RegistrarCreation));
    }

    #[test]
    fn request_options() {
        let options = HashMap::from([("ledger".to_string(), Value::from("testnet"))]);
        let request = RegisterRequest::new().options(options).public_key(PublicKey::update(&[1]));

        let json = serde_json::to_value(&request).expect("should serialize");
        assert_eq!(json["options"]["ledger"], "testnet");
        assert_eq!(json["didDocument"]["publicKey"][0]["update"], true);
    }
}
