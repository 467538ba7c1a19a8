//! # Verification Methods
//!
//! Every provisioned DID gets the same three signing keys: one per (key
//! algorithm, verification method type) combination the engine supports. The
//! key used for signing is then selected from the requested algorithm and
//! signature suite.

use std::collections::HashMap;
use std::fmt::{self, Display};

use base64ct::{Base64, Base64UrlUnpadded, Encoding};
use ed25519_dalek::VerifyingKey;
use serde::{Deserialize, Serialize};

use crate::document::Document;
use crate::error::Err;
use crate::key::{create_key, KeyAlgorithm};
use crate::provider::KeyManager;
use crate::{tracerr, Result};

/// Verification method types registered for the provisioned keys.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq, Hash)]
pub enum MethodType {
    /// Ed25519 public key, 2018 suite.
    Ed25519VerificationKey2018,

    /// JWK public key for JSON Web Signature 2020 proofs.
    JwsVerificationKey2020,
}

impl Default for MethodType {
    fn default() -> Self {
        Self::JwsVerificationKey2020
    }
}

impl Display for MethodType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Ed25519VerificationKey2018 => write!(f, "Ed25519VerificationKey2018"),
            Self::JwsVerificationKey2020 => write!(f, "JwsVerificationKey2020"),
        }
    }
}

/// Signature suites a credential issuer can ask for.
///
/// Suites are named by string on the wire. Names without a variant of their
/// own are kept as [`SignatureSuite::Other`] so they can still be looked up
/// in a [`SuiteTable`].
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq, Hash)]
#[serde(from = "String", into = "String")]
pub enum SignatureSuite {
    /// Ed25519 linked-data signature, 2018 suite.
    Ed25519Signature2018,

    /// Ed25519 linked-data signature, 2020 suite.
    Ed25519Signature2020,

    /// JSON Web Signature 2020.
    JsonWebSignature2020,

    /// BBS+ signature, 2020 suite.
    BbsBlsSignature2020,

    /// Any other suite.
    Other(String),
}

impl SignatureSuite {
    /// Suite name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Ed25519Signature2018 => "Ed25519Signature2018",
            Self::Ed25519Signature2020 => "Ed25519Signature2020",
            Self::JsonWebSignature2020 => "JsonWebSignature2020",
            Self::BbsBlsSignature2020 => "BbsBlsSignature2020",
            Self::Other(name) => name,
        }
    }
}

impl From<String> for SignatureSuite {
    fn from(name: String) -> Self {
        match name.as_str() {
            "Ed25519Signature2018" => Self::Ed25519Signature2018,
            "Ed25519Signature2020" => Self::Ed25519Signature2020,
            "JsonWebSignature2020" => Self::JsonWebSignature2020,
            "BbsBlsSignature2020" => Self::BbsBlsSignature2020,
            _ => Self::Other(name),
        }
    }
}

impl From<&str> for SignatureSuite {
    fn from(name: &str) -> Self {
        Self::from(name.to_string())
    }
}

impl From<SignatureSuite> for String {
    fn from(suite: SignatureSuite) -> Self {
        match suite {
            SignatureSuite::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl Display for SignatureSuite {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lookup from signature suite to the verification method type its proofs
/// are verified with.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct SuiteTable(HashMap<SignatureSuite, MethodType>);

impl Default for SuiteTable {
    fn default() -> Self {
        Self(HashMap::from([
            (SignatureSuite::Ed25519Signature2018, MethodType::Ed25519VerificationKey2018),
            (SignatureSuite::JsonWebSignature2020, MethodType::JwsVerificationKey2020),
        ]))
    }
}

impl SuiteTable {
    /// A table holding exactly `entries`.
    #[must_use]
    pub fn new(entries: impl IntoIterator<Item = (SignatureSuite, MethodType)>) -> Self {
        Self(entries.into_iter().collect())
    }

    /// The verification method type for `suite`, if the suite is supported.
    #[must_use]
    pub fn method_type(&self, suite: &SignatureSuite) -> Option<MethodType> {
        self.0.get(suite).copied()
    }
}

/// Position of a key in the provisioned key set.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeySlot {
    /// Ed25519 key for the 2018 suite.
    Ed25519Legacy,

    /// Ed25519 key as a `JwsVerificationKey2020`.
    Ed25519,

    /// P-256 key as a `JwsVerificationKey2020`.
    P256,
}

impl KeySlot {
    /// Slots in generation order.
    pub const ALL: [Self; 3] = [Self::Ed25519Legacy, Self::Ed25519, Self::P256];

    /// The key algorithm and verification method type held in the slot.
    #[must_use]
    pub const fn layout(self) -> (KeyAlgorithm, MethodType) {
        match self {
            Self::Ed25519Legacy => (KeyAlgorithm::Ed25519, MethodType::Ed25519VerificationKey2018),
            Self::Ed25519 => (KeyAlgorithm::Ed25519, MethodType::JwsVerificationKey2020),
            Self::P256 => (KeyAlgorithm::P256, MethodType::JwsVerificationKey2020),
        }
    }

    const fn index(self) -> usize {
        match self {
            Self::Ed25519Legacy => 0,
            Self::Ed25519 => 1,
            Self::P256 => 2,
        }
    }
}

/// Select the slot of the signing key for a key algorithm and signature suite.
///
/// # Errors
///
/// * `Err::UnsupportedKeyCombination` if no provisioned key matches.
pub fn select_key(
    algorithm: KeyAlgorithm, suite: &SignatureSuite, suites: &SuiteTable,
) -> Result<KeySlot> {
    let method_type = suites.method_type(suite);
    let slot = KeySlot::ALL.into_iter().find(|s| {
        let (alg, mt) = s.layout();
        alg == algorithm && Some(mt) == method_type
    });

    let Some(slot) = slot else {
        tracerr!(
            Err::UnsupportedKeyCombination,
            "no key found to match key type: {algorithm} and signature type: {suite}"
        );
    };
    Ok(slot)
}

/// Simplified JSON Web Key (JWK) public key structure.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Jwk {
    /// Key type.
    pub kty: String,

    /// Cryptographic curve type.
    pub crv: String,

    /// X coordinate, or the public key for OKP keys.
    pub x: String,

    /// Y coordinate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<String>,
}

impl Jwk {
    /// Express a public key exported by the key manager as a JWK.
    ///
    /// # Errors
    ///
    /// * `Err::KeyExport` if the bytes are not a valid public key for the
    ///   algorithm.
    pub fn from_bytes(algorithm: KeyAlgorithm, public_key: &[u8]) -> Result<Self> {
        match algorithm {
            KeyAlgorithm::Ed25519 => {
                let vk = match VerifyingKey::try_from(public_key) {
                    Ok(vk) => vk,
                    Err(e) => tracerr!(Err::KeyExport, "invalid Ed25519 public key: {e}"),
                };
                Ok(Self {
                    kty: "OKP".to_string(),
                    crv: "Ed25519".to_string(),
                    x: Base64UrlUnpadded::encode_string(vk.as_bytes()),
                    y: None,
                })
            }
            KeyAlgorithm::P256 => {
                let pk = match p256::PublicKey::from_sec1_bytes(public_key) {
                    Ok(pk) => pk,
                    Err(e) => tracerr!(Err::KeyExport, "invalid P-256 public key: {e}"),
                };
                Ok(serde_json::from_str(&pk.to_jwk_string())?)
            }
        }
    }
}

/// A verification method in a DID document.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VerificationMethod {
    /// Key identifier. Bare or relative until the DID is registered.
    pub id: String,

    /// Verification method type.
    #[serde(rename = "type")]
    pub type_: MethodType,

    /// DID of the controller. Empty until the DID is registered.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub controller: String,

    /// The public key.
    pub public_key_jwk: Jwk,
}

/// Verification relationships a provisioned key is registered for.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum KeyPurpose {
    /// Authenticate the DID subject.
    Authentication,

    /// Express claims, such as issuing credentials.
    AssertionMethod,
}

/// A public key as submitted to a universal registrar.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PublicKey {
    /// Key identifier.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,

    /// Verification method type. Not set for control keys.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_: Option<MethodType>,

    /// Verification relationships.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub purposes: Vec<KeyPurpose>,

    /// Public key bytes, standard base64.
    pub value: String,

    /// Key algorithm.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_type: Option<KeyAlgorithm>,

    /// The key controls DID recovery.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub recovery: bool,

    /// The key controls DID updates.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub update: bool,
}

impl PublicKey {
    /// A recovery control key.
    #[must_use]
    pub fn recovery(public_key: &[u8]) -> Self {
        Self {
            value: Base64::encode_string(public_key),
            key_type: Some(KeyAlgorithm::Ed25519),
            recovery: true,
            ..Self::default()
        }
    }

    /// An update control key.
    #[must_use]
    pub fn update(public_key: &[u8]) -> Self {
        Self {
            value: Base64::encode_string(public_key),
            key_type: Some(KeyAlgorithm::Ed25519),
            update: true,
            ..Self::default()
        }
    }
}

/// The three signing keys generated for a new DID, as a template document
/// and as registrar public keys.
#[derive(Clone, Debug)]
pub struct KeySet {
    /// Unregistered DID document referencing the keys.
    pub document: Document,

    /// The same keys in registrar form.
    pub public_keys: Vec<PublicKey>,

    key_ids: Vec<String>,
}

impl KeySet {
    /// Generate one key per [`KeySlot`], in slot order.
    ///
    /// Keys created before a failure stay in the key manager.
    ///
    /// # Errors
    ///
    /// * `Err::KeyGeneration` or `Err::KeyExport` from the key manager.
    pub async fn generate(keys: &impl KeyManager) -> Result<Self> {
        let mut set = Self {
            document: Document::template(),
            public_keys: Vec::with_capacity(KeySlot::ALL.len()),
            key_ids: Vec::with_capacity(KeySlot::ALL.len()),
        };

        for slot in KeySlot::ALL {
            if let Err(e) = set.add(keys, slot).await {
                if !set.key_ids.is_empty() {
                    tracing::warn!(
                        created = ?set.key_ids,
                        "key set incomplete, created keys remain"
                    );
                }
                return Err(e);
            }
        }
        Ok(set)
    }

    async fn add(&mut self, keys: &impl KeyManager, slot: KeySlot) -> Result<()> {
        let (algorithm, method_type) = slot.layout();
        let (key_id, public_key) = create_key(keys, algorithm).await?;
        // record before conversion so a bad export is reported as orphaned
        self.key_ids.push(key_id.clone());

        let vm = VerificationMethod {
            id: key_id.clone(),
            type_: method_type,
            controller: String::new(),
            public_key_jwk: Jwk::from_bytes(algorithm, &public_key)?,
        };
        self.public_keys.push(PublicKey {
            id: key_id,
            type_: Some(method_type),
            purposes: vec![KeyPurpose::AssertionMethod, KeyPurpose::Authentication],
            value: Base64::encode_string(&public_key),
            key_type: Some(algorithm),
            ..PublicKey::default()
        });
        self.document.add_signing_method(vm);
        Ok(())
    }

    /// Key identifier held in `slot`.
    #[must_use]
    pub fn key_id(&self, slot: KeySlot) -> &str {
        &self.key_ids[slot.index()]
    }
}
