//! # Key Provisioning
//!
//! Key pairs are generated and stored by the [`KeyManager`]; this module only
//! asks for them and brings the public half back so it can be published.

use std::fmt::{self, Display};

use ed25519_dalek::{SigningKey, KEYPAIR_LENGTH, SECRET_KEY_LENGTH};
use serde::{Deserialize, Serialize};

use crate::error::{Classify, Err};
use crate::provider::KeyManager;
use crate::{tracerr, Result};

/// Key algorithms the engine provisions.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq, Hash)]
pub enum KeyAlgorithm {
    /// EdDSA over Curve25519.
    Ed25519,

    /// ECDSA over NIST P-256.
    #[serde(alias = "EC-P256")]
    P256,
}

impl Display for KeyAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Ed25519 => write!(f, "Ed25519"),
            Self::P256 => write!(f, "P256"),
        }
    }
}

/// Create a key pair in the key manager and export its public key.
///
/// # Errors
///
/// * `Err::KeyGeneration` if the key manager cannot create the key.
/// * `Err::KeyExport` if the public key cannot be exported. The key pair
///   created in the first step is left in the key manager.
pub async fn create_key(
    keys: &impl KeyManager, algorithm: KeyAlgorithm,
) -> Result<(String, Vec<u8>)> {
    let key_id = keys
        .create(algorithm)
        .await
        .kind_context(Err::KeyGeneration, format!("failed to create {algorithm} key"))?;
    let public_key = keys
        .export_public_key(&key_id)
        .await
        .kind_context(Err::KeyExport, format!("failed to export public key {key_id}"))?;

    tracing::debug!(%key_id, %algorithm, "created key");
    Ok((key_id, public_key))
}

/// Import a private key into the key manager, stored under the fragment of
/// `key_id` (a DID URL such as `did:example:123#key-1`).
///
/// Ed25519 material may be the 32-byte seed or the 64-byte `seed || public`
/// keypair encoding. Only the seed is handed to the key manager.
///
/// # Errors
///
/// * `Err::InvalidKeyId` if `key_id` has no fragment.
/// * `Err::UnsupportedImportAlgorithm` for algorithms other than Ed25519.
/// * `Err::InvalidKey` if the key material is malformed.
/// * `Err::KeyImport` if the key manager rejects the key.
pub async fn import_private_key(
    keys: &impl KeyManager, key_id: &str, algorithm: KeyAlgorithm, secret: &[u8],
) -> Result<()> {
    let Some((_, fragment)) = key_id.split_once('#') else {
        tracerr!(Err::InvalidKeyId, "key id has no fragment: {key_id}");
    };
    if fragment.is_empty() {
        tracerr!(Err::InvalidKeyId, "key id has an empty fragment: {key_id}");
    }

    let seed = match algorithm {
        KeyAlgorithm::Ed25519 => ed25519_seed(secret)?,
        KeyAlgorithm::P256 => {
            tracerr!(Err::UnsupportedImportAlgorithm, "import key type not supported {algorithm}")
        }
    };

    keys.import_private_key(&seed, algorithm, fragment)
        .await
        .kind_context(Err::KeyImport, format!("failed to import private key {key_id}"))?;

    tracing::debug!(%key_id, "imported private key");
    Ok(())
}

/// Decode base58 private key material.
///
/// # Errors
///
/// * `Err::InvalidKey` if the string is not valid base58.
pub fn decode_base58(encoded: &str) -> Result<Vec<u8>> {
    match bs58::decode(encoded).into_vec() {
        Ok(bytes) => Ok(bytes),
        Err(e) => tracerr!(Err::InvalidKey, "private key is not base58: {e}"),
    }
}

fn ed25519_seed(secret: &[u8]) -> Result<Vec<u8>> {
    let signing_key = match secret.len() {
        SECRET_KEY_LENGTH => {
            let mut seed = [0u8; SECRET_KEY_LENGTH];
            seed.copy_from_slice(secret);
            SigningKey::from_bytes(&seed)
        }
        KEYPAIR_LENGTH => {
            let mut keypair = [0u8; KEYPAIR_LENGTH];
            keypair.copy_from_slice(secret);
            match SigningKey::from_keypair_bytes(&keypair) {
                Ok(key) => key,
                Err(e) => tracerr!(Err::InvalidKey, "inconsistent Ed25519 keypair: {e}"),
            }
        }
        len => tracerr!(Err::InvalidKey, "invalid Ed25519 private key length {len}"),
    };
    Ok(signing_key.to_bytes().to_vec())
}
