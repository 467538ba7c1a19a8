//! Key management

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::{anyhow, bail, Result};
use dashmap::DashMap;
use did_provision::{KeyAlgorithm, KeyManager};
use ed25519_dalek::SigningKey;
use p256::elliptic_curve::sec1::ToEncodedPoint;
use rand::rngs::OsRng;
use uuid::Uuid;

#[derive(Clone)]
enum Secret {
    Ed25519(SigningKey),
    P256(p256::SecretKey),
}

/// Key manager holding keys in memory.
#[derive(Clone, Default)]
pub struct KeyStore {
    keys: Arc<DashMap<String, Secret>>,
    created: Arc<AtomicUsize>,
    fail_after: Option<usize>,
}

impl KeyStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A key store that refuses to create keys once `count` have been created.
    #[must_use]
    pub fn failing_after(count: usize) -> Self {
        Self {
            fail_after: Some(count),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn contains(&self, key_id: &str) -> bool {
        self.keys.contains_key(key_id)
    }

    /// Number of keys held, created or imported.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Ed25519 seed stored for `key_id`.
    #[must_use]
    pub fn ed25519_seed(&self, key_id: &str) -> Option<[u8; 32]> {
        match self.keys.get(key_id).as_deref() {
            Some(Secret::Ed25519(signing_key)) => Some(signing_key.to_bytes()),
            _ => None,
        }
    }
}

impl KeyManager for KeyStore {
    async fn create(&self, algorithm: KeyAlgorithm) -> Result<String> {
        if let Some(limit) = self.fail_after {
            if self.created.load(Ordering::SeqCst) >= limit {
                bail!("key store unavailable");
            }
        }

        let secret = match algorithm {
            KeyAlgorithm::Ed25519 => Secret::Ed25519(SigningKey::generate(&mut OsRng)),
            KeyAlgorithm::P256 => Secret::P256(p256::SecretKey::random(&mut OsRng)),
        };
        let key_id = Uuid::new_v4().to_string();
        self.keys.insert(key_id.clone(), secret);
        self.created.fetch_add(1, Ordering::SeqCst);

        Ok(key_id)
    }

    async fn export_public_key(&self, key_id: &str) -> Result<Vec<u8>> {
        let secret = self.keys.get(key_id).ok_or_else(|| anyhow!("key not found: {key_id}"))?;
        let public_key = match secret.value() {
            Secret::Ed25519(signing_key) => signing_key.verifying_key().to_bytes().to_vec(),
            Secret::P256(secret_key) => {
                secret_key.public_key().to_encoded_point(false).as_bytes().to_vec()
            }
        };
        Ok(public_key)
    }

    async fn import_private_key(
        &self, secret: &[u8], algorithm: KeyAlgorithm, key_id: &str,
    ) -> Result<String> {
        let secret = match algorithm {
            KeyAlgorithm::Ed25519 => {
                let seed: [u8; 32] = secret.try_into()?;
                Secret::Ed25519(SigningKey::from_bytes(&seed))
            }
            KeyAlgorithm::P256 => Secret::P256(p256::SecretKey::from_slice(secret)?),
        };
        self.keys.insert(key_id.to_string(), secret);
        Ok(key_id.to_string())
    }
}

/// Base58 encoding of the Ed25519 keypair (`seed || public`) for `seed`.
#[must_use]
pub fn ed25519_base58(seed: [u8; 32]) -> String {
    let signing_key = SigningKey::from_bytes(&seed);
    bs58::encode(signing_key.to_keypair_bytes()).into_string()
}
