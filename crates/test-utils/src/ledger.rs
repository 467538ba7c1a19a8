//! DID document store

use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use base64ct::{Base64UrlUnpadded, Encoding};
use dashmap::DashMap;
use did_provision::document::{Document, Kind};
use did_provision::{CreateOptions, DidRegistry};
use sha2::{Digest, Sha256};

/// DID registry anchoring documents in memory.
#[derive(Clone)]
pub struct Ledger {
    name: String,
    docs: Arc<DashMap<String, Document>>,
    created: Arc<Mutex<Vec<(String, CreateOptions)>>>,
}

impl Ledger {
    /// `name` becomes the ledger segment of created DIDs:
    /// `did:<method>:<name>:<suffix>`.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            docs: Arc::new(DashMap::new()),
            created: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Add an existing document.
    pub fn insert(&self, doc: Document) {
        self.docs.insert(doc.id.clone(), doc);
    }

    #[must_use]
    pub fn get(&self, did: &str) -> Option<Document> {
        self.docs.get(did).map(|doc| doc.clone())
    }

    /// Method and options of each `create` call, in order.
    #[must_use]
    pub fn created(&self) -> Vec<(String, CreateOptions)> {
        self.created.lock().expect("lock on created mutex failed").clone()
    }
}

impl DidRegistry for Ledger {
    async fn resolve(&self, did: &str) -> Result<Document> {
        self.get(did).ok_or_else(|| anyhow!("did not found: {did}"))
    }

    async fn create(
        &self, method: &str, mut document: Document, options: CreateOptions,
    ) -> Result<Document> {
        let mut hasher = Sha256::new();
        hasher.update(serde_json::to_vec(&document)?);
        hasher.update(&options.recovery_key);
        let suffix = Base64UrlUnpadded::encode_string(&hasher.finalize());
        let did = format!("did:{method}:{}:{suffix}", self.name);

        let qualify = |id: &str| {
            if id.contains('#') { id.to_string() } else { format!("{did}#{id}") }
        };
        for vm in &mut document.verification_method {
            vm.id = qualify(&vm.id);
            vm.controller.clone_from(&did);
        }
        for rel in document.authentication.iter_mut().chain(document.assertion_method.iter_mut()) {
            if let Kind::String(id) = rel {
                *id = qualify(id);
            }
        }
        document.id.clone_from(&did);

        self.insert(document.clone());
        let mut created = self.created.lock().expect("lock on created mutex failed");
        created.push((method.to_string(), options));

        Ok(document)
    }
}
