//! # DID Document
//!
//! The subset of a DID Document the provisioning engine builds and reads: the
//! verification methods it generates and the relationships that reference
//! them.

use serde::{Deserialize, Serialize};

use crate::verification::VerificationMethod;

/// Context added to documents built from scratch.
pub const CONTEXT: [&str; 2] =
    ["https://www.w3.org/ns/did/v1", "https://w3id.org/security/suites/jws-2020/v1"];

/// `Kind` allows serde to serialize/deserialize a string or an object.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum Kind<T> {
    /// Simple string value
    String(String),

    /// Complex object value
    Object(T),
}

/// DID Document
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// The context of the DID document.
    #[serde(rename = "@context", default, skip_serializing_if = "Vec::is_empty")]
    pub context: Vec<String>,

    /// The DID for a particular DID subject. Empty for a template document
    /// that has not yet been registered.
    #[serde(default)]
    pub id: String,

    /// Verification methods for the DID subject.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub verification_method: Vec<VerificationMethod>,

    /// How the DID subject is expected to be authenticated.
    ///
    /// <https://www.w3.org/TR/did-core/#authentication>
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authentication: Vec<Kind<VerificationMethod>>,

    /// How the DID subject is expected to express claims, such as for the
    /// purposes of issuing a Verifiable Credential.
    ///
    /// <https://www.w3.org/TR/did-core/#assertion>
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub assertion_method: Vec<Kind<VerificationMethod>>,
}

impl Document {
    /// An unregistered document with the default context.
    #[must_use]
    pub fn template() -> Self {
        Self {
            context: CONTEXT.iter().map(ToString::to_string).collect(),
            ..Self::default()
        }
    }

    /// Add a verification method, referencing it from the `authentication`
    /// and `assertionMethod` relationships.
    pub fn add_signing_method(&mut self, vm: VerificationMethod) {
        self.authentication.push(Kind::String(vm.id.clone()));
        self.assertion_method.push(Kind::String(vm.id.clone()));
        self.verification_method.push(vm);
    }

    /// Retrieve a verification method by its ID. Relative IDs (`#key-1`) and
    /// bare key IDs match their fully-qualified form.
    #[must_use]
    pub fn verification_method(&self, id: &str) -> Option<&VerificationMethod> {
        let fragment = id.rsplit_once('#').map_or(id, |(_, f)| f);
        self.verification_method.iter().find(|vm| {
            vm.id == id || vm.id.rsplit_once('#').map_or(vm.id.as_str(), |(_, f)| f) == fragment
        })
    }
}
