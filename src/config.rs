//! # Configuration
//!
//! Read-only settings shared by all provisioning calls.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::verification::SuiteTable;

/// DID method used when creating DIDs with the local registry.
pub const DEFAULT_METHOD: &str = "trustbloc";

/// Provisioning configuration.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Domain `did:trustbloc` DIDs are exposed under. Empty to keep the
    /// ledger-scoped DID.
    pub domain: String,

    /// DID method for locally created DIDs.
    pub method: String,

    /// Signature suite to verification method type lookup.
    pub suites: SuiteTable,

    /// HTTP settings for universal registrar calls.
    pub registrar: ClientConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            domain: String::new(),
            method: DEFAULT_METHOD.to_string(),
            suites: SuiteTable::default(),
            registrar: ClientConfig::default(),
        }
    }
}

impl Config {
    /// Configuration exposing DIDs under `domain`.
    #[must_use]
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            ..Self::default()
        }
    }
}

/// HTTP client settings.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct ClientConfig {
    /// Request timeout in seconds. No timeout when unset.
    pub timeout_secs: Option<u64>,

    /// PEM files with additional trusted root certificates.
    pub root_certificates: Vec<PathBuf>,

    /// Skip TLS certificate verification. Only for test networks.
    pub accept_invalid_certs: bool,
}
