//! In-memory collaborators for testing DID provisioning.

mod keystore;
mod ledger;
mod registrar;

pub use crate::keystore::{ed25519_base58, KeyStore};
pub use crate::ledger::Ledger;
pub use crate::registrar::StubRegistrar;
