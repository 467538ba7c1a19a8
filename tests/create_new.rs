//! Tests for creating a new DID with the local DID registry.

use anyhow::bail;
use did_provision::error::Err;
use did_provision::verification::{KeySet, KeySlot};
use did_provision::{
    Config, CreateDidRequest, CreateOptions, DidRegistry, Document, KeyAlgorithm, MethodType,
    Provisioner, RegistrarDescriptor, SignatureSuite, SuiteTable,
};
use test_utils::{KeyStore, Ledger, StubRegistrar};

const LEDGER: &str = "testnet.example.org";
const DOMAIN: &str = "example.com";

fn init_tracer() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn provisioner(keys: &KeyStore, ledger: &Ledger) -> Provisioner<KeyStore, Ledger, StubRegistrar> {
    Provisioner::new(Config::new(DOMAIN), keys.clone(), ledger.clone(), StubRegistrar::default())
}

// Each supported combination selects the key of the matching type from a
// freshly created DID.
#[tokio::test]
async fn create_success() {
    init_tracer();

    let combos = [
        (
            KeyAlgorithm::Ed25519,
            SignatureSuite::Ed25519Signature2018,
            MethodType::Ed25519VerificationKey2018,
            "Ed25519",
        ),
        (
            KeyAlgorithm::Ed25519,
            SignatureSuite::JsonWebSignature2020,
            MethodType::JwsVerificationKey2020,
            "Ed25519",
        ),
        (
            KeyAlgorithm::P256,
            SignatureSuite::JsonWebSignature2020,
            MethodType::JwsVerificationKey2020,
            "P-256",
        ),
    ];

    for (algorithm, suite, method_type, crv) in combos {
        let keys = KeyStore::new();
        let ledger = Ledger::new(LEDGER);
        let request = CreateDidRequest::new(algorithm, suite);

        let result = provisioner(&keys, &ledger).create_did(&request).await.expect("should create");

        // domain form is returned
        assert!(result.did.starts_with("did:trustbloc:example.com:"), "{}", result.did);
        let (did, fragment) = result.public_key_id.split_once('#').expect("should have fragment");
        assert_eq!(did, result.did);

        // the canonical document holds the selected key
        let canonical = result.did.replace(DOMAIN, LEDGER);
        let doc = ledger.get(&canonical).expect("should be registered");
        let vm = doc.verification_method(fragment).expect("should contain key");
        assert_eq!(vm.type_, method_type);
        assert_eq!(vm.public_key_jwk.crv, crv);
        assert_eq!(doc.verification_method.len(), 3);
        assert_eq!(doc.authentication.len(), 3);
        assert_eq!(doc.assertion_method.len(), 3);

        // three signing keys plus recovery and update keys
        assert_eq!(keys.len(), 5);
        assert!(keys.contains(fragment));
    }
}

// Recovery and update keys are passed to the registry and are not signing
// keys.
#[tokio::test]
async fn control_keys() {
    let keys = KeyStore::new();
    let ledger = Ledger::new(LEDGER);
    let request =
        CreateDidRequest::new(KeyAlgorithm::Ed25519, SignatureSuite::JsonWebSignature2020);

    provisioner(&keys, &ledger).create_did(&request).await.expect("should create");

    let created = ledger.created();
    assert_eq!(created.len(), 1);
    let (method, options) = &created[0];
    assert_eq!(method, "trustbloc");
    assert_eq!(options.recovery_key.len(), 32);
    assert_eq!(options.update_key.len(), 32);
    assert_ne!(options.recovery_key, options.update_key);
}

// The configured method is used and other methods keep their DID.
#[tokio::test]
async fn configured_method() {
    let keys = KeyStore::new();
    let ledger = Ledger::new(LEDGER);
    let config = Config {
        method: "example".to_string(),
        ..Config::new(DOMAIN)
    };
    let provisioner = Provisioner::new(config, keys, ledger.clone(), StubRegistrar::default());
    let request = CreateDidRequest::new(KeyAlgorithm::P256, SignatureSuite::JsonWebSignature2020);

    let result = provisioner.create_did(&request).await.expect("should create");
    assert!(result.did.starts_with("did:example:testnet.example.org:"));
    assert!(ledger.get(&result.did).is_some());
}

// Each slot of a key set holds a different key.
#[tokio::test]
async fn distinct_slots() {
    let keys = KeyStore::new();
    let key_set = KeySet::generate(&keys).await.expect("should generate");

    let ids: Vec<&str> = KeySlot::ALL.iter().map(|s| key_set.key_id(*s)).collect();
    assert_ne!(ids[0], ids[1]);
    assert_ne!(ids[1], ids[2]);
    assert_ne!(ids[0], ids[2]);
    assert_eq!(key_set.public_keys.len(), 3);
    assert_eq!(key_set.public_keys[2].value.len(), 88);
}

// Keys created before a key manager failure are not removed.
#[tokio::test]
async fn key_generation_failure() {
    let keys = KeyStore::failing_after(2);
    let ledger = Ledger::new(LEDGER);
    let request =
        CreateDidRequest::new(KeyAlgorithm::Ed25519, SignatureSuite::JsonWebSignature2020);

    let err = provisioner(&keys, &ledger).create_did(&request).await.expect_err("should fail");
    assert!(err.is(Err::KeyGeneration));
    assert!(!err.is_bad_input());
    assert_eq!(keys.len(), 2);
    assert!(ledger.created().is_empty());
}

// An unsupported combination fails before any key is created, whatever the
// strategy.
#[tokio::test]
async fn unsupported_combination() {
    let registrar = RegistrarDescriptor {
        driver_url: "https://registrar.example.com/1.0/register".to_string(),
        ..RegistrarDescriptor::default()
    };
    let requests = [
        CreateDidRequest::new(KeyAlgorithm::P256, SignatureSuite::Ed25519Signature2018),
        CreateDidRequest::new(KeyAlgorithm::P256, SignatureSuite::Ed25519Signature2018)
            .did("did:example:123")
            .key_id("did:example:123#key-1"),
        CreateDidRequest::new(KeyAlgorithm::P256, SignatureSuite::Ed25519Signature2018)
            .registrar(registrar),
        CreateDidRequest::new(KeyAlgorithm::Ed25519, SignatureSuite::BbsBlsSignature2020),
    ];

    for request in requests {
        let keys = KeyStore::new();
        let ledger = Ledger::new(LEDGER);
        ledger.insert(Document {
            id: "did:example:123".to_string(),
            ..Document::default()
        });
        let registrar = StubRegistrar::echo("did:trustbloc:testnet:EiA");
        let provisioner =
            Provisioner::new(Config::new(DOMAIN), keys.clone(), ledger.clone(), registrar.clone());

        let err = provisioner.create_did(&request).await.expect_err("should fail");
        assert!(err.is(Err::UnsupportedKeyCombination));
        assert!(err.is_bad_input());
        assert!(keys.is_empty());
        assert!(ledger.created().is_empty());
        assert!(registrar.requests().is_empty());
    }
}

struct Offline;

impl DidRegistry for Offline {
    async fn resolve(&self, _: &str) -> anyhow::Result<Document> {
        bail!("registry offline")
    }

    async fn create(&self, _: &str, _: Document, _: CreateOptions) -> anyhow::Result<Document> {
        bail!("registry offline")
    }
}

// Registry failures are reported as document creation errors.
#[tokio::test]
async fn registry_failure() {
    let provisioner =
        Provisioner::new(Config::new(DOMAIN), KeyStore::new(), Offline, StubRegistrar::default());
    let request =
        CreateDidRequest::new(KeyAlgorithm::Ed25519, SignatureSuite::Ed25519Signature2018);

    let err = provisioner.create_did(&request).await.expect_err("should fail");
    assert!(err.is(Err::DocumentCreation));
    assert!(format!("{err:#}").contains("registry offline"));
}

// Suites the engine does not know are rejected as an unsupported combination
// rather than as a malformed request.
#[tokio::test]
async fn unknown_suite() {
    let keys = KeyStore::new();
    let ledger = Ledger::new(LEDGER);
    let request: CreateDidRequest = serde_json::from_value(serde_json::json!({
        "keyType": "Ed25519",
        "signatureType": "EcdsaSecp256k1Signature2019"
    }))
    .expect("should deserialize");

    let err = provisioner(&keys, &ledger).create_did(&request).await.expect_err("should fail");
    assert!(err.is(Err::UnsupportedKeyCombination));
    assert!(err.is_bad_input());
    assert!(keys.is_empty());
}

// A suite added to the configured table selects the key of its method type.
#[tokio::test]
async fn configured_suite() {
    let keys = KeyStore::new();
    let ledger = Ledger::new(LEDGER);
    let config = Config {
        suites: SuiteTable::new([(
            SignatureSuite::from("EcdsaSecp256r1Signature2019"),
            MethodType::JwsVerificationKey2020,
        )]),
        ..Config::new(DOMAIN)
    };
    let provisioner =
        Provisioner::new(config, keys.clone(), ledger.clone(), StubRegistrar::default());
    let suite = SignatureSuite::from("EcdsaSecp256r1Signature2019");
    let request = CreateDidRequest::new(KeyAlgorithm::P256, suite);

    let result = provisioner.create_did(&request).await.expect("should create");
    let (_, fragment) = result.public_key_id.split_once('#').expect("should have fragment");
    let doc = ledger.get(&result.did.replace(DOMAIN, LEDGER)).expect("should be registered");
    let vm = doc.verification_method(fragment).expect("should contain key");
    assert_eq!(vm.public_key_jwk.crv, "P-256");
}
