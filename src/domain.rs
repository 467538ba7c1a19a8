//! # Domain DIDs
//!
//! `did:trustbloc` identifiers carry the ledger they were anchored on
//! (`did:trustbloc:<ledger>:<suffix>`). Issuers expose them under their own
//! domain instead, which resolves to the same document.

const METHOD: &str = "trustbloc";
const SEGMENTS: usize = 4;

/// Replace the ledger segment of a `did:trustbloc` DID with `domain`, and
/// rewrite `key_id` to match. Any other DID is returned unchanged, as is
/// everything when `domain` is empty.
#[must_use]
pub fn domain_did(did: &str, key_id: &str, domain: &str) -> (String, String) {
    if domain.is_empty() {
        return (did.to_string(), key_id.to_string());
    }

    let segments: Vec<&str> = did.split(':').collect();
    if segments.len() != SEGMENTS || segments[0] != "did" || segments[1] != METHOD {
        return (did.to_string(), key_id.to_string());
    }

    let domain_did = format!("did:{METHOD}:{domain}:{}", segments[3]);
    let domain_key_id = key_id.replace(did, &domain_did);
    tracing::debug!(%did, %domain_did, "using domain did");

    (domain_did, domain_key_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rewrite() {
        let (did, key_id) = domain_did(
            "did:trustbloc:ledgerA:abc123",
            "did:trustbloc:ledgerA:abc123#key1",
            "example.com",
        );
        assert_eq!(did, "did:trustbloc:example.com:abc123");
        assert_eq!(key_id, "did:trustbloc:example.com:abc123#key1");
    }

    #[test]
    fn other_method() {
        let (did, key_id) = domain_did("did:v1:test:xyz", "did:v1:test:xyz#key1", "example.com");
        assert_eq!(did, "did:v1:test:xyz");
        assert_eq!(key_id, "did:v1:test:xyz#key1");
    }

    #[test]
    fn segment_count() {
        let (did, key_id) =
            domain_did("did:trustbloc:abc", "did:trustbloc:abc#key1", "example.com");
        assert_eq!(did, "did:trustbloc:abc");
        assert_eq!(key_id, "did:trustbloc:abc#key1");

        let (did, _) = domain_did("did:trustbloc:a:b:c", "", "example.com");
        assert_eq!(did, "did:trustbloc:a:b:c");
    }

    #[test]
    fn no_domain() {
        let (did, key_id) =
            domain_did("did:trustbloc:ledgerA:abc123", "did:trustbloc:ledgerA:abc123#key1", "");
        assert_eq!(did, "did:trustbloc:ledgerA:abc123");
        assert_eq!(key_id, "did:trustbloc:ledgerA:abc123#key1");
    }

    #[test]
    fn unrelated_key_id() {
        let (did, key_id) = domain_did("did:trustbloc:ledgerA:abc123", "key1", "example.com");
        assert_eq!(did, "did:trustbloc:example.com:abc123");
        assert_eq!(key_id, "key1");
    }
}
