//! Universal registrar stub

use std::sync::{Arc, Mutex};

use anyhow::{bail, Result};
use did_provision::{RegisterRequest, RegisteredKey, Registration, UniversalRegistrar};

#[derive(Clone)]
enum Reply {
    // Register the submitted signing keys under the DID.
    Echo(String),
    Fixed(Registration),
    Fail(String),
}

/// Universal registrar returning canned responses and recording requests.
#[derive(Clone)]
pub struct StubRegistrar {
    reply: Reply,
    requests: Arc<Mutex<Vec<(String, RegisterRequest)>>>,
}

impl StubRegistrar {
    /// Behave like a driver that registers the keys it is sent: every
    /// submitted key with an ID is returned as `<did>#<id>`.
    #[must_use]
    pub fn echo(did: impl Into<String>) -> Self {
        Self::with_reply(Reply::Echo(did.into()))
    }

    /// Always return `registration`.
    #[must_use]
    pub fn fixed(registration: Registration) -> Self {
        Self::with_reply(Reply::Fixed(registration))
    }

    /// Always fail with `message`.
    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self::with_reply(Reply::Fail(message.into()))
    }

    fn with_reply(reply: Reply) -> Self {
        Self {
            reply,
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Driver URL and request of each call, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<(String, RegisterRequest)> {
        self.requests.lock().expect("lock on requests mutex failed").clone()
    }
}

impl Default for StubRegistrar {
    fn default() -> Self {
        Self::failing("no registrar configured")
    }
}

impl UniversalRegistrar for StubRegistrar {
    async fn create_did(
        &self, driver_url: &str, request: &RegisterRequest,
    ) -> Result<Registration> {
        self.requests
            .lock()
            .expect("lock on requests mutex failed")
            .push((driver_url.to_string(), request.clone()));

        match &self.reply {
            Reply::Echo(did) => {
                let keys = request
                    .did_document
                    .public_key
                    .iter()
                    .filter(|pk| !pk.id.is_empty())
                    .map(|pk| RegisteredKey {
                        id: format!("{did}#{}", pk.id),
                        purposes: pk
                            .purposes
                            .iter()
                            .filter_map(|p| serde_json::to_value(p).ok())
                            .filter_map(|v| v.as_str().map(ToString::to_string))
                            .collect(),
                        private_key_base58: None,
                    })
                    .collect();
                Ok(Registration {
                    identifier: did.clone(),
                    keys,
                })
            }
            Reply::Fixed(registration) => Ok(registration.clone()),
            Reply::Fail(message) => bail!("{message}"),
        }
    }
}
