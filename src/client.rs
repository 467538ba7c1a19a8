//! # Registrar Client
//!
//! [`UniversalRegistrar`] over HTTP. Drivers accept a register request and
//! answer with the state of the registration job.

use std::fs;
use std::time::Duration;

use anyhow::{anyhow, bail};
use reqwest::Certificate;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::ClientConfig;
use crate::error::Err;
use crate::provider::UniversalRegistrar;
use crate::registrar::{RegisterRequest, RegisteredKey, Registration};
use crate::{tracerr, Result};

const STATE_FINISHED: &str = "finished";
const STATE_FAILED: &str = "failed";

/// Universal registrar client.
#[derive(Clone, Debug)]
pub struct HttpRegistrar {
    http_client: reqwest::Client,
}

/// Register response returned by a registrar driver.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    /// Job identifier.
    #[serde(default)]
    pub job_id: Option<String>,

    /// State of the registration.
    pub did_state: DidState,
}

/// State of a DID registration job.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DidState {
    /// `finished`, `failed`, or a driver-specific intermediate state.
    #[serde(default)]
    pub state: String,

    /// The DID, once registered.
    #[serde(default)]
    pub identifier: String,

    /// Reason for failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// Keys registered for the DID.
    #[serde(default)]
    pub secret: Secret,
}

/// Key material returned by the driver.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct Secret {
    /// Registered keys.
    #[serde(default)]
    pub keys: Vec<RegisteredKey>,
}

impl HttpRegistrar {
    /// Build a client.
    ///
    /// # Errors
    ///
    /// * `Err::InvalidConfig` if a root certificate cannot be read or parsed,
    ///   or the HTTP client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/json"),
        );
        let mut builder = reqwest::Client::builder()
            .default_headers(headers)
            .danger_accept_invalid_certs(config.accept_invalid_certs);

        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        for path in &config.root_certificates {
            let pem = match fs::read(path) {
                Ok(pem) => pem,
                Err(e) => tracerr!(
                    Err::InvalidConfig,
                    "failed to read root certificate {}: {e}",
                    path.display()
                ),
            };
            let cert = match Certificate::from_pem(&pem) {
                Ok(cert) => cert,
                Err(e) => tracerr!(
                    Err::InvalidConfig,
                    "invalid root certificate {}: {e}",
                    path.display()
                ),
            };
            builder = builder.add_root_certificate(cert);
        }

        let http_client = match builder.build() {
            Ok(client) => client,
            Err(e) => tracerr!(Err::InvalidConfig, "failed to build http client: {e}"),
        };
        Ok(Self { http_client })
    }
}

impl UniversalRegistrar for HttpRegistrar {
    async fn create_did(
        &self, driver_url: &str, request: &RegisterRequest,
    ) -> anyhow::Result<Registration> {
        let url = Url::parse(driver_url).map_err(|e| anyhow!("invalid driver url: {e}"))?;

        let response = self.http_client.post(url).json(request).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("registrar returned {status}: {body}");
        }

        let register: RegisterResponse = response.json().await?;
        let did_state = register.did_state;
        if did_state.state == STATE_FAILED {
            bail!("registration failed: {}", did_state.reason.unwrap_or_default());
        }
        if did_state.state != STATE_FINISHED {
            tracing::warn!(
                state = %did_state.state,
                job_id = ?register.job_id,
                "registration not finished"
            );
        }

        Ok(Registration {
            identifier: did_state.identifier,
            keys: did_state.secret.keys,
        })
    }
}
