//! Device fingerprint provider.
//!
//! The protocol requires a `deviceFingerprintHash` that stays stable across
//! a client's verification attempts. The value's origin does not matter for
//! correctness — only its stability — so the provider tries the service's
//! own fingerprinting endpoint once, falls back to a random identifier, and
//! caches whichever value won.

use crate::error::SheerIdError;
use async_trait::async_trait;
use rand::Rng;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use valor_store::KvStore;

/// Cache key in the client-side store.
const FINGERPRINT_KEY: &str = "device_fingerprint";

/// Cached values shorter than this are treated as corrupt and replaced.
const MIN_FINGERPRINT_LEN: usize = 10;

/// The service's fingerprinting endpoint.
pub const DEFAULT_UDID_URL: &str = "https://fn.us.fd.sheerid.com/udid/udid.json";

/// Single best-effort attempt; stability does not depend on this call.
const UDID_TIMEOUT: Duration = Duration::from_secs(10);

/// Source of the stable per-client fingerprint.
///
/// Infallible by contract: implementations internalize their failure modes
/// and always hand back a usable value.
#[async_trait]
pub trait FingerprintProvider: Send + Sync {
    async fn fingerprint(&self) -> String;
}

#[async_trait]
impl<T: FingerprintProvider + ?Sized> FingerprintProvider for Arc<T> {
    async fn fingerprint(&self) -> String {
        (**self).fingerprint().await
    }
}

/// A constant fingerprint for tests.
pub struct FixedFingerprint(pub String);

#[async_trait]
impl FingerprintProvider for FixedFingerprint {
    async fn fingerprint(&self) -> String {
        self.0.clone()
    }
}

#[derive(Deserialize)]
struct UdidResponse {
    #[serde(default)]
    udid: Option<serde_json::Value>,
}

/// Cache-backed fingerprint provider.
pub struct DeviceFingerprint {
    store: Arc<dyn KvStore>,
    http: reqwest::Client,
    udid_url: String,
}

impl DeviceFingerprint {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self::with_udid_url(store, DEFAULT_UDID_URL)
    }

    pub fn with_udid_url(store: Arc<dyn KvStore>, udid_url: &str) -> Self {
        let http = reqwest::Client::builder()
            .timeout(UDID_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            store,
            http,
            udid_url: udid_url.to_string(),
        }
    }

    /// One attempt against the service's fingerprinting endpoint.
    async fn fetch_udid(&self) -> Result<String, SheerIdError> {
        let response = self
            .http
            .get(&self.udid_url)
            .header("accept", "*/*")
            .send()
            .await
            .map_err(|e| SheerIdError::Unreachable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(SheerIdError::Protocol {
                status: response.status().as_u16(),
                body: String::new(),
            });
        }

        let parsed: UdidResponse = response
            .json()
            .await
            .map_err(|e| SheerIdError::InvalidResponse(e.to_string()))?;

        let udid = match parsed.udid {
            Some(serde_json::Value::String(s)) => s,
            Some(serde_json::Value::Number(n)) => n.to_string(),
            _ => String::new(),
        };
        if udid.len() < MIN_FINGERPRINT_LEN {
            return Err(SheerIdError::InvalidResponse(format!(
                "unusable udid {udid:?}"
            )));
        }
        Ok(udid)
    }
}

/// 24 hex characters from the thread RNG.
fn random_fingerprint() -> String {
    let bytes: [u8; 12] = rand::thread_rng().gen();
    hex::encode(bytes)
}

#[async_trait]
impl FingerprintProvider for DeviceFingerprint {
    async fn fingerprint(&self) -> String {
        match self.store.get(FINGERPRINT_KEY) {
            Ok(Some(cached)) if cached.len() >= MIN_FINGERPRINT_LEN => {
                debug!("using cached device fingerprint");
                return cached;
            }
            Ok(_) => {}
            Err(e) => warn!(error = %e, "fingerprint cache read failed"),
        }

        let value = match self.fetch_udid().await {
            Ok(udid) => {
                debug!("obtained udid from fingerprint endpoint");
                udid
            }
            Err(e) => {
                debug!(error = %e, "udid fetch failed, generating fallback fingerprint");
                random_fingerprint()
            }
        };

        // Persist before returning so subsequent calls are cache hits. The
        // value is still returned on a store failure; only cross-process
        // stability is lost.
        if let Err(e) = self.store.set(FINGERPRINT_KEY, &value) {
            warn!(error = %e, "failed to persist device fingerprint");
        }
        value
    }
}
