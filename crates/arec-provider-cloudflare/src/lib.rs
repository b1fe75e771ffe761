// # Cloudflare DNS Provider
//
// This crate provides the Cloudflare implementation of the arec record
// repository.
//
// ## Scope
//
// - ✅ One HTTP request per trait call
// - ✅ Full error propagation to the engine (engine owns retry and timing)
// - ✅ HTTP timeout configured (30 seconds)
// - ✅ Application-level error lists folded into the per-operation error
// - ❌ NO retry logic (owned by DdnsEngine)
// - ❌ NO caching (the cached record is owned by the Reconciler)
// - ❌ NO background tasks
//
// ## Trust Level: Untrusted (DNS Provider)
//
// **Allowed Capabilities**:
// - ✅ Perform HTTP/HTTPS API calls to the Cloudflare API only
// - ✅ Parse provider-specific responses
//
// **Forbidden Capabilities**:
// - ❌ Spawn tasks or threads
// - ❌ Decide whether an update is needed (owned by Reconciler)
//
// ## Security Requirements
//
// - API token NEVER appears in logs or `Debug` output
// - Provider MUST fail fast if token is empty
//
// ## API Reference
//
// - Cloudflare API v4: https://developers.cloudflare.com/api/
// - List Zones: GET `/zones?name=...`
// - List DNS Records: GET `/zones/:zone_id/dns_records?type=A&name=...`
// - Create DNS Record: POST `/zones/:zone_id/dns_records`
// - Overwrite DNS Record: PUT `/zones/:zone_id/dns_records/:record_id`
// - Verify Token: GET `/user/tokens/verify`

mod api;

pub use api::ApiMessage;

use api::{Envelope, RecordBody, TokenStatus, Zone, join_messages};
use arec_core::record::RECORD_TYPE_A;
use arec_core::traits::DnsProvider;
use arec_core::{DnsRecord, Error, Result, ZoneHandle};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::net::Ipv4Addr;
use std::time::Duration;

/// Cloudflare API base URL
pub const CLOUDFLARE_API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Longest slice of a non-JSON error body kept in error messages
const MAX_ERROR_BODY: usize = 200;

/// Why a single API call did not produce a result
///
/// Each trait method folds this into its own [`Error`] variant.
#[derive(Debug, thiserror::Error)]
enum Failure {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("HTTP {status}: {detail}")]
    Status { status: u16, detail: String },

    #[error("provider returned errors: {}", join_messages(.0))]
    Api(Vec<ApiMessage>),

    #[error("unexpected response: {0}")]
    Decode(String),
}

impl Failure {
    /// Map a failed lookup (zones, records, token) onto the core error model
    fn into_lookup_error(self, what: &str) -> Error {
        match self {
            Failure::Transport(msg) => Error::transport(format!("{}: {}", what, msg)),
            Failure::Status {
                status: 401 | 403,
                detail,
            } => Error::auth(format!("{}: {}", what, detail)),
            other => Error::provider("cloudflare", format!("{}: {}", what, other)),
        }
    }
}

/// Cloudflare DNS provider
///
/// # Trust Level: Untrusted
///
/// This provider is isolated, stateless, and single-shot. All coordination
/// (retries, scheduling, caching) is owned by the engine.
///
/// # Security
///
/// The Debug implementation intentionally does NOT expose the API token.
pub struct CloudflareProvider {
    /// Cloudflare API token
    /// ⚠️ NEVER log this value
    api_token: String,

    /// API root, overridable for tests
    base_url: String,

    /// HTTP client for API requests
    client: reqwest::Client,
}

// Custom Debug implementation that hides the API token
impl std::fmt::Debug for CloudflareProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudflareProvider")
            .field("api_token", &"<REDACTED>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl CloudflareProvider {
    /// Create a new Cloudflare provider
    ///
    /// # Parameters
    ///
    /// - `api_token`: Cloudflare API token with Zone:Read and DNS:Edit permissions
    ///
    /// # Errors
    ///
    /// `Error::Config` when the token is empty or the HTTP client cannot be built.
    pub fn new(api_token: impl Into<String>) -> Result<Self> {
        let api_token = api_token.into();
        if api_token.trim().is_empty() {
            return Err(Error::config("Cloudflare API token cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::config(format!("building HTTP client: {}", e)))?;

        Ok(Self {
            api_token,
            base_url: CLOUDFLARE_API_BASE.to_string(),
            client,
        })
    }

    /// Point the provider at a different API root
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Check that the token is accepted and active
    ///
    /// # API Call
    ///
    /// ```http
    /// GET /user/tokens/verify
    /// Authorization: Bearer <token>
    /// ```
    ///
    /// # Returns
    ///
    /// - `Ok(())`: The token is active
    /// - `Err(Error::Authentication)`: The token was rejected or is not active
    pub async fn verify_token(&self) -> Result<()> {
        let request = self.client.get(self.url("/user/tokens/verify"));
        let token: TokenStatus = self
            .send(request)
            .await
            .map_err(|f| f.into_lookup_error("verifying token"))?;

        if token.status != "active" {
            return Err(Error::auth(format!("token status is {}", token.status)));
        }

        tracing::debug!(token_id = %token.id, "API token verified");
        Ok(())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send one authenticated request and unwrap the response envelope
    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> std::result::Result<T, Failure> {
        let response = request
            .bearer_auth(&self.api_token)
            .send()
            .await
            .map_err(|e| Failure::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Failure::Transport(format!("reading response: {}", e)))?;

        if !status.is_success() {
            // Cloudflare usually explains itself in the envelope; fall back to the raw body
            let detail = match serde_json::from_str::<Envelope<serde_json::Value>>(&body) {
                Ok(envelope) if !envelope.errors.is_empty() => join_messages(&envelope.errors),
                _ => body.chars().take(MAX_ERROR_BODY).collect(),
            };
            return Err(Failure::Status {
                status: status.as_u16(),
                detail,
            });
        }

        let envelope: Envelope<T> =
            serde_json::from_str(&body).map_err(|e| Failure::Decode(e.to_string()))?;

        if !envelope.success || !envelope.errors.is_empty() {
            return Err(Failure::Api(envelope.errors));
        }

        envelope
            .result
            .ok_or_else(|| Failure::Decode("missing result".to_string()))
    }
}

#[async_trait]
impl DnsProvider for CloudflareProvider {
    async fn resolve_zone(&self, zone_name: &str) -> Result<ZoneHandle> {
        tracing::debug!(zone = zone_name, "looking up zone ID");

        let request = self
            .client
            .get(self.url("/zones"))
            .query(&[("name", zone_name)]);

        let zones = match self.send::<Vec<Zone>>(request).await {
            Ok(zones) => zones,
            Err(Failure::Status { status: 404, .. }) => {
                return Err(Error::zone_not_found(zone_name));
            }
            Err(f) => return Err(f.into_lookup_error("listing zones")),
        };

        let zone = zones
            .into_iter()
            .next()
            .ok_or_else(|| Error::zone_not_found(zone_name))?;

        tracing::debug!(zone_id = %zone.id, name = %zone.name, "found zone");
        Ok(ZoneHandle::new(zone.id))
    }

    async fn find_record(&self, zone: &ZoneHandle, record_name: &str) -> Result<Option<DnsRecord>> {
        let request = self
            .client
            .get(self.url(&format!("/zones/{}/dns_records", zone)))
            .query(&[("type", RECORD_TYPE_A), ("name", record_name)]);

        let records: Vec<DnsRecord> = self
            .send(request)
            .await
            .map_err(|f| f.into_lookup_error("listing records"))?;

        if records.len() > 1 {
            tracing::warn!(
                record = record_name,
                count = records.len(),
                "multiple A records match, using the first"
            );
        }

        Ok(records.into_iter().next())
    }

    async fn create_record(
        &self,
        zone: &ZoneHandle,
        record_name: &str,
        ttl: u32,
        ip: Ipv4Addr,
    ) -> Result<DnsRecord> {
        let body = RecordBody {
            record_type: RECORD_TYPE_A,
            name: record_name,
            content: ip.to_string(),
            ttl,
            proxied: None,
        };

        let request = self
            .client
            .post(self.url(&format!("/zones/{}/dns_records", zone)))
            .json(&body);

        self.send(request)
            .await
            .map_err(|f| Error::create_failed(f.to_string()))
    }

    async fn update_record(
        &self,
        zone: &ZoneHandle,
        record: &DnsRecord,
        ip: Ipv4Addr,
    ) -> Result<DnsRecord> {
        // PUT replaces the whole record, so everything we know is resent
        let body = RecordBody {
            record_type: &record.record_type,
            name: &record.name,
            content: ip.to_string(),
            ttl: record.ttl,
            proxied: record.proxied,
        };

        let request = self
            .client
            .put(self.url(&format!("/zones/{}/dns_records/{}", zone, record.id)))
            .json(&body);

        self.send(request)
            .await
            .map_err(|f| Error::update_failed(f.to_string()))
    }

    fn provider_name(&self) -> &'static str {
        "cloudflare"
    }
}
