// # HTTP IP Source
//
// This crate provides the IP source used by the arec daemon: it asks an
// external IP-echo endpoint which address our requests come from.
//
// ## Endpoint Format
//
// The default endpoint is Cloudflare's trace page, which answers with plain
// text `key=value` lines:
//
// ```text
// fl=123abc
// h=1.1.1.1
// ip=198.51.100.7
// ts=1700000000.000
// ```
//
// Only the `ip` key is used. Any endpoint speaking the same format can be
// configured with [`HttpIpSource::with_url`].
//
// ## Non-Goals
//
// One request per call. Retry, caching and polling all belong to the engine.

use arec_core::traits::IpSource;
use arec_core::{Error, Result};

use std::net::Ipv4Addr;
use std::time::Duration;

/// Default IP-echo endpoint
pub const DEFAULT_TRACE_URL: &str = "https://1.1.1.1/cdn-cgi/trace";

/// Upper bound for a single request, independent of the caller's context
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// IP source backed by an HTTP trace endpoint
pub struct HttpIpSource {
    /// URL to fetch the trace from
    url: String,

    /// HTTP client
    client: reqwest::Client,
}

impl HttpIpSource {
    /// Create a source querying [`DEFAULT_TRACE_URL`]
    pub fn new() -> Self {
        Self::with_url(DEFAULT_TRACE_URL)
    }

    /// Create a source querying a custom endpoint
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()
                .unwrap_or_default(),
        }
    }

    /// The endpoint this source queries
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetch the raw trace body
    async fn fetch_trace(&self) -> Result<String> {
        tracing::debug!(url = %self.url, "getting IP from trace endpoint");

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| Error::transport(format!("request to {} failed: {}", self.url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::http(
                status.as_u16(),
                status.canonical_reason().unwrap_or("unexpected status"),
            ));
        }

        tracing::debug!("got response from trace endpoint");

        response
            .text()
            .await
            .map_err(|e| Error::transport(format!("reading response: {}", e)))
    }
}

impl Default for HttpIpSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl IpSource for HttpIpSource {
    async fn current(&self) -> Result<Ipv4Addr> {
        let body = self.fetch_trace().await?;
        parse_trace(&body)
    }

    fn source_name(&self) -> &'static str {
        "http"
    }
}

/// Extract the `ip` value from a trace body
///
/// The body must contain at least one newline. Every line holding a `=` must
/// be exactly one `key=value` pair; other lines (such as the empty line after
/// the final newline) are skipped. If a key repeats, the last value wins.
pub fn parse_trace(body: &str) -> Result<Ipv4Addr> {
    let lines: Vec<&str> = body.split('\n').collect();
    if lines.len() < 2 {
        return Err(Error::malformed(format!(
            "data doesn't look like key/value pairs, got: {:?}",
            body
        )));
    }

    let mut ip = None;
    for line in lines {
        let line = line.trim_end_matches('\r');
        if !line.contains('=') {
            continue;
        }
        tracing::trace!(line, "parsing key/value pair");

        let pair: Vec<&str> = line.split('=').collect();
        let [key, value] = pair.as_slice() else {
            return Err(Error::malformed(format!(
                "unable to get key/value from {:?}",
                line
            )));
        };

        if *key == "ip" {
            ip = Some(*value);
        }
    }

    let value = ip.ok_or_else(|| Error::malformed("no ip key in trace response"))?;
    value
        .parse()
        .map_err(|_| Error::malformed(format!("not an IPv4 address: {:?}", value)))
}
