// # DNS Provider Trait
//
// Defines the record repository the engine reconciles against.
//
// ## Implementations
//
// - Cloudflare: `arec-provider-cloudflare` crate
//
// ## Usage
//
// ```rust,ignore
// use arec_core::{CallContext, DnsProvider};
//
// let zone = ctx.run(provider.resolve_zone("example.com")).await?;
// match ctx.run(provider.find_record(&zone, "home.example.com")).await? {
//     Some(record) => println!("{} -> {}", record.name, record.content),
//     None => println!("no record yet"),
// }
// ```

use crate::record::{DnsRecord, ZoneHandle};
use async_trait::async_trait;
use std::net::Ipv4Addr;

/// Trait for DNS provider implementations
///
/// Every method performs a single logical provider operation. The engine
/// decides *whether* to call `create_record` or `update_record`; providers
/// never compare addresses themselves.
///
/// # Trust Level: Untrusted
///
/// ## Allowed Capabilities
/// - ✅ Perform HTTP/HTTPS API calls to their endpoints only
/// - ✅ Parse provider-specific responses
/// - ✅ Return success or failure (engine handles retry)
///
/// ## Forbidden Capabilities
/// - ❌ Spawn tasks or threads
/// - ❌ Implement retry logic or backoff (owned by `DdnsEngine`)
/// - ❌ Cache records or zones (the engine owns the cached record)
/// - ❌ Decide whether an update is needed (owned by `Reconciler`)
///
/// ## Error Folding
///
/// `create_record` reports every failure as `Error::CreateFailed` and
/// `update_record` as `Error::UpdateFailed`, whether the request never reached
/// the provider or the provider answered with an error list.
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// Resolve a zone name (e.g. "example.com") to its provider handle
    ///
    /// # Returns
    ///
    /// - `Ok(ZoneHandle)`: The zone's identifier
    /// - `Err(Error::ZoneNotFound)`: No zone carries that name
    async fn resolve_zone(&self, zone_name: &str) -> Result<ZoneHandle, crate::Error>;

    /// Look up the A record with exactly this name
    ///
    /// Multiple matches are not an error: the first record returned by the
    /// provider is used and the rest are ignored.
    async fn find_record(
        &self,
        zone: &ZoneHandle,
        record_name: &str,
    ) -> Result<Option<DnsRecord>, crate::Error>;

    /// Create a new A record pointing at `ip`
    async fn create_record(
        &self,
        zone: &ZoneHandle,
        record_name: &str,
        ttl: u32,
        ip: Ipv4Addr,
    ) -> Result<DnsRecord, crate::Error>;

    /// Replace the content of an existing record with `ip`
    ///
    /// The full record (type, name, TTL) is resent; the record is identified
    /// by its provider-assigned ID.
    async fn update_record(
        &self,
        zone: &ZoneHandle,
        record: &DnsRecord,
        ip: Ipv4Addr,
    ) -> Result<DnsRecord, crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}
