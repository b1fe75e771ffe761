// # IP Source Trait
//
// Defines the interface for discovering the host's current public IPv4 address.
//
// ## Implementations
//
// - HTTP trace endpoint: `arec-ip-http` crate
//
// ## Usage
//
// ```rust,ignore
// use arec_core::{CallContext, IpSource};
//
// let ip = ctx.run(source.current()).await?;
// println!("public IP: {ip}");
// ```

use async_trait::async_trait;
use std::net::Ipv4Addr;

/// Trait for IP source implementations
///
/// # Trust Level: Semi-Trusted
///
/// ## Allowed Capabilities
/// - ✅ Perform one HTTP request (or equivalent I/O) per call
/// - ✅ Parse the endpoint's response format
///
/// ## Forbidden Capabilities
/// - ❌ Retry or back off (owned by `DdnsEngine`)
/// - ❌ Cache the previous answer (the engine compares against the record)
/// - ❌ Apply their own cancellation policy; the caller bounds every call with a
///   `CallContext` and drops the future on timeout or shutdown
#[async_trait]
pub trait IpSource: Send + Sync {
    /// Fetch the current public IPv4 address
    ///
    /// # Returns
    ///
    /// - `Ok(Ipv4Addr)`: The address reported by the endpoint
    /// - `Err(Error::MalformedResponse)`: The body could not be parsed
    /// - `Err(Error::Transport | Error::Http)`: The request failed
    async fn current(&self) -> Result<Ipv4Addr, crate::Error>;

    /// Name of the source (for logging/debugging)
    fn source_name(&self) -> &'static str;
}
