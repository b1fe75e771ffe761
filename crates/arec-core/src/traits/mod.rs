//! Core traits for the arec system
//!
//! - [`IpSource`]: Discover the current public IPv4 address
//! - [`DnsProvider`]: Look up, create and update the managed A record

pub mod dns_provider;
pub mod ip_source;

pub use dns_provider::DnsProvider;
pub use ip_source::IpSource;
