//! Record model shared by the engine and the DNS providers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The only record type this system manages
pub const RECORD_TYPE_A: &str = "A";

/// Opaque provider identifier for a DNS zone
///
/// Resolved once from the zone name during bootstrap and never changed after.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ZoneHandle(String);

impl ZoneHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ZoneHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The provider's view of one DNS record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsRecord {
    /// Provider-assigned ID (empty until created)
    #[serde(default)]
    pub id: String,

    /// Record type, always "A" here
    #[serde(rename = "type")]
    pub record_type: String,

    /// Fully-qualified record name
    pub name: String,

    /// Time-to-live in seconds
    pub ttl: u32,

    /// IPv4 address literal
    pub content: String,

    /// Whether the provider proxies traffic for this record
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxied: Option<bool>,

    /// Last modification time reported by the provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_on: Option<DateTime<Utc>>,
}

impl DnsRecord {
    /// Build an unsaved A record
    pub fn a(name: impl Into<String>, ttl: u32, content: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            record_type: RECORD_TYPE_A.to_string(),
            name: name.into(),
            ttl,
            content: content.into(),
            proxied: None,
            modified_on: None,
        }
    }

    /// Set the provider-assigned ID
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }
}

/// Outcome of one bootstrap or reconciliation pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileResult {
    /// Published content already matched (or an existing record was adopted)
    Unchanged(DnsRecord),
    /// The record did not exist and was created
    Created(DnsRecord),
    /// The record content was replaced
    Updated(DnsRecord),
}

impl ReconcileResult {
    /// The record as it stands after this pass
    pub fn record(&self) -> &DnsRecord {
        match self {
            Self::Unchanged(record) | Self::Created(record) | Self::Updated(record) => record,
        }
    }

    /// Short label for logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Unchanged(_) => "unchanged",
            Self::Created(_) => "created",
            Self::Updated(_) => "updated",
        }
    }
}
