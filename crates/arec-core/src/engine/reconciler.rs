//! Bootstrap and steady-state reconciliation of one A record

use crate::config::RecordConfig;
use crate::context::CallContext;
use crate::error::Result;
use crate::record::{DnsRecord, ReconcileResult, ZoneHandle};
use crate::traits::{DnsProvider, IpSource};
use std::sync::Arc;
use tracing::{debug, info};

/// Holds the zone handle and the last confirmed record state
///
/// A `Reconciler` only exists after a successful bootstrap, so the steady-state
/// cycle always has a zone and a cached record to compare against. The cache is
/// written only after the provider confirmed a change.
pub struct Reconciler {
    ip_source: Arc<dyn IpSource>,
    provider: Arc<dyn DnsProvider>,
    zone: ZoneHandle,
    last_record: DnsRecord,
}

impl Reconciler {
    /// Ensure the record exists and seed the cache from it
    ///
    /// 1. Resolve the zone
    /// 2. Look the record up
    /// 3. If it is missing, resolve the current IP and create it
    ///
    /// An existing record is adopted as-is without consulting the IP source;
    /// the first steady-state cycle brings its content up to date.
    pub async fn bootstrap(
        ip_source: Arc<dyn IpSource>,
        provider: Arc<dyn DnsProvider>,
        record: &RecordConfig,
        ctx: &CallContext,
    ) -> Result<(Self, ReconcileResult)> {
        debug!(zone = %record.zone_name, "getting zone");
        let zone = ctx.run(provider.resolve_zone(&record.zone_name)).await?;

        debug!(%zone, record = %record.name, "getting record");
        let existing = ctx.run(provider.find_record(&zone, &record.name)).await?;

        let result = match existing {
            Some(found) => {
                debug!(id = %found.id, content = %found.content, "record found");
                ReconcileResult::Unchanged(found)
            }
            None => {
                info!(record = %record.name, "record not found, creating");
                let ip = ctx.run(ip_source.current()).await?;
                let created = ctx
                    .run(provider.create_record(&zone, &record.name, record.ttl, ip))
                    .await?;
                info!(id = %created.id, content = %created.content, "record created");
                ReconcileResult::Created(created)
            }
        };

        let reconciler = Self {
            ip_source,
            provider,
            zone,
            last_record: result.record().clone(),
        };

        Ok((reconciler, result))
    }

    /// Run one steady-state cycle
    ///
    /// Performs at most one mutating provider call. On any error the cached
    /// record is left untouched, so the next cycle sees the same difference
    /// and tries again.
    pub async fn reconcile(&mut self, ctx: &CallContext) -> Result<ReconcileResult> {
        let ip = ctx.run(self.ip_source.current()).await?;

        // Exact comparison of literals, no normalization.
        if self.last_record.content == ip.to_string() {
            debug!(%ip, "IP unchanged");
            return Ok(ReconcileResult::Unchanged(self.last_record.clone()));
        }

        info!(old_ip = %self.last_record.content, new_ip = %ip, "IP changed, updating record");
        let updated = ctx
            .run(self.provider.update_record(&self.zone, &self.last_record, ip))
            .await?;

        self.last_record = updated.clone();
        Ok(ReconcileResult::Updated(updated))
    }

    /// The zone resolved during bootstrap
    pub fn zone(&self) -> &ZoneHandle {
        &self.zone
    }

    /// The last record state confirmed by the provider
    pub fn last_record(&self) -> &DnsRecord {
        &self.last_record
    }
}
