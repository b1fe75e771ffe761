//! Test doubles and common utilities for contract tests
//!
//! The doubles are cheap to clone; clones share counters and state, so a test
//! can hand one copy to the engine and keep another for assertions.

#![allow(dead_code)]

use arec_core::config::{DdnsConfig, EngineConfig, RecordConfig};
use arec_core::context::{CallContext, Shutdown, ShutdownListener};
use arec_core::engine::EngineEvent;
use arec_core::error::{Error, Result};
use arec_core::record::{DnsRecord, ZoneHandle};
use arec_core::traits::{DnsProvider, IpSource};
use std::collections::{HashMap, VecDeque};
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

pub const ZONE_NAME: &str = "example.com";
pub const ZONE_ID: &str = "zone-1";
pub const RECORD_NAME: &str = "home.example.com";

/// An IpSource whose answer the test controls
#[derive(Clone)]
pub struct StubIpSource {
    answer: Arc<Mutex<Result<Ipv4Addr>>>,
    delay: Arc<Mutex<Option<Duration>>>,
    calls: Arc<AtomicUsize>,
}

impl StubIpSource {
    pub fn new(ip: &str) -> Self {
        Self {
            answer: Arc::new(Mutex::new(Ok(ip.parse().expect("valid IPv4 literal")))),
            delay: Arc::new(Mutex::new(None)),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Answer with `ip` from now on
    pub fn set_ip(&self, ip: &str) {
        *self.answer.lock().unwrap() = Ok(ip.parse().expect("valid IPv4 literal"));
    }

    /// Fail with `error` from now on
    pub fn fail_with(&self, error: Error) {
        *self.answer.lock().unwrap() = Err(error);
    }

    /// Sleep this long before answering
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    /// Get the number of times current() was called
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl IpSource for StubIpSource {
    async fn current(&self) -> Result<Ipv4Addr> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.answer.lock().unwrap().clone()
    }

    fn source_name(&self) -> &'static str {
        "stub"
    }
}

/// Provider operations, for scripting failures and inspecting calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    ResolveZone,
    FindRecord,
    CreateRecord,
    UpdateRecord,
}

/// A recorded provider call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderCall {
    ResolveZone(String),
    FindRecord(String),
    CreateRecord { name: String, ttl: u32, content: String },
    UpdateRecord { id: String, ttl: u32, content: String },
}

#[derive(Default)]
struct ProviderState {
    zones: HashMap<String, String>,
    records: Vec<DnsRecord>,
    calls: Vec<ProviderCall>,
    next_failures: HashMap<Op, VecDeque<Error>>,
    persistent_failures: HashMap<Op, Error>,
    next_id: usize,
}

/// An in-memory DnsProvider that tracks calls
#[derive(Clone)]
pub struct MockDnsProvider {
    state: Arc<Mutex<ProviderState>>,
}

impl MockDnsProvider {
    /// A provider that knows `example.com` and has no records yet
    pub fn new() -> Self {
        let mut state = ProviderState::default();
        state.zones.insert(ZONE_NAME.to_string(), ZONE_ID.to_string());
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// A provider that already publishes `home.example.com` → `content`
    pub fn with_record(content: &str) -> Self {
        let provider = Self::new();
        provider.insert_record(DnsRecord::a(RECORD_NAME, 300, content).with_id("rec-existing"));
        provider
    }

    pub fn insert_record(&self, record: DnsRecord) {
        self.state.lock().unwrap().records.push(record);
    }

    /// Fail the next call of `op` with `error` (queued failures stack up)
    pub fn fail_next(&self, op: Op, error: Error) {
        self.state
            .lock()
            .unwrap()
            .next_failures
            .entry(op)
            .or_default()
            .push_back(error);
    }

    /// Fail every call of `op` until [`MockDnsProvider::recover`]
    pub fn fail_always(&self, op: Op, error: Error) {
        self.state.lock().unwrap().persistent_failures.insert(op, error);
    }

    pub fn recover(&self, op: Op) {
        self.state.lock().unwrap().persistent_failures.remove(&op);
    }

    pub fn calls(&self) -> Vec<ProviderCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn call_count(&self, op: Op) -> usize {
        self.calls()
            .iter()
            .filter(|call| {
                matches!(
                    (op, call),
                    (Op::ResolveZone, ProviderCall::ResolveZone(_))
                        | (Op::FindRecord, ProviderCall::FindRecord(_))
                        | (Op::CreateRecord, ProviderCall::CreateRecord { .. })
                        | (Op::UpdateRecord, ProviderCall::UpdateRecord { .. })
                )
            })
            .count()
    }

    /// Number of create + update calls
    pub fn mutation_count(&self) -> usize {
        self.call_count(Op::CreateRecord) + self.call_count(Op::UpdateRecord)
    }

    /// What the provider currently publishes
    pub fn published(&self) -> Vec<DnsRecord> {
        self.state.lock().unwrap().records.clone()
    }

    fn begin(&self, op: Op, call: ProviderCall) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call);

        if let Some(error) = state.next_failures.get_mut(&op).and_then(VecDeque::pop_front) {
            return Err(error);
        }
        if let Some(error) = state.persistent_failures.get(&op) {
            return Err(error.clone());
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl DnsProvider for MockDnsProvider {
    async fn resolve_zone(&self, zone_name: &str) -> Result<ZoneHandle> {
        self.begin(Op::ResolveZone, ProviderCall::ResolveZone(zone_name.to_string()))?;

        let state = self.state.lock().unwrap();
        state
            .zones
            .get(zone_name)
            .map(ZoneHandle::new)
            .ok_or_else(|| Error::zone_not_found(zone_name))
    }

    async fn find_record(&self, zone: &ZoneHandle, record_name: &str) -> Result<Option<DnsRecord>> {
        self.begin(Op::FindRecord, ProviderCall::FindRecord(record_name.to_string()))?;
        assert_eq!(zone.as_str(), ZONE_ID, "engine must use the resolved zone handle");

        let state = self.state.lock().unwrap();
        Ok(state
            .records
            .iter()
            .find(|record| record.record_type == "A" && record.name == record_name)
            .cloned())
    }

    async fn create_record(
        &self,
        _zone: &ZoneHandle,
        record_name: &str,
        ttl: u32,
        ip: Ipv4Addr,
    ) -> Result<DnsRecord> {
        self.begin(
            Op::CreateRecord,
            ProviderCall::CreateRecord {
                name: record_name.to_string(),
                ttl,
                content: ip.to_string(),
            },
        )?;

        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let record = DnsRecord::a(record_name, ttl, ip.to_string())
            .with_id(format!("rec-{}", state.next_id));
        state.records.push(record.clone());
        Ok(record)
    }

    async fn update_record(
        &self,
        _zone: &ZoneHandle,
        record: &DnsRecord,
        ip: Ipv4Addr,
    ) -> Result<DnsRecord> {
        self.begin(
            Op::UpdateRecord,
            ProviderCall::UpdateRecord {
                id: record.id.clone(),
                ttl: record.ttl,
                content: ip.to_string(),
            },
        )?;

        let mut state = self.state.lock().unwrap();
        let stored = state
            .records
            .iter_mut()
            .find(|stored| stored.id == record.id)
            .ok_or_else(|| Error::update_failed(format!("no record with id {}", record.id)))?;
        stored.content = ip.to_string();
        Ok(stored.clone())
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// Helper to create a minimal DdnsConfig for testing
pub fn minimal_config() -> DdnsConfig {
    DdnsConfig {
        record: RecordConfig::new(ZONE_NAME, RECORD_NAME),
        engine: EngineConfig {
            interval_secs: 60,
            cycle_timeout_secs: 30,
            bootstrap_timeout_secs: 30,
            bootstrap_retry_delay_secs: 60,
            event_channel_capacity: 100,
        },
    }
}

/// A context that never gets cancelled, for driving the reconciler directly
pub fn test_context(timeout: Duration) -> (Shutdown, CallContext) {
    let (shutdown, listener) = Shutdown::new();
    let ctx = CallContext::new(&listener, timeout, tracing::Span::none());
    (shutdown, ctx)
}

/// Fresh shutdown pair
pub fn shutdown_pair() -> (Shutdown, ShutdownListener) {
    Shutdown::new()
}

/// Collect every event still buffered in the channel
pub fn drain_events(rx: &mut mpsc::Receiver<EngineEvent>) -> Vec<EngineEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// Just the phase transitions, in order
pub fn phases(events: &[EngineEvent]) -> Vec<arec_core::Phase> {
    events
        .iter()
        .filter_map(|event| match event {
            EngineEvent::PhaseChanged { phase } => Some(*phase),
            _ => None,
        })
        .collect()
}
