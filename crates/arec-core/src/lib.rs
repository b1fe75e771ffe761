// # arec-core
//
// Core library for the arec dynamic DNS updater.
//
// ## Architecture Overview
//
// This library keeps one DNS "A" record in sync with the host's public IPv4
// address:
// - **IpSource**: Trait for discovering the current public IP
// - **DnsProvider**: Trait for looking up, creating and updating the record
// - **Reconciler**: Bootstrap plus the compare-and-update cycle, owning the
//   cached record
// - **DdnsEngine**: Timer, bootstrap retry and shutdown lifecycle
// - **CallContext**: Deadline + cancellation + tracing span for every
//   collaborator call
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Core logic is separate from implementations
// 2. **Sequential Reconciliation**: One cycle at a time, at most one mutation
// 3. **Confirmed State Only**: The cache advances only on provider success
// 4. **Library-First**: All core functionality can be used as a library

pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod record;
pub mod traits;

// Re-export core types for convenience
pub use config::{DdnsConfig, EngineConfig, RecordConfig};
pub use context::{CallContext, Shutdown, ShutdownListener};
pub use engine::{DdnsEngine, EngineEvent, Phase, Reconciler};
pub use error::{Error, Result};
pub use record::{DnsRecord, ReconcileResult, ZoneHandle};
pub use traits::{DnsProvider, IpSource};
