//! 数据访问层（Repository）

mod memory_store;
mod sink;
mod telemetry_repo;

pub use memory_store::MemoryTelemetryStore;
pub use sink::PersistenceSink;
pub use telemetry_repo::PgTelemetryRepository;
