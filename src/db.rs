pub mod store;
pub use store::{Collection, EntityStore, Record};
pub mod seed;
pub mod persistence;
pub use persistence::{JsonFileStore, MemorySnapshotStore, PgSnapshotStore, Snapshot, SnapshotStore};
pub mod persister;
pub use persister::Persister;
