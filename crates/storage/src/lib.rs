pub mod error;
pub mod memory;
pub mod sink;

pub use error::StorageError;
pub use memory::{MemoryStore, SnapshotFile};
pub use sink::{read_events, JsonLinesSink};
