//! The batch-allocating, crash-safe counter engine: a per-key in-memory
//! cursor over a durably checkpointed range, and the registry of enabled
//! keys that owns one such counter per key.

mod counter;
mod error;
mod registry;
mod store;

pub use counter::Counter;
pub use error::EngineError;
pub use registry::Registry;
pub use store::{CheckpointStore, MemoryStore, MySqlStore};
