//! Protocol framing, counter engine, and registry for a networked monotonic
//! identifier allocator.
//!
//! Identifiers are 64-bit non-negative integers, strictly increasing per
//! key, checkpointed in a relational database so a key's high-water mark
//! survives process restarts. There is no cross-key ordering and no
//! gap-free guarantee: a crash between an in-memory issuance and the next
//! reservation leaves a gap of at most `skip`.
//!
//! Known limitation: neither the protocol reader nor the dispatcher that
//! sits on top of it enforces a maximum request argument count or length. A
//! hostile client can exhaust memory with a very large declared argument
//! count or length; the host process is expected to impose connection
//! quotas and idle timeouts instead.

pub mod config;
pub mod encoding;
pub mod engine;
pub mod logsink;
pub mod protocol;
pub mod schema;
