use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::logsink::LogSink;

use super::counter::Counter;
use super::error::EngineError;
use super::store::CheckpointStore;

/// The set of enabled keys, each mapped to one row-backed counter. Built
/// once via [`Registry::enable_keys`]; individual counters are not
/// hot-added afterwards. The mapping is read under a reader-preferring
/// shared lock so concurrent lookups for distinct keys do not contend with
/// each other — per-key serialization happens inside the counter itself.
pub struct Registry {
    store: Arc<dyn CheckpointStore>,
    skip: u64,
    log: LogSink,
    counters: RwLock<HashMap<String, Arc<Counter>>>,
}

impl Registry {
    pub fn new(store: Arc<dyn CheckpointStore>, skip: u64, log: LogSink) -> Self {
        Self {
            store,
            skip,
            log,
            counters: RwLock::new(HashMap::new()),
        }
    }

    /// Atomically constructs a new mapping containing one initialized
    /// counter per key, each having performed its first reservation. If any
    /// counter fails to initialize, the whole call fails and the previous
    /// mapping is left untouched.
    pub fn enable_keys(&self, keys: &[String]) -> Result<(), EngineError> {
        let mut next = HashMap::with_capacity(keys.len());
        for key in keys {
            let counter = Counter::new(
                key.clone(),
                self.skip,
                Arc::clone(&self.store),
                self.log.clone(),
            )?;
            next.insert(key.clone(), Arc::new(counter));
        }
        match self.counters.write() {
            Ok(mut counters) => *counters = next,
            Err(e) => return Err(EngineError::LockPoisoned(format!("registry: {e}"))),
        }
        Ok(())
    }

    pub fn next(&self, key: &str) -> Result<u64, EngineError> {
        self.lookup(key)?.next()
    }

    pub fn current(&self, key: &str) -> Result<u64, EngineError> {
        self.lookup(key)?.current()
    }

    /// Releases the database handle. Takes `self` by value so the registry
    /// (and every counter it owns, and the store `Arc` they all share) is
    /// dropped here rather than lingering for the rest of the caller's scope.
    pub fn close(self) {
        drop(self);
    }

    fn lookup(&self, key: &str) -> Result<Arc<Counter>, EngineError> {
        let counters = match self.counters.read() {
            Ok(counters) => counters,
            Err(e) => return Err(EngineError::LockPoisoned(format!("registry: {e}"))),
        };
        counters.get(key).cloned().ok_or(EngineError::KeyDoesNotExist)
    }
}
