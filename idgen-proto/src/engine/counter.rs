use std::sync::{Arc, Mutex};

use crate::logsink::LogSink;

use super::error::EngineError;
use super::store::CheckpointStore;

struct CounterState {
    cur: u64,
    max: u64,
}

/// A single key's in-memory cursor over a batch-reserved range, backed by a
/// durable checkpoint row. `next()`/`current()` serialize on an internal
/// mutex held across the database round-trip during reservation, so
/// concurrent callers on the same key observe a strict total order.
pub struct Counter {
    key: String,
    skip: u64,
    store: Arc<dyn CheckpointStore>,
    log: LogSink,
    state: Mutex<CounterState>,
}

impl Counter {
    /// Constructs a counter for `key` and performs its first reservation, so
    /// the counter starts `READY` (`cur < max`) rather than `FRESH`.
    pub fn new(
        key: String,
        skip: u64,
        store: Arc<dyn CheckpointStore>,
        log: LogSink,
    ) -> Result<Self, EngineError> {
        if skip == 0 {
            return Err(EngineError::InvalidSkip(skip));
        }
        let (cur, max) = store.reserve(&key, skip)?;
        log.emit(&format!("reserved range ({cur}, {max}] for key {key}"));
        Ok(Self {
            key,
            skip,
            store,
            log,
            state: Mutex::new(CounterState { cur, max }),
        })
    }

    /// Returns the next identifier for this key, reserving a fresh range
    /// first if the in-memory range is exhausted.
    pub fn next(&self) -> Result<u64, EngineError> {
        let mut state = match self.state.lock() {
            Ok(state) => state,
            Err(e) => return Err(EngineError::LockPoisoned(format!("counter {}: {e}", self.key))),
        };
        if state.cur == state.max {
            let (cur, max) = self.store.reserve(&self.key, self.skip)?;
            self.log
                .emit(&format!("reserved range ({cur}, {max}] for key {}", self.key));
            state.cur = cur;
            state.max = max;
        }
        state.cur += 1;
        Ok(state.cur)
    }

    /// Returns the last identifier issued to a client in this process (or
    /// the initial checkpoint, if none has been issued yet).
    pub fn current(&self) -> Result<u64, EngineError> {
        match self.state.lock() {
            Ok(state) => Ok(state.cur),
            Err(e) => Err(EngineError::LockPoisoned(format!("counter {}: {e}", self.key))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::store::MemoryStore;
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;

    fn counter(key: &str, skip: u64) -> Counter {
        Counter::new(key.to_string(), skip, Arc::new(MemoryStore::new()), LogSink::none()).unwrap()
    }

    #[test]
    fn zero_skip_is_rejected_at_construction() {
        let err = Counter::new(
            "users".into(),
            0,
            Arc::new(MemoryStore::new()),
            LogSink::none(),
        );
        assert!(matches!(err, Err(EngineError::InvalidSkip(0))));
    }

    #[test]
    fn first_next_issues_one() {
        let c = counter("users", 100);
        assert_eq!(c.next().unwrap(), 1);
    }

    #[test]
    fn successive_next_calls_are_strictly_increasing() {
        let c = counter("users", 100);
        let mut prev = c.next().unwrap();
        for _ in 0..200 {
            let id = c.next().unwrap();
            assert!(id > prev);
            prev = id;
        }
    }

    #[test]
    fn current_reflects_the_last_issued_id_without_advancing() {
        let c = counter("users", 100);
        c.next().unwrap();
        c.next().unwrap();
        assert_eq!(c.current().unwrap(), 2);
        assert_eq!(c.current().unwrap(), 2);
    }

    #[test]
    fn exhausting_a_range_triggers_exactly_one_reservation_per_skip_calls() {
        let store = Arc::new(MemoryStore::new());
        let c = Counter::new("users".into(), 10, store, LogSink::none()).unwrap();
        for i in 1..=10u64 {
            assert_eq!(c.next().unwrap(), i);
        }
        // the 11th call must trigger a second reservation and keep climbing
        assert_eq!(c.next().unwrap(), 11);
    }

    #[test]
    fn concurrent_callers_produce_a_contiguous_range_with_no_duplicates() {
        let c = Arc::new(counter("users", 7));
        let threads = 8;
        let per_thread = 50;
        let handles: Vec<_> = (0..threads)
            .map(|_| {
                let c = Arc::clone(&c);
                thread::spawn(move || {
                    (0..per_thread)
                        .map(|_| c.next().unwrap())
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut all_ids = Vec::with_capacity(threads * per_thread);
        for h in handles {
            all_ids.extend(h.join().unwrap());
        }

        let unique: HashSet<_> = all_ids.iter().copied().collect();
        assert_eq!(unique.len(), all_ids.len(), "no id was issued twice");

        all_ids.sort_unstable();
        let expected: Vec<u64> = (1..=(threads * per_thread) as u64).collect();
        assert_eq!(all_ids, expected, "ids form a contiguous range starting at 1");
    }
}
