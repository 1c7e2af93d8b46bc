use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use mysql::prelude::Queryable;
use mysql::{Pool, TxOpts};

use super::error::EngineError;

/// Durable backing store for checkpoint rows. One implementation talks to a
/// real relational database; another keeps rows in memory so the counter
/// engine is testable without one.
///
/// `reserve` must perform the locking-read-then-insert-or-update as a single
/// transaction and return `(previous_value, new_value)` — the caller treats
/// `(previous_value, new_value]` as the freshly reserved, usable range.
pub trait CheckpointStore: Send + Sync {
    fn reserve(&self, key: &str, delta: u64) -> Result<(u64, u64), EngineError>;
}

/// A `CheckpointStore` backed by a MySQL-compatible database, using a
/// `SELECT ... FOR UPDATE` locking read so concurrent reservers on distinct
/// processes serialize on the row lock rather than racing optimistically.
pub struct MySqlStore {
    pool: Pool,
    select_sql: String,
    insert_sql: String,
    update_sql: String,
}

impl MySqlStore {
    pub fn new(database_url: &str, table_name: &str) -> Result<Self, EngineError> {
        let pool =
            Pool::new(database_url).map_err(|e| EngineError::ReservationFailed(e.to_string()))?;
        Ok(Self {
            select_sql: format!(
                "SELECT `value` FROM `{table_name}` WHERE `key` = ? FOR UPDATE"
            ),
            insert_sql: format!(
                "INSERT INTO `{table_name}` (`key`, `value`, `last_mod_at`) VALUES (?, ?, ?)"
            ),
            update_sql: format!(
                "UPDATE `{table_name}` SET `value` = ?, `last_mod_at` = ? WHERE `key` = ?"
            ),
            pool,
        })
    }
}

impl CheckpointStore for MySqlStore {
    fn reserve(&self, key: &str, delta: u64) -> Result<(u64, u64), EngineError> {
        let mut conn = self
            .pool
            .get_conn()
            .map_err(|e| EngineError::ReservationFailed(e.to_string()))?;
        let mut tx = conn
            .start_transaction(TxOpts::default())
            .map_err(|e| EngineError::ReservationFailed(e.to_string()))?;

        let existing: Option<u64> = tx
            .exec_first(&self.select_sql, (key,))
            .map_err(|e| EngineError::ReservationFailed(e.to_string()))?;
        let now = now_unix();

        let (previous, next) = match existing {
            Some(value) => {
                let next = value
                    .checked_add(delta)
                    .ok_or_else(|| EngineError::ReservationFailed("counter overflow".into()))?;
                tx.exec_drop(&self.update_sql, (next, now, key))
                    .map_err(|e| EngineError::ReservationFailed(e.to_string()))?;
                check_single_row_affected(tx.affected_rows())?;
                (value, next)
            }
            None => {
                tx.exec_drop(&self.insert_sql, (key, delta, now))
                    .map_err(|e| EngineError::ReservationFailed(e.to_string()))?;
                check_single_row_affected(tx.affected_rows())?;
                (0, delta)
            }
        };

        tx.commit()
            .map_err(|e| EngineError::ReservationFailed(e.to_string()))?;
        Ok((previous, next))
    }
}

fn check_single_row_affected(affected: u64) -> Result<(), EngineError> {
    if affected != 1 {
        return Err(EngineError::ReservationFailed(format!(
            "invalid affected row count: {affected}"
        )));
    }
    Ok(())
}

fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock is before the unix epoch")
        .as_secs()
}

/// An in-memory `CheckpointStore`, for tests that exercise the counter and
/// registry without a live database. Not durable across restarts.
#[derive(Default)]
pub struct MemoryStore {
    rows: Mutex<HashMap<String, u64>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CheckpointStore for MemoryStore {
    fn reserve(&self, key: &str, delta: u64) -> Result<(u64, u64), EngineError> {
        let mut rows = match self.rows.lock() {
            Ok(rows) => rows,
            Err(e) => return Err(EngineError::LockPoisoned(format!("memory store: {e}"))),
        };
        let previous = *rows.get(key).unwrap_or(&0);
        let next = previous
            .checked_add(delta)
            .ok_or_else(|| EngineError::ReservationFailed("counter overflow".into()))?;
        rows.insert(key.to_string(), next);
        Ok((previous, next))
    }
}
