//! One-shot schema bootstrap for the checkpoint table. Idempotent only to
//! the extent the underlying database's `CREATE TABLE` is — callers should
//! expect this to fail with an "already exists" class of error on a second
//! run and ignore it.

use mysql::prelude::Queryable;
use mysql::Pool;

use crate::engine::EngineError;

/// `last_mod_at` is `BIGINT UNSIGNED`, not the `INT UNSIGNED` the original
/// engine used — the engine always computed and wrote a 64-bit
/// seconds-since-epoch value, so the 32-bit column was the bug, not the
/// value (see SPEC_FULL.md §9).
pub fn create_schema(database_url: &str, table_name: &str) -> Result<(), EngineError> {
    let pool =
        Pool::new(database_url).map_err(|e| EngineError::ReservationFailed(e.to_string()))?;
    let mut conn = pool
        .get_conn()
        .map_err(|e| EngineError::ReservationFailed(e.to_string()))?;

    let ddl = format!(
        "CREATE TABLE `{table_name}` (\n\
         \t`id` INT UNSIGNED NOT NULL AUTO_INCREMENT,\n\
         \t`key` VARCHAR(32) NOT NULL,\n\
         \t`value` BIGINT UNSIGNED NOT NULL,\n\
         \t`last_mod_at` BIGINT UNSIGNED NOT NULL,\n\
         \tPRIMARY KEY (`id`),\n\
         \tUNIQUE KEY `key` (`key`)\n\
         ) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4"
    );

    conn.query_drop(ddl)
        .map_err(|e| EngineError::ReservationFailed(e.to_string()))
}
