//! SQLite migration registry and executor.
//!
//! # Invariants
//! - `version` values are strictly increasing.
//! - Applied version is mirrored to `PRAGMA user_version`.
//! - Pending migrations are applied in one transaction; a failure keeps the
//!   previous version.

use crate::db::{BootstrapError, BootstrapResult};
use log::info;
use rusqlite::Connection;

#[derive(Debug, Clone, Copy)]
struct Migration {
    version: u32,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        sql: include_str!("0001_resources.sql"),
    },
    Migration {
        version: 2,
        sql: include_str!("0002_immutable_parents.sql"),
    },
];

/// Returns the latest migration version known by this binary.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

/// Applies all pending migrations on the provided connection.
pub fn apply_migrations(conn: &mut Connection) -> BootstrapResult<()> {
    let current: u32 = conn
        .query_row("PRAGMA user_version;", [], |row| row.get(0))
        .map_err(BootstrapError::Connect)?;
    let supported = latest_version();
    if current > supported {
        return Err(BootstrapError::SchemaTooNew {
            found: current,
            supported,
        });
    }

    let pending: Vec<&Migration> = MIGRATIONS
        .iter()
        .filter(|migration| migration.version > current)
        .collect();
    let Some(target) = pending.last().map(|migration| migration.version) else {
        return Ok(());
    };
    let failed_at = |version: u32| move |source| BootstrapError::Migration { version, source };

    let tx = conn.transaction().map_err(failed_at(target))?;
    for migration in &pending {
        tx.execute_batch(migration.sql)
            .and_then(|()| tx.pragma_update(None, "user_version", migration.version))
            .map_err(failed_at(migration.version))?;
    }
    tx.commit().map_err(failed_at(target))?;

    info!("event=db_migrate module=db status=ok from={current} to={target}");
    Ok(())
}
