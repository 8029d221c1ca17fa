//! SQLite connection bootstrap for the persistent resource store.
//!
//! A connection handed out here enforces foreign keys and carries every
//! migration in [`migrations`]; the applied version lives in
//! `PRAGMA user_version`.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type BootstrapResult<T> = Result<T, BootstrapError>;

/// Why a database could not be made ready for the resource store.
#[derive(Debug)]
pub enum BootstrapError {
    /// Opening the database or configuring the connection failed.
    Connect(rusqlite::Error),
    /// Migration `version` failed; none of the pending migrations were kept.
    Migration {
        version: u32,
        source: rusqlite::Error,
    },
    /// The file was migrated by a newer build.
    SchemaTooNew { found: u32, supported: u32 },
}

impl Display for BootstrapError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Connect(err) => write!(f, "cannot open resource database: {err}"),
            Self::Migration { version, source } => {
                write!(f, "resource schema migration {version} failed: {source}")
            }
            Self::SchemaTooNew { found, supported } => write!(
                f,
                "resource database is at schema {found}; this build supports up to {supported}"
            ),
        }
    }
}

impl Error for BootstrapError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Connect(err) | Self::Migration { source: err, .. } => Some(err),
            Self::SchemaTooNew { .. } => None,
        }
    }
}
