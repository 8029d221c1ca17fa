//! Resource Store contracts and implementations.
//!
//! # Responsibility
//! - Define the storage seam the lifecycle service depends on.
//! - Provide an in-memory store (default, tests) and a SQLite store.
//!
//! # Invariants
//! - Stores persist fully built entities; derivation and validation happen
//!   in the service layer before any store call.
//! - Listing order is deterministic: `created_at ASC`, then insertion order.
//! - Ids are unique per collection and slugs are unique per collection.
//! - `insert_files` is all-or-nothing.

pub mod memory_store;
pub mod sqlite_store;

use crate::db::BootstrapError;
use crate::model::file::ProjectFile;
use crate::model::organization::Organization;
use crate::model::project::Project;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub use memory_store::InMemoryResourceStore;
pub use sqlite_store::SqliteResourceStore;

pub type StoreResult<T> = Result<T, StoreError>;

/// Errors from resource store operations.
#[derive(Debug)]
pub enum StoreError {
    /// Database could not be opened or migrated.
    Bootstrap(BootstrapError),
    /// Query failed for a reason other than a constraint.
    Sqlite(rusqlite::Error),
    /// Target row does not exist.
    NotFound {
        collection: &'static str,
        id: String,
    },
    /// Uniqueness or integrity constraint rejected the write.
    Conflict(String),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Persisted data cannot be converted to a valid record.
    InvalidData(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bootstrap(err) => write!(f, "{err}"),
            Self::Sqlite(err) => write!(f, "resource query failed: {err}"),
            Self::NotFound { collection, id } => write!(f, "{collection} not found: {id}"),
            Self::Conflict(message) => write!(f, "store conflict: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "resource store requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "resource store requires table `{table}`")
            }
            Self::InvalidData(message) => write!(f, "invalid resource data: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Bootstrap(err) => Some(err),
            Self::Sqlite(err) => Some(err),
            _ => None,
        }
    }
}

impl From<BootstrapError> for StoreError {
    fn from(value: BootstrapError) -> Self {
        Self::Bootstrap(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::SqliteFailure(code, message)
                if code.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Self::Conflict(message.unwrap_or_else(|| code.to_string()))
            }
            other => Self::Sqlite(other),
        }
    }
}

/// Storage seam for the Organization → Project → File hierarchy.
pub trait ResourceStore {
    /// Persists one organization.
    fn insert_organization(&mut self, organization: &Organization) -> StoreResult<()>;
    /// Loads one stored organization by id.
    fn get_organization(&self, id: &str) -> StoreResult<Option<Organization>>;
    /// Lists stored organizations owned by `owner_id`.
    fn list_organizations_owned_by(&self, owner_id: &str) -> StoreResult<Vec<Organization>>;
    fn count_organizations(&self) -> StoreResult<usize>;

    /// Persists one project.
    fn insert_project(&mut self, project: &Project) -> StoreResult<()>;
    /// Loads one project by id.
    fn get_project(&self, id: &str) -> StoreResult<Option<Project>>;
    /// Lists projects of one organization.
    fn list_projects(&self, organization_id: &str) -> StoreResult<Vec<Project>>;
    fn count_projects(&self) -> StoreResult<usize>;

    /// Persists a batch of files atomically.
    fn insert_files(&mut self, files: &[ProjectFile]) -> StoreResult<()>;
    /// Loads one file by id.
    fn get_file(&self, id: &str) -> StoreResult<Option<ProjectFile>>;
    /// Lists files of one project.
    fn list_files(&self, project_id: &str) -> StoreResult<Vec<ProjectFile>>;
    /// Replaces file content and bumps `updated_at`.
    fn update_file_content(&mut self, id: &str, content: &str, updated_at: i64)
        -> StoreResult<()>;
    fn count_files(&self) -> StoreResult<usize>;
}

impl<S: ResourceStore + ?Sized> ResourceStore for Box<S> {
    fn insert_organization(&mut self, organization: &Organization) -> StoreResult<()> {
        (**self).insert_organization(organization)
    }

    fn get_organization(&self, id: &str) -> StoreResult<Option<Organization>> {
        (**self).get_organization(id)
    }

    fn list_organizations_owned_by(&self, owner_id: &str) -> StoreResult<Vec<Organization>> {
        (**self).list_organizations_owned_by(owner_id)
    }

    fn count_organizations(&self) -> StoreResult<usize> {
        (**self).count_organizations()
    }

    fn insert_project(&mut self, project: &Project) -> StoreResult<()> {
        (**self).insert_project(project)
    }

    fn get_project(&self, id: &str) -> StoreResult<Option<Project>> {
        (**self).get_project(id)
    }

    fn list_projects(&self, organization_id: &str) -> StoreResult<Vec<Project>> {
        (**self).list_projects(organization_id)
    }

    fn count_projects(&self) -> StoreResult<usize> {
        (**self).count_projects()
    }

    fn insert_files(&mut self, files: &[ProjectFile]) -> StoreResult<()> {
        (**self).insert_files(files)
    }

    fn get_file(&self, id: &str) -> StoreResult<Option<ProjectFile>> {
        (**self).get_file(id)
    }

    fn list_files(&self, project_id: &str) -> StoreResult<Vec<ProjectFile>> {
        (**self).list_files(project_id)
    }

    fn update_file_content(
        &mut self,
        id: &str,
        content: &str,
        updated_at: i64,
    ) -> StoreResult<()> {
        (**self).update_file_content(id, content, updated_at)
    }

    fn count_files(&self) -> StoreResult<usize> {
        (**self).count_files()
    }
}
