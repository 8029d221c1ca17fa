//! Core domain logic for CodeConnect.
//! This crate owns the resource hierarchy invariants; outer layers only map
//! requests onto it.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status, LoggingOptions};
pub use model::file::{FileKind, ProjectFile};
pub use model::language::{default_content, language_of, LanguageTag};
pub use model::organization::{Organization, OrganizationRole};
pub use model::principal::Principal;
pub use model::project::Project;
pub use model::slug::slugify;
pub use model::ResourceId;
pub use repo::{
    InMemoryResourceStore, ResourceStore, SqliteResourceStore, StoreError, StoreResult,
};
pub use service::resource_service::{
    ResourceService, ServiceError, ServiceErrorKind, ServiceResult,
};

/// Minimal health-check API.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
