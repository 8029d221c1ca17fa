//! Resource lifecycle service.
//!
//! # Responsibility
//! - Validate creation input and derive slugs, paths and default content.
//! - Scope every read and write to the requesting principal's hierarchy.
//! - Synthesize the personal organization and project seed files.
//!
//! # Invariants
//! - Validation runs before any store mutation; a rejected request leaves
//!   the store unchanged.
//! - Listing without an intervening write returns equal sequences.
//! - A project with no stored files gets its seed set written in the same
//!   batch as its first stored file, so the visible listing only grows.
//! - Creation is not idempotent: two identical submissions produce two
//!   distinct entities.

use crate::model::file::ProjectFile;
use crate::model::now_epoch_ms;
use crate::model::organization::Organization;
use crate::model::principal::Principal;
use crate::model::project::Project;
use crate::repo::{ResourceStore, StoreError};
use crate::service::seed::seed_files;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const ORGANIZATION_NAME_REQUIRED: &str = "Organization name is required";
pub const PROJECT_NAME_REQUIRED: &str = "Project name is required";
pub const FILE_NAME_REQUIRED: &str = "File name is required";
pub const FILE_NAME_HAS_SEPARATOR: &str = "File name must not contain '/'";

const ORGANIZATION_NOT_FOUND: &str = "Organization not found";
const PROJECT_NOT_FOUND: &str = "Project not found";
const FILE_NOT_FOUND: &str = "File not found";

/// Caller-facing error category used to pick a response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceErrorKind {
    Unauthenticated,
    Validation,
    NotFound,
    Unexpected,
}

/// Errors from lifecycle service operations.
#[derive(Debug)]
pub enum ServiceError {
    /// No authenticated principal accompanies the request.
    Unauthenticated,
    /// Input rejected; message is safe to show to users.
    Validation(String),
    /// Parent or target resource is unknown to this principal.
    NotFound(&'static str),
    /// Store-level failure.
    Store(StoreError),
    /// Write succeeded but read-back disagrees.
    InconsistentState(&'static str),
}

impl ServiceError {
    pub fn kind(&self) -> ServiceErrorKind {
        match self {
            Self::Unauthenticated => ServiceErrorKind::Unauthenticated,
            Self::Validation(_) => ServiceErrorKind::Validation,
            Self::NotFound(_) => ServiceErrorKind::NotFound,
            Self::Store(_) | Self::InconsistentState(_) => ServiceErrorKind::Unexpected,
        }
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unauthenticated => write!(f, "Unauthorized"),
            Self::Validation(message) => write!(f, "{message}"),
            Self::NotFound(message) => write!(f, "{message}"),
            Self::Store(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent resource state: {details}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound {
                collection: "file", ..
            } => Self::NotFound(FILE_NOT_FOUND),
            other => Self::Store(other),
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Lifecycle service facade over a resource store.
pub struct ResourceService<S: ResourceStore> {
    store: S,
}

impl<S: ResourceStore> ResourceService<S> {
    /// Creates a service using the provided store implementation.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Read access to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Lists the personal organization followed by owned stored ones.
    pub fn list_organizations(&self, principal: &Principal) -> ServiceResult<Vec<Organization>> {
        let mut organizations = vec![Organization::personal_for(principal)];
        organizations.extend(self.store.list_organizations_owned_by(&principal.id)?);
        Ok(organizations)
    }

    /// Creates an organization owned by `principal`.
    pub fn create_organization(
        &mut self,
        principal: &Principal,
        name: &str,
        description: Option<&str>,
    ) -> ServiceResult<Organization> {
        let name = normalize_required(name, ORGANIZATION_NAME_REQUIRED)?;
        let organization = Organization::new(
            principal,
            name,
            normalize_optional(description),
            now_epoch_ms(),
        );

        self.store.insert_organization(&organization)?;
        info!(
            "event=organization_create module=service status=ok organization_id={} owner_id={}",
            organization.id, organization.owner_id
        );
        Ok(organization)
    }

    /// Lists projects of an organization visible to `principal`.
    pub fn list_projects(
        &self,
        principal: &Principal,
        organization_id: &str,
    ) -> ServiceResult<Vec<Project>> {
        self.ensure_organization(principal, organization_id)?;
        Ok(self.store.list_projects(organization_id)?)
    }

    /// Creates a project under an organization visible to `principal`.
    pub fn create_project(
        &mut self,
        principal: &Principal,
        organization_id: &str,
        name: &str,
        description: Option<&str>,
    ) -> ServiceResult<Project> {
        let name = normalize_required(name, PROJECT_NAME_REQUIRED)?;
        self.ensure_organization(principal, organization_id)?;

        let project = Project::new(
            organization_id,
            name,
            normalize_optional(description),
            now_epoch_ms(),
        );
        self.store.insert_project(&project)?;
        info!(
            "event=project_create module=service status=ok project_id={} organization_id={}",
            project.id, project.organization_id
        );
        Ok(project)
    }

    /// Lists stored files, or the seed set when none are stored.
    pub fn list_files(
        &self,
        principal: &Principal,
        organization_id: &str,
        project_id: &str,
    ) -> ServiceResult<Vec<ProjectFile>> {
        let project = self.require_project(principal, organization_id, project_id)?;
        let stored = self.store.list_files(&project.id)?;
        if stored.is_empty() {
            return Ok(seed_files(&project));
        }
        Ok(stored)
    }

    /// Creates a file whose content follows the default content policy.
    pub fn create_file(
        &mut self,
        principal: &Principal,
        organization_id: &str,
        project_id: &str,
        name: &str,
    ) -> ServiceResult<ProjectFile> {
        let name = normalize_file_name(name)?;
        let project = self.require_project(principal, organization_id, project_id)?;

        let (visible, mut batch) = self.visible_files(&project)?;
        let path = ProjectFile::path_for(&name);
        if visible.iter().any(|file| file.path == path) {
            return Err(ServiceError::Validation(format!(
                "A file named `{name}` already exists"
            )));
        }

        let file = ProjectFile::new(project.id.clone(), name, now_epoch_ms());
        batch.push(file.clone());
        self.store.insert_files(&batch)?;
        info!(
            "event=file_create module=service status=ok file_id={} project_id={} seeded={}",
            file.id,
            project.id,
            batch.len() > 1
        );
        Ok(file)
    }

    /// Replaces the content of one file, as saved from the editor.
    pub fn save_file_content(
        &mut self,
        principal: &Principal,
        organization_id: &str,
        project_id: &str,
        file_id: &str,
        content: &str,
    ) -> ServiceResult<ProjectFile> {
        let project = self.require_project(principal, organization_id, project_id)?;

        let (visible, batch) = self.visible_files(&project)?;
        if !visible.iter().any(|file| file.id == file_id) {
            return Err(ServiceError::NotFound(FILE_NOT_FOUND));
        }
        if !batch.is_empty() {
            self.store.insert_files(&batch)?;
        }

        self.store
            .update_file_content(file_id, content, now_epoch_ms())?;
        let saved = self
            .store
            .get_file(file_id)?
            .ok_or(ServiceError::InconsistentState(
                "saved file not found in read-back",
            ))?;
        info!(
            "event=file_save module=service status=ok file_id={} project_id={} bytes={}",
            saved.id,
            project.id,
            content.len()
        );
        Ok(saved)
    }

    /// Returns the files a caller currently sees plus the seed files that
    /// must be written before the next stored file.
    fn visible_files(
        &self,
        project: &Project,
    ) -> ServiceResult<(Vec<ProjectFile>, Vec<ProjectFile>)> {
        let stored = self.store.list_files(&project.id)?;
        if stored.is_empty() {
            let seeds = seed_files(project);
            return Ok((seeds.clone(), seeds));
        }
        Ok((stored, Vec::new()))
    }

    fn ensure_organization(
        &self,
        principal: &Principal,
        organization_id: &str,
    ) -> ServiceResult<()> {
        if organization_id == Organization::personal_id_for(&principal.id) {
            return Ok(());
        }
        match self.store.get_organization(organization_id)? {
            Some(organization) if organization.owner_id == principal.id => Ok(()),
            Some(_) => {
                warn!(
                    "event=scope_denied module=service status=error organization_id={} principal_id={}",
                    organization_id, principal.id
                );
                Err(ServiceError::NotFound(ORGANIZATION_NOT_FOUND))
            }
            None => Err(ServiceError::NotFound(ORGANIZATION_NOT_FOUND)),
        }
    }

    fn require_project(
        &self,
        principal: &Principal,
        organization_id: &str,
        project_id: &str,
    ) -> ServiceResult<Project> {
        self.ensure_organization(principal, organization_id)?;
        self.store
            .get_project(project_id)?
            .filter(|project| project.organization_id == organization_id)
            .ok_or(ServiceError::NotFound(PROJECT_NOT_FOUND))
    }
}

fn normalize_required(value: &str, message: &str) -> ServiceResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::Validation(message.to_string()));
    }
    Ok(trimmed.to_string())
}

fn normalize_optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn normalize_file_name(value: &str) -> ServiceResult<String> {
    let name = normalize_required(value, FILE_NAME_REQUIRED)?;
    if name.contains('/') {
        return Err(ServiceError::Validation(FILE_NAME_HAS_SEPARATOR.to_string()));
    }
    Ok(name)
}
