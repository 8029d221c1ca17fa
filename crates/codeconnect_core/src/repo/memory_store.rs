//! Process-local resource store.
//!
//! Records live for the lifetime of the value; nothing is written to disk.

use crate::model::file::{FileKind, ProjectFile};
use crate::model::organization::Organization;
use crate::model::project::Project;
use crate::repo::{ResourceStore, StoreError, StoreResult};

/// In-memory `ResourceStore` backed by insertion-ordered vectors.
#[derive(Debug, Default, Clone)]
pub struct InMemoryResourceStore {
    organizations: Vec<Organization>,
    projects: Vec<Project>,
    files: Vec<ProjectFile>,
}

impl InMemoryResourceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ResourceStore for InMemoryResourceStore {
    fn insert_organization(&mut self, organization: &Organization) -> StoreResult<()> {
        if self
            .organizations
            .iter()
            .any(|item| item.id == organization.id || item.slug == organization.slug)
        {
            return Err(StoreError::Conflict(format!(
                "organization id or slug already exists: {}",
                organization.id
            )));
        }
        self.organizations.push(organization.clone());
        Ok(())
    }

    fn get_organization(&self, id: &str) -> StoreResult<Option<Organization>> {
        Ok(self.organizations.iter().find(|item| item.id == id).cloned())
    }

    fn list_organizations_owned_by(&self, owner_id: &str) -> StoreResult<Vec<Organization>> {
        Ok(ordered(
            self.organizations
                .iter()
                .filter(|item| item.owner_id == owner_id),
            |item| item.created_at,
        ))
    }

    fn count_organizations(&self) -> StoreResult<usize> {
        Ok(self.organizations.len())
    }

    fn insert_project(&mut self, project: &Project) -> StoreResult<()> {
        if self
            .projects
            .iter()
            .any(|item| item.id == project.id || item.slug == project.slug)
        {
            return Err(StoreError::Conflict(format!(
                "project id or slug already exists: {}",
                project.id
            )));
        }
        self.projects.push(project.clone());
        Ok(())
    }

    fn get_project(&self, id: &str) -> StoreResult<Option<Project>> {
        Ok(self.projects.iter().find(|item| item.id == id).cloned())
    }

    fn list_projects(&self, organization_id: &str) -> StoreResult<Vec<Project>> {
        Ok(ordered(
            self.projects
                .iter()
                .filter(|item| item.organization_id == organization_id),
            |item| item.created_at,
        ))
    }

    fn count_projects(&self) -> StoreResult<usize> {
        Ok(self.projects.len())
    }

    fn insert_files(&mut self, files: &[ProjectFile]) -> StoreResult<()> {
        // Validate the whole batch before touching state.
        for (index, file) in files.iter().enumerate() {
            if !self.projects.iter().any(|item| item.id == file.project_id) {
                return Err(StoreError::Conflict(format!(
                    "file {} references unknown project {}",
                    file.id, file.project_id
                )));
            }
            let clashes = |other: &ProjectFile| {
                other.id == file.id
                    || (other.project_id == file.project_id && other.path == file.path)
            };
            if self.files.iter().any(clashes) || files[..index].iter().any(clashes) {
                return Err(StoreError::Conflict(format!(
                    "file id or path already exists: {} {}",
                    file.id, file.path
                )));
            }
        }
        self.files.extend_from_slice(files);
        Ok(())
    }

    fn get_file(&self, id: &str) -> StoreResult<Option<ProjectFile>> {
        Ok(self.files.iter().find(|item| item.id == id).cloned())
    }

    fn list_files(&self, project_id: &str) -> StoreResult<Vec<ProjectFile>> {
        Ok(ordered(
            self.files.iter().filter(|item| item.project_id == project_id),
            |item| item.created_at,
        ))
    }

    fn update_file_content(
        &mut self,
        id: &str,
        content: &str,
        updated_at: i64,
    ) -> StoreResult<()> {
        let file = self
            .files
            .iter_mut()
            .find(|item| item.id == id && item.kind == FileKind::File)
            .ok_or_else(|| StoreError::NotFound {
                collection: "file",
                id: id.to_string(),
            })?;
        file.content = Some(content.to_string());
        file.updated_at = updated_at;
        Ok(())
    }

    fn count_files(&self) -> StoreResult<usize> {
        Ok(self.files.len())
    }
}

/// Clones matching records sorted by creation time; the sort is stable so
/// ties keep insertion order.
fn ordered<'a, T: Clone + 'a>(
    items: impl Iterator<Item = &'a T>,
    created_at: impl Fn(&T) -> i64,
) -> Vec<T> {
    let mut result: Vec<T> = items.cloned().collect();
    result.sort_by_key(|item| created_at(item));
    result
}
