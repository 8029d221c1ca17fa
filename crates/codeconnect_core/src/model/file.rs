//! Project file domain model.
//!
//! # Invariants
//! - `path` is always `/` followed by `name`; nested directories are not
//!   modeled yet.
//! - `content` is present for `FileKind::File` only.
//! - `language` is derived from `name` and never stored.

use crate::model::language::{default_content, language_of, LanguageTag};
use crate::model::{new_resource_id, ResourceId};
use serde::{Deserialize, Serialize};

/// Entry type discriminator. `Folder` is reserved and never produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    File,
    Folder,
}

impl FileKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Folder => "folder",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "file" => Some(Self::File),
            "folder" => Some(Self::Folder),
            _ => None,
        }
    }
}

/// File record scoped to exactly one project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectFile {
    pub id: ResourceId,
    /// Owning project; immutable after creation.
    pub project_id: ResourceId,
    pub name: String,
    pub path: String,
    /// Serialized as `type` to match the editor's file shape.
    #[serde(rename = "type")]
    pub kind: FileKind,
    pub content: Option<String>,
    pub language: LanguageTag,
    pub created_at: i64,
    pub updated_at: i64,
}

impl ProjectFile {
    /// Builds a new file whose content comes from the default content policy.
    pub fn new(project_id: impl Into<ResourceId>, name: impl Into<String>, created_at: i64) -> Self {
        let name = name.into();
        let content = default_content(&name).to_string();
        Self::with_content(new_resource_id(), project_id, name, content, created_at)
    }

    /// Builds a file with explicit id and content.
    ///
    /// Used for seed files whose ids are derived rather than generated.
    pub fn with_content(
        id: impl Into<ResourceId>,
        project_id: impl Into<ResourceId>,
        name: impl Into<String>,
        content: impl Into<String>,
        created_at: i64,
    ) -> Self {
        let name = name.into();
        Self {
            id: id.into(),
            project_id: project_id.into(),
            path: Self::path_for(&name),
            language: language_of(&name),
            kind: FileKind::File,
            content: Some(content.into()),
            name,
            created_at,
            updated_at: created_at,
        }
    }

    /// Derives the project-relative path for a file name.
    pub fn path_for(name: &str) -> String {
        format!("/{name}")
    }
}
