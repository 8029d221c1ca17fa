//! Project domain model.

use crate::model::slug::slugify;
use crate::model::{new_resource_id, ResourceId};
use serde::{Deserialize, Serialize};

/// Project record scoped to exactly one organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: ResourceId,
    /// Owning organization; immutable after creation.
    pub organization_id: ResourceId,
    pub name: String,
    pub description: Option<String>,
    pub slug: String,
    pub created_at: i64,
}

impl Project {
    /// Builds a new project with generated id and slug.
    pub fn new(
        organization_id: impl Into<ResourceId>,
        name: impl Into<String>,
        description: Option<String>,
        created_at: i64,
    ) -> Self {
        let name = name.into();
        Self {
            id: new_resource_id(),
            organization_id: organization_id.into(),
            slug: slugify(&name),
            name,
            description,
            created_at,
        }
    }
}
