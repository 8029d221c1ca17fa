//! Organization domain model.
//!
//! # Responsibility
//! - Define the top-level ownership scope for projects.
//! - Synthesize the per-principal personal organization.
//!
//! # Invariants
//! - `name` is trimmed and never blank.
//! - `role` is always `owner` for the creating principal.
//! - The personal organization is derived from the principal and is never
//!   written to a store.

use crate::model::principal::Principal;
use crate::model::slug::slugify;
use crate::model::{new_resource_id, ResourceId};
use serde::{Deserialize, Serialize};

const PERSONAL_ORG_ID_PREFIX: &str = "personal-org-";
const PERSONAL_ORG_SLUG: &str = "personal-org";
const PERSONAL_ORG_DESCRIPTION: &str = "Your personal workspace";

/// Membership role of the principal within an organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrganizationRole {
    /// Creator and sole member.
    Owner,
}

impl OrganizationRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Owner => "owner",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "owner" => Some(Self::Owner),
            _ => None,
        }
    }
}

/// Organization record as listed and returned by creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    pub id: ResourceId,
    pub name: String,
    pub description: Option<String>,
    pub slug: String,
    pub role: OrganizationRole,
    pub owner_id: String,
    /// Epoch milliseconds, set once at creation.
    pub created_at: i64,
}

impl Organization {
    /// Builds a new owned organization with generated id and slug.
    ///
    /// Callers are expected to pass an already normalized `name`.
    pub fn new(
        owner: &Principal,
        name: impl Into<String>,
        description: Option<String>,
        created_at: i64,
    ) -> Self {
        let name = name.into();
        Self {
            id: new_resource_id(),
            slug: slugify(&name),
            name,
            description,
            role: OrganizationRole::Owner,
            owner_id: owner.id.clone(),
            created_at,
        }
    }

    /// Synthesizes the personal workspace of `principal`.
    ///
    /// Output depends only on the principal, so repeated calls are equal.
    pub fn personal_for(principal: &Principal) -> Self {
        Self {
            id: Self::personal_id_for(&principal.id),
            name: format!("{}'s Org", principal.handle()),
            description: Some(PERSONAL_ORG_DESCRIPTION.to_string()),
            slug: PERSONAL_ORG_SLUG.to_string(),
            role: OrganizationRole::Owner,
            owner_id: principal.id.clone(),
            created_at: principal.created_at,
        }
    }

    /// Id of the personal organization for a principal id.
    pub fn personal_id_for(principal_id: &str) -> ResourceId {
        format!("{PERSONAL_ORG_ID_PREFIX}{principal_id}")
    }
}

#[cfg(test)]
mod tests {
    use super::{Organization, OrganizationRole};
    use crate::model::principal::Principal;

    #[test]
    fn personal_org_is_deterministic() {
        let principal = Principal::new("u-7").with_email("kim@example.com");
        let first = Organization::personal_for(&principal);
        let second = Organization::personal_for(&principal);

        assert_eq!(first, second);
        assert_eq!(first.id, "personal-org-u-7");
        assert_eq!(first.name, "kim's Org");
        assert_eq!(first.role, OrganizationRole::Owner);
        assert_eq!(first.owner_id, "u-7");
    }

    #[test]
    fn serializes_with_camel_case_fields() {
        let principal = Principal::new("u-1");
        let org = Organization::new(&principal, "Team", None, 42);
        let json = serde_json::to_value(&org).unwrap();

        assert_eq!(json["ownerId"], "u-1");
        assert_eq!(json["createdAt"], 42);
        assert_eq!(json["role"], "owner");
        assert!(json["description"].is_null());
    }
}
