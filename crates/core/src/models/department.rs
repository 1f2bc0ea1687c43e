//! Department entity model and form draft.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{Entity, EntityDraft, EntityKind, EntityRef, Relation};
use crate::query::ParentScope;
use crate::status::DepartmentStatus;
use crate::types::{EntityId, Timestamp};

/// A department as returned by the `departments` resource.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Department {
    #[serde(rename = "_id")]
    pub id: EntityId,
    pub name: String,
    pub code: String,
    /// Faculty member heading the department.
    #[serde(default)]
    pub head: Option<EntityRef>,
    #[serde(default)]
    pub courses: Vec<EntityRef>,
    pub status: DepartmentStatus,
    #[serde(default)]
    pub created_at: Option<Timestamp>,
    #[serde(default)]
    pub updated_at: Option<Timestamp>,
}

/// Create/update payload for a department.
#[derive(Debug, Clone, Default, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentDraft {
    #[validate(length(min = 3, message = "Name must be at least 3 characters"))]
    pub name: String,
    #[validate(length(min = 2, message = "Code must be at least 2 characters"))]
    pub code: String,
}

impl EntityDraft for DepartmentDraft {}

impl Entity for Department {
    type Status = DepartmentStatus;
    type Draft = DepartmentDraft;

    const KIND: EntityKind = EntityKind::Department;
    const ASSIGNABLE: Option<Relation> = Some(Relation::DepartmentHead);

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn display_name(&self) -> &str {
        &self.name
    }

    fn status(&self) -> DepartmentStatus {
        self.status
    }

    fn parent_id(&self) -> Option<&EntityId> {
        None
    }

    fn to_draft(&self) -> DepartmentDraft {
        DepartmentDraft {
            name: self.name.clone(),
            code: self.code.clone(),
        }
    }

    fn assigned(&self) -> Option<&EntityId> {
        self.head.as_ref().map(|h| &h.id)
    }

    /// Head candidates are the faculty of this department only.
    fn assignment_scope(&self) -> Option<ParentScope> {
        Some(ParentScope::new(EntityKind::Department, self.id.clone()))
    }
}
