//! Academic session entity model and form draft.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::models::{ref_id, Entity, EntityDraft, EntityKind, EntityRef};
use crate::status::SessionStatus;
use crate::types::{EntityId, Timestamp};

/// An intake of a course spanning several years (e.g. 2023-2026).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    #[serde(rename = "_id")]
    pub id: EntityId,
    pub name: String,
    pub start_year: String,
    pub end_year: String,
    pub course: EntityRef,
    /// Populated by endpoints that embed the course's department.
    #[serde(default)]
    pub department: Option<EntityRef>,
    pub status: SessionStatus,
    #[serde(default)]
    pub current_semester: Option<u32>,
    #[serde(default)]
    pub created_at: Option<Timestamp>,
    #[serde(default)]
    pub updated_at: Option<Timestamp>,
}

/// Create/update payload for a session.
#[derive(Debug, Clone, Default, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_year_order"))]
pub struct SessionDraft {
    #[validate(length(min = 1, message = "Session name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "Start year is required"))]
    pub start_year: String,
    #[validate(length(min = 1, message = "End year is required"))]
    pub end_year: String,
    #[validate(length(min = 1, message = "Course is required"))]
    pub course: EntityId,
}

fn validate_year_order(draft: &SessionDraft) -> Result<(), ValidationError> {
    let start = draft.start_year.trim().parse::<i32>();
    let end = draft.end_year.trim().parse::<i32>();
    match (start, end) {
        (Ok(start), Ok(end)) if end < start => Err(ValidationError::new("year_order")
            .with_message(Cow::Borrowed("End year cannot be before start year"))),
        _ => Ok(()),
    }
}

impl EntityDraft for SessionDraft {
    fn set_parent(&mut self, parent: Option<EntityId>) {
        self.course = parent.unwrap_or_default();
    }

    fn parent(&self) -> Option<&EntityId> {
        Some(&self.course).filter(|id| !id.is_empty())
    }
}

impl Entity for Session {
    type Status = SessionStatus;
    type Draft = SessionDraft;

    const KIND: EntityKind = EntityKind::Session;
    const CASCADE: &'static [EntityKind] = &[EntityKind::Department, EntityKind::Course];

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn display_name(&self) -> &str {
        &self.name
    }

    fn status(&self) -> SessionStatus {
        self.status
    }

    fn parent_id(&self) -> Option<&EntityId> {
        Some(&self.course.id)
    }

    fn to_draft(&self) -> SessionDraft {
        SessionDraft {
            name: self.name.clone(),
            start_year: self.start_year.clone(),
            end_year: self.end_year.clone(),
            course: self.course.id.clone(),
        }
    }

    fn cascade_values(&self) -> Vec<Option<EntityId>> {
        let department = ref_id(&self.department).or_else(|| self.course.department.clone());
        vec![department, Some(self.course.id.clone())]
    }
}
