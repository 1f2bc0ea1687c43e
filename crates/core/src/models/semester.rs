//! Semester entity model and form draft.

use std::borrow::Cow;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::models::{ref_id, Entity, EntityDraft, EntityKind, EntityRef};
use crate::status::SemesterStatus;
use crate::types::{EntityId, Timestamp};

/// A semester within a session.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Semester {
    #[serde(rename = "_id")]
    pub id: EntityId,
    pub semester_name: String,
    pub semester_number: u32,
    /// ISO date or timestamp string as sent by the backend.
    pub start_date: String,
    pub end_date: String,
    pub session: EntityRef,
    #[serde(default)]
    pub course: Option<EntityRef>,
    #[serde(default)]
    pub department: Option<EntityRef>,
    pub status: SemesterStatus,
    #[serde(default)]
    pub subjects: Vec<EntityRef>,
    #[serde(default)]
    pub created_at: Option<Timestamp>,
    #[serde(default)]
    pub updated_at: Option<Timestamp>,
}

/// Create/update payload for a semester.
#[derive(Debug, Clone, Default, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_date_order"))]
pub struct SemesterDraft {
    #[validate(length(min = 1, message = "Semester name is required"))]
    pub semester_name: String,
    #[validate(range(min = 1, message = "Semester number must be at least 1"))]
    pub semester_number: u32,
    #[validate(length(min = 1, message = "Start date is required"))]
    pub start_date: String,
    #[validate(length(min = 1, message = "End date is required"))]
    pub end_date: String,
    #[validate(length(min = 1, message = "Session is required"))]
    pub session: EntityId,
}

/// Parse the calendar-date prefix of an ISO date or timestamp.
fn date_prefix(value: &str) -> Option<NaiveDate> {
    let prefix = value.trim().get(..10)?;
    NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok()
}

fn validate_date_order(draft: &SemesterDraft) -> Result<(), ValidationError> {
    match (date_prefix(&draft.start_date), date_prefix(&draft.end_date)) {
        (Some(start), Some(end)) if end < start => Err(ValidationError::new("date_order")
            .with_message(Cow::Borrowed("End date cannot be before start date"))),
        _ => Ok(()),
    }
}

impl EntityDraft for SemesterDraft {
    fn set_parent(&mut self, parent: Option<EntityId>) {
        self.session = parent.unwrap_or_default();
    }

    fn parent(&self) -> Option<&EntityId> {
        Some(&self.session).filter(|id| !id.is_empty())
    }
}

impl Entity for Semester {
    type Status = SemesterStatus;
    type Draft = SemesterDraft;

    const KIND: EntityKind = EntityKind::Semester;
    const CASCADE: &'static [EntityKind] = &[
        EntityKind::Department,
        EntityKind::Course,
        EntityKind::Session,
    ];

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn display_name(&self) -> &str {
        &self.semester_name
    }

    fn status(&self) -> SemesterStatus {
        self.status
    }

    fn parent_id(&self) -> Option<&EntityId> {
        Some(&self.session.id)
    }

    fn to_draft(&self) -> SemesterDraft {
        SemesterDraft {
            semester_name: self.semester_name.clone(),
            semester_number: self.semester_number,
            start_date: self.start_date.clone(),
            end_date: self.end_date.clone(),
            session: self.session.id.clone(),
        }
    }

    fn cascade_values(&self) -> Vec<Option<EntityId>> {
        vec![
            ref_id(&self.department)
                .or_else(|| self.course.as_ref()?.department.clone()),
            ref_id(&self.course),
            Some(self.session.id.clone()),
        ]
    }
}
