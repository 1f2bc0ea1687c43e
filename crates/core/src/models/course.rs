//! Course entity model and form draft.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{Entity, EntityDraft, EntityKind, EntityRef};
use crate::status::{CourseStatus, CourseType};
use crate::types::{EntityId, Timestamp};

/// A course offered by a department.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    #[serde(rename = "_id")]
    pub id: EntityId,
    pub name: String,
    pub code: String,
    pub department: EntityRef,
    /// Duration in years.
    pub duration: u32,
    #[serde(rename = "type")]
    pub course_type: CourseType,
    #[serde(default)]
    pub sessions: Vec<EntityRef>,
    pub status: CourseStatus,
    #[serde(default)]
    pub created_at: Option<Timestamp>,
    #[serde(default)]
    pub updated_at: Option<Timestamp>,
}

/// Create/update payload for a course.
#[derive(Debug, Clone, Default, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CourseDraft {
    #[validate(length(min = 3, message = "Name must be at least 3 characters"))]
    pub name: String,
    #[validate(length(min = 2, message = "Code must be at least 2 characters"))]
    pub code: String,
    #[validate(length(min = 1, message = "Department is required"))]
    pub department: EntityId,
    #[validate(range(min = 1, max = 10, message = "Duration must be between 1 and 10 years"))]
    pub duration: u32,
    #[serde(rename = "type")]
    #[validate(required(message = "Course type is required"))]
    pub course_type: Option<CourseType>,
}

impl EntityDraft for CourseDraft {
    fn set_parent(&mut self, parent: Option<EntityId>) {
        self.department = parent.unwrap_or_default();
    }

    fn parent(&self) -> Option<&EntityId> {
        Some(&self.department).filter(|id| !id.is_empty())
    }
}

impl Entity for Course {
    type Status = CourseStatus;
    type Draft = CourseDraft;

    const KIND: EntityKind = EntityKind::Course;
    const CASCADE: &'static [EntityKind] = &[EntityKind::Department];

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn display_name(&self) -> &str {
        &self.name
    }

    fn status(&self) -> CourseStatus {
        self.status
    }

    fn parent_id(&self) -> Option<&EntityId> {
        Some(&self.department.id)
    }

    fn to_draft(&self) -> CourseDraft {
        CourseDraft {
            name: self.name.clone(),
            code: self.code.clone(),
            department: self.department.id.clone(),
            duration: self.duration,
            course_type: Some(self.course_type),
        }
    }

    fn cascade_values(&self) -> Vec<Option<EntityId>> {
        vec![Some(self.department.id.clone())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_draft() -> CourseDraft {
        CourseDraft {
            name: "Bachelor of Science".into(),
            code: "BSC".into(),
            department: "d1".into(),
            duration: 3,
            course_type: Some(CourseType::Undergraduate),
        }
    }

    #[test]
    fn deserializes_with_embedded_department() {
        let json = serde_json::json!({
            "_id": "c1",
            "name": "Bachelor of Science",
            "code": "BSC",
            "department": {"_id": "d1", "name": "Science", "code": "SC"},
            "duration": 3,
            "type": "UG",
            "sessions": ["s1", "s2"],
            "status": "ACTIVE"
        });
        let course: Course = serde_json::from_value(json).unwrap();
        assert_eq!(course.parent_id().map(String::as_str), Some("d1"));
        assert_eq!(course.sessions.len(), 2);
        assert_eq!(course.course_type, CourseType::Undergraduate);
        assert_eq!(course.cascade_values(), vec![Some("d1".to_string())]);
    }

    #[test]
    fn draft_serializes_type_field() {
        let value = serde_json::to_value(valid_draft()).unwrap();
        assert_eq!(value["type"], "UG");
        assert_eq!(value["department"], "d1");
    }

    #[test]
    fn duration_range_enforced() {
        assert!(valid_draft().validate().is_ok());

        let mut draft = valid_draft();
        draft.duration = 0;
        assert!(draft.validate().is_err());

        draft.duration = 11;
        assert!(draft.validate().is_err());

        draft.duration = 10;
        assert!(draft.validate().is_ok());
    }

    #[test]
    fn department_and_type_required() {
        let mut draft = valid_draft();
        draft.set_parent(None);
        draft.course_type = None;
        let errors = draft.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("department"));
        assert_eq!(fields.len(), 2);
        assert!(draft.parent().is_none());
    }
}
