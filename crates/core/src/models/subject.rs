//! Subject entity model and form draft.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{ref_id, Entity, EntityDraft, EntityKind, EntityRef, Relation};
use crate::query::ParentScope;
use crate::status::SubjectStatus;
use crate::types::{EntityId, Timestamp};

/// Delivery flags of a subject.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectMetadata {
    #[serde(default)]
    pub is_elective: bool,
    #[serde(default)]
    pub has_lab: bool,
    #[serde(default)]
    pub is_online: bool,
}

/// A subject taught in a semester.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    #[serde(rename = "_id")]
    pub id: EntityId,
    pub name: String,
    pub code: String,
    pub credits: u32,
    pub status: SubjectStatus,
    #[serde(default)]
    pub metadata: SubjectMetadata,
    #[serde(default)]
    pub faculty: Option<EntityRef>,
    pub semester: EntityRef,
    #[serde(default)]
    pub session: Option<EntityRef>,
    #[serde(default)]
    pub course: Option<EntityRef>,
    #[serde(default)]
    pub department: Option<EntityRef>,
    #[serde(default)]
    pub created_at: Option<Timestamp>,
    #[serde(default)]
    pub updated_at: Option<Timestamp>,
}

/// Create/update payload for a subject.
#[derive(Debug, Clone, Default, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubjectDraft {
    #[validate(length(min = 1, message = "Subject name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "Subject code is required"))]
    pub code: String,
    #[validate(range(min = 1, message = "Credits must be at least 1"))]
    pub credits: u32,
    pub metadata: SubjectMetadata,
    #[validate(length(min = 1, message = "Semester is required"))]
    pub semester: EntityId,
}

impl EntityDraft for SubjectDraft {
    fn set_parent(&mut self, parent: Option<EntityId>) {
        self.semester = parent.unwrap_or_default();
    }

    fn parent(&self) -> Option<&EntityId> {
        Some(&self.semester).filter(|id| !id.is_empty())
    }
}

impl Subject {
    /// The subject's own department, or the one of its embedded course.
    pub fn department_id(&self) -> Option<&EntityId> {
        self.department
            .as_ref()
            .map(|d| &d.id)
            .or_else(|| self.course.as_ref()?.department.as_ref())
    }
}

impl Entity for Subject {
    type Status = SubjectStatus;
    type Draft = SubjectDraft;

    const KIND: EntityKind = EntityKind::Subject;
    const CASCADE: &'static [EntityKind] = &[
        EntityKind::Department,
        EntityKind::Course,
        EntityKind::Session,
        EntityKind::Semester,
    ];
    const ASSIGNABLE: Option<Relation> = Some(Relation::SubjectFaculty);

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn display_name(&self) -> &str {
        &self.name
    }

    fn status(&self) -> SubjectStatus {
        self.status
    }

    fn parent_id(&self) -> Option<&EntityId> {
        Some(&self.semester.id)
    }

    fn to_draft(&self) -> SubjectDraft {
        SubjectDraft {
            name: self.name.clone(),
            code: self.code.clone(),
            credits: self.credits,
            metadata: self.metadata,
            semester: self.semester.id.clone(),
        }
    }

    fn cascade_values(&self) -> Vec<Option<EntityId>> {
        vec![
            self.department_id().cloned(),
            ref_id(&self.course),
            ref_id(&self.session),
            Some(self.semester.id.clone()),
        ]
    }

    fn assigned(&self) -> Option<&EntityId> {
        self.faculty.as_ref().map(|f| &f.id)
    }

    /// Faculty candidates come from the subject's department.
    fn assignment_scope(&self) -> Option<ParentScope> {
        self.department_id()
            .map(|id| ParentScope::new(EntityKind::Department, id.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_with_partial_ancestry() {
        let json = serde_json::json!({
            "_id": "sub1",
            "name": "Databases",
            "code": "CS301",
            "credits": 4,
            "status": "ACTIVE",
            "metadata": {"isElective": true, "hasLab": true},
            "faculty": null,
            "semester": "sem1",
            "department": {"_id": "d1", "name": "CS"},
            "course": {"_id": "c2", "name": "BSc"}
        });
        let subject: Subject = serde_json::from_value(json).unwrap();
        assert!(subject.metadata.is_elective);
        assert!(!subject.metadata.is_online);
        assert_eq!(
            subject.cascade_values(),
            vec![
                Some("d1".to_string()),
                Some("c2".to_string()),
                None,
                Some("sem1".to_string()),
            ]
        );
        assert_eq!(
            subject.assignment_scope(),
            Some(ParentScope::new(EntityKind::Department, "d1"))
        );
    }

    #[test]
    fn department_falls_back_to_embedded_course() {
        let json = serde_json::json!({
            "_id": "sub1",
            "name": "Databases",
            "code": "CS301",
            "credits": 4,
            "status": "ACTIVE",
            "semester": "sem1",
            "course": {"_id": "c2", "name": "BSc", "department": "d1"}
        });
        let subject: Subject = serde_json::from_value(json).unwrap();
        assert_eq!(subject.department_id().map(String::as_str), Some("d1"));
        assert_eq!(
            subject.assignment_scope(),
            Some(ParentScope::new(EntityKind::Department, "d1"))
        );
        assert_eq!(subject.cascade_values()[0].as_deref(), Some("d1"));
    }

    #[test]
    fn credits_must_be_positive() {
        let draft = SubjectDraft {
            name: "Databases".into(),
            code: "CS301".into(),
            credits: 0,
            metadata: SubjectMetadata::default(),
            semester: "sem1".into(),
        };
        let errors = draft.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("credits"));
    }

    #[test]
    fn draft_nests_metadata() {
        let draft = SubjectDraft {
            metadata: SubjectMetadata {
                is_online: true,
                ..Default::default()
            },
            ..Default::default()
        };
        let value = serde_json::to_value(draft).unwrap();
        assert_eq!(value["metadata"]["isOnline"], true);
        assert_eq!(value["metadata"]["hasLab"], false);
    }
}
