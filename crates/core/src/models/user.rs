//! User entity model and profile draft.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{Entity, EntityDraft, EntityKind, EntityRef, Relation};
use crate::status::{UserRole, UserStatus};
use crate::types::{EntityId, Timestamp};

/// A user account (admin, faculty, or student).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: EntityId,
    pub full_name: String,
    pub email: String,
    pub role: UserRole,
    pub status: UserStatus,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub department: Option<EntityRef>,
    #[serde(default)]
    pub last_login: Option<Timestamp>,
    #[serde(default)]
    pub created_at: Option<Timestamp>,
    #[serde(default)]
    pub updated_at: Option<Timestamp>,
}

/// Profile update payload. Accounts are created through registration,
/// never from the dashboard.
#[derive(Debug, Clone, Default, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UserDraft {
    #[validate(length(min = 3, message = "Name must be at least 3 characters"))]
    pub full_name: String,
    #[validate(email(message = "Enter a valid email address"))]
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl EntityDraft for UserDraft {}

impl Entity for User {
    type Status = UserStatus;
    type Draft = UserDraft;

    const KIND: EntityKind = EntityKind::User;
    const ASSIGNABLE: Option<Relation> = Some(Relation::UserDepartment);
    const CREATABLE: bool = false;

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn display_name(&self) -> &str {
        &self.full_name
    }

    fn status(&self) -> UserStatus {
        self.status
    }

    fn parent_id(&self) -> Option<&EntityId> {
        self.department.as_ref().map(|d| &d.id)
    }

    fn to_draft(&self) -> UserDraft {
        UserDraft {
            full_name: self.full_name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
        }
    }

    fn assigned(&self) -> Option<&EntityId> {
        self.department.as_ref().map(|d| &d.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_backend_payload() {
        let json = serde_json::json!({
            "_id": "u1",
            "fullName": "Ada Lovelace",
            "email": "ada@example.edu",
            "role": "FACULTY",
            "status": "ACTIVE",
            "isVerified": true,
            "department": {"_id": "d1", "name": "Mathematics"}
        });
        let user: User = serde_json::from_value(json).unwrap();
        assert_eq!(user.role, UserRole::Faculty);
        assert_eq!(user.assigned().map(String::as_str), Some("d1"));
    }

    #[test]
    fn email_is_validated() {
        let draft = UserDraft {
            full_name: "Ada Lovelace".into(),
            email: "not-an-email".into(),
            phone: None,
        };
        let errors = draft.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("email"));
    }

    #[test]
    fn users_are_not_creatable() {
        assert!(!<User as Entity>::CREATABLE);
    }
}
