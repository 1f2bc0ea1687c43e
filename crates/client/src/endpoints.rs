//! Maps reads and mutation intents onto REST paths and verbs.
//!
//! PATCH for status and relation changes, PUT for full updates, POST for
//! creates and one-shot actions, DELETE for removal.

use campus_core::models::EntityKind;
use campus_core::mutation::{MutationIntent, MutationOp, UserAction};
use campus_core::pagination::PageCursor;
use campus_core::query::ParentScope;

use crate::error::{ApiError, ErrorBody};
use crate::transport::{ApiRequest, Method};

/// Path of a (possibly scoped) listing.
///
/// Users have dedicated scoped listings; every other kind nests under its
/// parent's resource.
pub fn list_path(kind: EntityKind, parent: Option<&ParentScope>) -> String {
    match parent {
        None => kind.resource().to_string(),
        Some(scope) => match (kind, scope.kind) {
            (EntityKind::User, EntityKind::Department) => {
                format!("users/faculty/department/{}", scope.id)
            }
            (EntityKind::User, EntityKind::Course) => format!("users/students/course/{}", scope.id),
            (EntityKind::User, EntityKind::Semester) => {
                format!("users/students/semester/{}", scope.id)
            }
            _ => format!("{}/{}/{}", scope.kind.resource(), scope.id, kind.resource()),
        },
    }
}

pub fn list_request(kind: EntityKind, parent: Option<&ParentScope>, cursor: PageCursor) -> ApiRequest {
    ApiRequest::get(list_path(kind, parent))
        .with_query("page", cursor.page)
        .with_query("limit", cursor.page_size)
}

pub fn get_request(kind: EntityKind, id: &str) -> ApiRequest {
    ApiRequest::get(format!("{}/{id}", kind.resource()))
}

/// Build the request for a mutation.
pub fn mutation_request(intent: &MutationIntent) -> Result<ApiRequest, ApiError> {
    let res = intent.kind.resource();

    if intent.op == MutationOp::Create {
        return Ok(ApiRequest::new(Method::Post, res).with_body(intent.payload.clone()));
    }

    let Some(id) = intent.target_id.as_deref() else {
        return Err(ApiError::Validation(ErrorBody::message(format!(
            "{} {} requires a target id",
            intent.kind.title(),
            intent.op_name()
        ))));
    };

    let (method, path) = match &intent.op {
        MutationOp::Create => (Method::Post, res.to_string()),
        MutationOp::Update => (Method::Put, format!("{res}/{id}")),
        MutationOp::Delete => (Method::Delete, format!("{res}/{id}")),
        MutationOp::ChangeStatus { .. } => (Method::Patch, format!("{res}/{id}/status")),
        MutationOp::AssignRelation { relation, .. } => (
            Method::Patch,
            format!("{}/{id}/{}", relation.owner().resource(), relation.action()),
        ),
        MutationOp::Action(UserAction::Verify) => (Method::Patch, format!("users/{id}/verify")),
        MutationOp::Action(UserAction::ChangeRole(_)) => (Method::Patch, format!("users/{id}/role")),
        MutationOp::Action(UserAction::ResetPassword) => {
            (Method::Post, format!("users/{id}/reset-password"))
        }
    };

    Ok(ApiRequest::new(method, path).with_body(intent.payload.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use campus_core::models::Relation;
    use campus_core::status::{CourseStatus, UserRole};
    use serde_json::json;

    #[test]
    fn scoped_list_paths() {
        let dep = ParentScope::new(EntityKind::Department, "d1");
        assert_eq!(list_path(EntityKind::Course, Some(&dep)), "departments/d1/courses");
        assert_eq!(list_path(EntityKind::User, Some(&dep)), "users/faculty/department/d1");
        assert_eq!(
            list_path(
                EntityKind::User,
                Some(&ParentScope::new(EntityKind::Semester, "s9"))
            ),
            "users/students/semester/s9"
        );
        assert_eq!(list_path(EntityKind::Subject, None), "subjects");
    }

    #[test]
    fn list_request_carries_page_and_limit() {
        let req = list_request(EntityKind::Department, None, PageCursor::new(2, 5));
        assert_eq!(req.method, Method::Get);
        assert_eq!(
            req.query,
            vec![("page".into(), "2".into()), ("limit".into(), "5".into())]
        );
    }

    #[test]
    fn verbs_follow_operation_semantics() {
        let cases = [
            (
                MutationIntent::create(EntityKind::Course, json!({"name": "BSc"})),
                Method::Post,
                "courses",
            ),
            (
                MutationIntent::update(EntityKind::Course, "c1", json!({"name": "BSc"})),
                Method::Put,
                "courses/c1",
            ),
            (MutationIntent::delete(EntityKind::Course, "c1"), Method::Delete, "courses/c1"),
            (
                MutationIntent::change_status(EntityKind::Course, "c1", CourseStatus::Inactive),
                Method::Patch,
                "courses/c1/status",
            ),
            (
                MutationIntent::assign(Relation::DepartmentHead, "d1", None, "u1"),
                Method::Patch,
                "departments/d1/assign-head",
            ),
            (
                MutationIntent::assign(Relation::SubjectFaculty, "s1", None, "u1"),
                Method::Patch,
                "subjects/s1/assign-faculty",
            ),
            (
                MutationIntent::assign(Relation::UserDepartment, "u1", None, "d1"),
                Method::Patch,
                "users/u1/department",
            ),
            (
                MutationIntent::user_action("u1", UserAction::Verify),
                Method::Patch,
                "users/u1/verify",
            ),
            (
                MutationIntent::user_action("u1", UserAction::ChangeRole(UserRole::Admin)),
                Method::Patch,
                "users/u1/role",
            ),
            (
                MutationIntent::user_action("u1", UserAction::ResetPassword),
                Method::Post,
                "users/u1/reset-password",
            ),
        ];

        for (intent, method, path) in cases {
            let req = mutation_request(&intent).unwrap();
            assert_eq!((req.method, req.path.as_str()), (method, path), "{intent:?}");
        }
    }

    #[test]
    fn missing_target_is_rejected() {
        let mut intent = MutationIntent::delete(EntityKind::Department, "d1");
        intent.target_id = None;
        assert!(mutation_request(&intent).is_err());
    }
}
