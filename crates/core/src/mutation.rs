//! Write operations and the cache entries each one makes stale.

use serde_json::{json, Value};

use crate::models::{EntityKind, Relation};
use crate::query::{KeyPattern, ParentScope};
use crate::status::{UserRole, WireEnum};
use crate::types::EntityId;

/// User-only side actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserAction {
    Verify,
    ChangeRole(UserRole),
    ResetPassword,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationOp {
    Create,
    Update,
    Delete,
    /// Move to a new lifecycle status (wire value, e.g. `"INACTIVE"`).
    ChangeStatus { status: &'static str },
    AssignRelation {
        relation: Relation,
        previous: Option<EntityId>,
        next: EntityId,
    },
    Action(UserAction),
}

/// A fully described write, ready to be executed by the resource client.
#[derive(Debug, Clone, PartialEq)]
pub struct MutationIntent {
    pub kind: EntityKind,
    pub op: MutationOp,
    /// Entity being modified. `None` only for creates.
    pub target_id: Option<EntityId>,
    /// JSON request body. `Value::Null` when the operation has none.
    pub payload: Value,
    /// Parent the entity belongs to after the write.
    pub parent: Option<ParentScope>,
    /// Parent the entity belonged to before an update that moved it.
    pub previous_parent: Option<ParentScope>,
}

impl MutationIntent {
    fn new(kind: EntityKind, op: MutationOp, target_id: Option<EntityId>, payload: Value) -> Self {
        Self {
            kind,
            op,
            target_id,
            payload,
            parent: None,
            previous_parent: None,
        }
    }

    pub fn create(kind: EntityKind, payload: Value) -> Self {
        Self::new(kind, MutationOp::Create, None, payload)
    }

    pub fn update(kind: EntityKind, id: impl Into<EntityId>, payload: Value) -> Self {
        Self::new(kind, MutationOp::Update, Some(id.into()), payload)
    }

    pub fn delete(kind: EntityKind, id: impl Into<EntityId>) -> Self {
        Self::new(kind, MutationOp::Delete, Some(id.into()), Value::Null)
    }

    pub fn change_status<S: WireEnum>(kind: EntityKind, id: impl Into<EntityId>, status: S) -> Self {
        Self::new(
            kind,
            MutationOp::ChangeStatus {
                status: status.as_str(),
            },
            Some(id.into()),
            json!({ "status": status.as_str() }),
        )
    }

    /// Assign `next` as the holder of `relation` on `owner_id`.
    pub fn assign(
        relation: Relation,
        owner_id: impl Into<EntityId>,
        previous: Option<EntityId>,
        next: impl Into<EntityId>,
    ) -> Self {
        let next = next.into();
        let payload = json!({ relation.field(): next.clone() });
        Self::new(
            relation.owner(),
            MutationOp::AssignRelation {
                relation,
                previous,
                next,
            },
            Some(owner_id.into()),
            payload,
        )
    }

    pub fn user_action(user_id: impl Into<EntityId>, action: UserAction) -> Self {
        let payload = match action {
            UserAction::ChangeRole(role) => json!({ "role": role.as_str() }),
            UserAction::Verify | UserAction::ResetPassword => Value::Null,
        };
        Self::new(
            EntityKind::User,
            MutationOp::Action(action),
            Some(user_id.into()),
            payload,
        )
    }

    /// Record the parent the entity belongs to after the write.
    pub fn with_parent(mut self, parent: Option<ParentScope>) -> Self {
        self.parent = parent;
        self
    }

    /// Record the parent an update moves the entity away from.
    pub fn with_previous_parent(mut self, previous: Option<ParentScope>) -> Self {
        self.previous_parent = previous;
        self
    }

    /// Cache entries that are stale once this write has succeeded.
    ///
    /// Always the whole kind (every page and scope) plus the target entity.
    /// Parent scopes and relation endpoints are listed explicitly so that a
    /// listing cached under the parent's kind is covered too.
    pub fn invalidations(&self) -> Vec<KeyPattern> {
        let mut patterns = vec![KeyPattern::Kind(self.kind)];

        if let Some(id) = &self.target_id {
            patterns.push(KeyPattern::Entity {
                kind: self.kind,
                id: id.clone(),
            });
        }

        for parent in [&self.parent, &self.previous_parent].into_iter().flatten() {
            let pattern = KeyPattern::Scoped {
                kind: self.kind,
                parent: parent.clone(),
            };
            if !patterns.contains(&pattern) {
                patterns.push(pattern);
            }
        }

        if let MutationOp::AssignRelation {
            relation,
            previous,
            next,
        } = &self.op
        {
            let target = relation.target();
            for id in previous.iter().chain(std::iter::once(next)) {
                let pattern = KeyPattern::Entity {
                    kind: target,
                    id: id.clone(),
                };
                if !patterns.contains(&pattern) {
                    patterns.push(pattern);
                }
            }
        }

        patterns
    }

    /// Success toast text, e.g. `"Department created successfully"`.
    pub fn success_message(&self) -> String {
        let title = self.kind.title();
        match &self.op {
            MutationOp::Create => format!("{title} created successfully"),
            MutationOp::Update => format!("{title} updated successfully"),
            MutationOp::Delete => format!("{title} deleted successfully"),
            MutationOp::ChangeStatus { .. } => format!("{title} status updated successfully"),
            MutationOp::AssignRelation { relation, .. } => match relation {
                Relation::DepartmentHead => "Department head assigned successfully".to_string(),
                Relation::SubjectFaculty => "Faculty assigned successfully".to_string(),
                Relation::UserDepartment => "User department updated successfully".to_string(),
            },
            MutationOp::Action(UserAction::Verify) => "User verified successfully".to_string(),
            MutationOp::Action(UserAction::ChangeRole(role)) => {
                format!("User role changed to {}", role.label())
            }
            MutationOp::Action(UserAction::ResetPassword) => {
                "Password reset email sent".to_string()
            }
        }
    }

    /// Short operation name for logs.
    pub fn op_name(&self) -> &'static str {
        match &self.op {
            MutationOp::Create => "create",
            MutationOp::Update => "update",
            MutationOp::Delete => "delete",
            MutationOp::ChangeStatus { .. } => "change_status",
            MutationOp::AssignRelation { .. } => "assign",
            MutationOp::Action(UserAction::Verify) => "verify",
            MutationOp::Action(UserAction::ChangeRole(_)) => "change_role",
            MutationOp::Action(UserAction::ResetPassword) => "reset_password",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pagination::PageCursor;
    use crate::query::QueryKey;
    use crate::status::DepartmentStatus;

    fn matches_any(patterns: &[KeyPattern], key: &QueryKey) -> bool {
        patterns.iter().any(|p| p.matches(key))
    }

    #[test]
    fn delete_department_invalidates_departments_only() {
        let intent = MutationIntent::delete(EntityKind::Department, "d1");
        let patterns = intent.invalidations();

        assert_eq!(
            patterns,
            vec![
                KeyPattern::Kind(EntityKind::Department),
                KeyPattern::Entity {
                    kind: EntityKind::Department,
                    id: "d1".into()
                },
            ]
        );

        let scoped_courses = QueryKey::collection(
            EntityKind::Course,
            Some(ParentScope::new(EntityKind::Department, "d1")),
            PageCursor::default(),
        );
        assert!(!matches_any(&patterns, &scoped_courses));
        assert!(matches_any(
            &patterns,
            &QueryKey::collection(EntityKind::Department, None, PageCursor::new(4, 10))
        ));
    }

    #[test]
    fn update_that_moves_parent_covers_both_scopes() {
        let old = ParentScope::new(EntityKind::Department, "d1");
        let new = ParentScope::new(EntityKind::Department, "d2");
        let intent = MutationIntent::update(EntityKind::Course, "c1", json!({"name": "Physics"}))
            .with_parent(Some(new.clone()))
            .with_previous_parent(Some(old.clone()));

        let patterns = intent.invalidations();
        assert!(patterns.contains(&KeyPattern::Scoped {
            kind: EntityKind::Course,
            parent: old
        }));
        assert!(patterns.contains(&KeyPattern::Scoped {
            kind: EntityKind::Course,
            parent: new
        }));
    }

    #[test]
    fn assignment_invalidates_old_and_new_holder() {
        let intent = MutationIntent::assign(
            Relation::DepartmentHead,
            "d1",
            Some("u-old".into()),
            "u-new",
        );
        assert_eq!(intent.kind, EntityKind::Department);
        assert_eq!(intent.payload, json!({"head": "u-new"}));

        let patterns = intent.invalidations();
        assert!(matches_any(&patterns, &QueryKey::entity(EntityKind::User, "u-old")));
        assert!(matches_any(&patterns, &QueryKey::entity(EntityKind::User, "u-new")));
        assert!(!matches_any(&patterns, &QueryKey::entity(EntityKind::User, "u-other")));
    }

    #[test]
    fn status_change_payload_uses_wire_value() {
        let intent =
            MutationIntent::change_status(EntityKind::Department, "d1", DepartmentStatus::Inactive);
        assert_eq!(intent.payload, json!({"status": "INACTIVE"}));
        assert_eq!(
            intent.success_message(),
            "Department status updated successfully"
        );
    }

    #[test]
    fn role_change_payload_and_message() {
        let intent = MutationIntent::user_action("u1", UserAction::ChangeRole(UserRole::Faculty));
        assert_eq!(intent.payload, json!({"role": "FACULTY"}));
        assert_eq!(intent.op_name(), "change_role");
        assert_eq!(intent.success_message(), "User role changed to Faculty");
    }

    #[test]
    fn verify_has_no_body() {
        let intent = MutationIntent::user_action("u1", UserAction::Verify);
        assert_eq!(intent.payload, Value::Null);
        assert_eq!(intent.target_id.as_deref(), Some("u1"));
    }
}
