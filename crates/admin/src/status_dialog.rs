//! Status selector dialog limited to an entity's legal statuses.

use campus_core::status::WireEnum;
use campus_core::types::EntityId;

use crate::forms::SubmitGuard;

/// Constrained status selector for one entity.
///
/// Choices are limited to the entity's own status enumeration. Submitting
/// the status the entity already has is not allowed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange<S: WireEnum> {
    pub id: EntityId,
    pub name: String,
    pub current: S,
    pub selected: S,
    pub guard: SubmitGuard,
}

impl<S: WireEnum> StatusChange<S> {
    pub fn new(id: EntityId, name: impl Into<String>, current: S) -> Self {
        Self {
            id,
            name: name.into(),
            current,
            selected: current,
            guard: SubmitGuard::default(),
        }
    }

    pub fn choices(&self) -> &'static [S] {
        S::ALL
    }

    pub fn select(&mut self, status: S) {
        self.selected = status;
    }

    pub fn is_unchanged(&self) -> bool {
        self.selected == self.current
    }

    pub fn can_submit(&self) -> bool {
        !self.is_unchanged() && !self.guard.is_submitting()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use campus_core::status::{
        CourseStatus, DepartmentStatus, SemesterStatus, SessionStatus, SubjectStatus, UserStatus,
    };

    fn assert_noop_guard<S: WireEnum>() {
        for &current in S::ALL {
            let mut change = StatusChange::new("x".into(), "X", current);
            for &selected in S::ALL {
                change.select(selected);
                assert_eq!(change.can_submit(), selected != current, "{current} -> {selected}");
            }
        }
    }

    #[test]
    fn unchanged_status_cannot_be_submitted() {
        assert_noop_guard::<DepartmentStatus>();
        assert_noop_guard::<CourseStatus>();
        assert_noop_guard::<SessionStatus>();
        assert_noop_guard::<SemesterStatus>();
        assert_noop_guard::<SubjectStatus>();
        assert_noop_guard::<UserStatus>();
    }

    #[test]
    fn submitting_disables_submit() {
        let mut change = StatusChange::new("d1".into(), "Physics", DepartmentStatus::Active);
        change.select(DepartmentStatus::Inactive);
        change.guard.begin().unwrap();
        assert!(!change.can_submit());
    }
}
