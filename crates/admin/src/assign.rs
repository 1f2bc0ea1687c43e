//! Relation assignment dialog state.

use campus_core::cascade::OptionsState;
use campus_core::error::CoreError;
use campus_core::models::{Entity, Relation};
use campus_core::query::QueryKey;
use campus_core::types::EntityId;

use crate::forms::SubmitGuard;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub relation: Relation,
    pub owner_id: EntityId,
    pub owner_name: String,
    /// Current holder of the relation.
    pub current: Option<EntityId>,
    pub candidates: OptionsState,
    pub selected: Option<EntityId>,
    pub guard: SubmitGuard,
}

impl Assignment {
    /// Start an assignment on `owner`. The current holder is preselected.
    pub fn new<E: Entity>(relation: Relation, owner: &E) -> Self {
        let current = owner.assigned().cloned();
        Self {
            relation,
            owner_id: owner.id().clone(),
            owner_name: owner.display_name().to_string(),
            selected: current.clone(),
            current,
            candidates: OptionsState::NotLoaded,
            guard: SubmitGuard::default(),
        }
    }

    /// Key candidates are loaded from, or `None` when the owner has no
    /// scope the target can be drawn from.
    ///
    /// Targets without a parent kind (departments) are listed unscoped.
    /// Scoped targets (faculty) only come from the owner's own scope.
    pub fn candidates_key<E: Entity>(relation: Relation, owner: &E) -> Option<QueryKey> {
        let target = relation.target();
        match target.parent() {
            None => Some(QueryKey::options(target, Vec::new())),
            Some(_) => owner
                .assignment_scope()
                .map(|scope| QueryKey::options(target, vec![scope.id])),
        }
    }

    pub fn select(&mut self, id: Option<EntityId>) {
        self.selected = id;
    }

    pub fn can_submit(&self) -> bool {
        self.check().is_ok() && !self.guard.is_submitting()
    }

    /// Validate the selection and return the id to assign.
    pub fn check(&self) -> Result<&EntityId, CoreError> {
        let target = self.relation.target();
        let options = match &self.candidates {
            OptionsState::Loaded(options) if !options.is_empty() => options,
            OptionsState::Failed(msg) => return Err(CoreError::Validation(msg.clone())),
            OptionsState::Loaded(_) => {
                return Err(CoreError::Validation(format!(
                    "No {} available to assign",
                    target.plural()
                )))
            }
            OptionsState::NotLoaded | OptionsState::Loading => {
                return Err(CoreError::Validation(format!(
                    "{} options are still loading",
                    target.title()
                )))
            }
        };

        let Some(selected) = &self.selected else {
            return Err(CoreError::Validation(format!(
                "Select a {} to assign",
                target.singular()
            )));
        };
        if !options.iter().any(|o| &o.id == selected) {
            return Err(CoreError::NotFound {
                entity: target.singular(),
                id: selected.clone(),
            });
        }
        if self.current.as_ref() == Some(selected) {
            return Err(CoreError::Conflict(format!(
                "{} is already assigned",
                target.title()
            )));
        }
        Ok(selected)
    }
}
