//! Create/edit form state and the per-dialog submission guard.

use campus_core::error::CoreError;
use campus_core::models::EntityDraft;
use campus_core::query::ParentScope;
use campus_core::types::EntityId;

use crate::error::AdminError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit {
        id: EntityId,
        /// Parent the entity belonged to when the form was opened.
        previous_parent: Option<ParentScope>,
    },
}

/// Tracks whether a dialog has a submission in flight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubmitGuard {
    submitting: bool,
}

impl SubmitGuard {
    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    /// Claim the guard. Fails with [`AdminError::Busy`] while a previous
    /// submission is still pending.
    pub fn begin(&mut self) -> Result<(), AdminError> {
        if self.submitting {
            return Err(AdminError::Busy);
        }
        self.submitting = true;
        Ok(())
    }

    pub fn finish(&mut self) {
        self.submitting = false;
    }
}

#[derive(Debug, Clone)]
pub struct FormState<D> {
    pub mode: FormMode,
    pub draft: D,
    /// Messages from the last rejected submission.
    pub errors: Vec<String>,
    pub guard: SubmitGuard,
}

impl<D: EntityDraft> FormState<D> {
    pub fn create() -> Self {
        Self {
            mode: FormMode::Create,
            draft: D::default(),
            errors: Vec::new(),
            guard: SubmitGuard::default(),
        }
    }

    pub fn edit(id: EntityId, draft: D, previous_parent: Option<ParentScope>) -> Self {
        Self {
            mode: FormMode::Edit {
                id,
                previous_parent,
            },
            draft,
            errors: Vec::new(),
            guard: SubmitGuard::default(),
        }
    }

    pub fn is_edit(&self) -> bool {
        matches!(self.mode, FormMode::Edit { .. })
    }

    /// Whether the submit button is enabled.
    pub fn can_submit(&self) -> bool {
        !self.guard.is_submitting()
    }
}

/// State of the delete confirmation dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteConfirmation {
    pub id: EntityId,
    pub name: String,
    pub parent: Option<ParentScope>,
    pub guard: SubmitGuard,
}

pub(crate) fn no_dialog(what: &str) -> AdminError {
    AdminError::Core(CoreError::Validation(format!("No {what} dialog is open")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use campus_core::models::DepartmentDraft;

    #[test]
    fn guard_rejects_second_begin() {
        let mut guard = SubmitGuard::default();
        guard.begin().unwrap();
        assert_matches!(guard.begin(), Err(AdminError::Busy));
        guard.finish();
        assert!(guard.begin().is_ok());
    }

    #[test]
    fn create_form_starts_empty() {
        let form = FormState::<DepartmentDraft>::create();
        assert!(!form.is_edit());
        assert!(form.draft.name.is_empty());
        assert!(form.can_submit());
    }
}
