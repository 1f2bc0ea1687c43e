//! Dependent-selection state for cascading dropdowns.
//!
//! A [`CascadeSelection`] holds one field per entity kind in a chain such as
//! `[Department, Course, Semester]`. Each field's options are keyed by the
//! values of every field above it, so a change anywhere up the chain makes
//! the descendants' option lists unusable until they are fetched again.
//!
//! This type only tracks state. Fetching is driven from outside: callers ask
//! for the key to load ([`CascadeSelection::begin_load`]), fetch it, and
//! report back with [`CascadeSelection::finish_load`]. Results for a key that
//! is no longer current are dropped.

use crate::error::CoreError;
use crate::models::{EntityKind, SelectOption};
use crate::query::QueryKey;
use crate::types::EntityId;

/// Load state of one field's option list.
///
/// `NotLoaded` (parent unselected or not yet fetched) is distinct from
/// `Loaded(vec![])` (the server returned no options).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OptionsState {
    #[default]
    NotLoaded,
    Loading,
    Loaded(Vec<SelectOption>),
    Failed(String),
}

impl OptionsState {
    pub fn options(&self) -> &[SelectOption] {
        match self {
            OptionsState::Loaded(options) => options,
            _ => &[],
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, OptionsState::Loaded(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CascadeField {
    pub kind: EntityKind,
    pub value: Option<EntityId>,
    pub options: OptionsState,
    /// Key of the fetch whose result this field is waiting for.
    pending: Option<QueryKey>,
}

impl CascadeField {
    fn new(kind: EntityKind) -> Self {
        Self {
            kind,
            value: None,
            options: OptionsState::NotLoaded,
            pending: None,
        }
    }

    fn reset(&mut self) {
        self.value = None;
        self.options = OptionsState::NotLoaded;
        self.pending = None;
    }
}

/// Effect of a user-driven [`CascadeSelection::set_value`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CascadeChange {
    /// Indices of descendant fields that were cleared.
    pub cleared: Vec<usize>,
    /// The next field whose options should now be loaded.
    pub load: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CascadeSelection {
    fields: Vec<CascadeField>,
}

impl CascadeSelection {
    pub fn new(chain: &[EntityKind]) -> Self {
        Self {
            fields: chain.iter().copied().map(CascadeField::new).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn fields(&self) -> &[CascadeField] {
        &self.fields
    }

    pub fn field(&self, index: usize) -> Option<&CascadeField> {
        self.fields.get(index)
    }

    pub fn value(&self, index: usize) -> Option<&EntityId> {
        self.fields.get(index).and_then(|f| f.value.as_ref())
    }

    pub fn values(&self) -> Vec<Option<EntityId>> {
        self.fields.iter().map(|f| f.value.clone()).collect()
    }

    /// Value of the last field, i.e. the parent id a draft points at.
    pub fn last_value(&self) -> Option<&EntityId> {
        self.fields.last().and_then(|f| f.value.as_ref())
    }

    fn check_index(&self, index: usize) -> Result<(), CoreError> {
        if index < self.fields.len() {
            Ok(())
        } else {
            Err(CoreError::Internal(format!(
                "cascade field {index} out of range (len {})",
                self.fields.len()
            )))
        }
    }

    /// Options key for field `index`, or `None` while any ancestor is
    /// unselected.
    pub fn options_key(&self, index: usize) -> Option<QueryKey> {
        let field = self.fields.get(index)?;
        let ancestors = self.fields[..index]
            .iter()
            .map(|f| f.value.clone())
            .collect::<Option<Vec<_>>>()?;
        Some(QueryKey::options(field.kind, ancestors))
    }

    /// A field accepts selection only once its options are loaded.
    pub fn is_enabled(&self, index: usize) -> bool {
        self.fields
            .get(index)
            .is_some_and(|f| f.options.is_loaded())
    }

    /// Error to show on field `index`: its own load failure, or the failure
    /// of the nearest ancestor whose options could not be loaded.
    pub fn error(&self, index: usize) -> Option<String> {
        let field = self.fields.get(index)?;
        if let OptionsState::Failed(msg) = &field.options {
            return Some(msg.clone());
        }
        self.fields[..index].iter().rev().find_map(|f| {
            matches!(f.options, OptionsState::Failed(_))
                .then(|| format!("Failed to load {}", f.kind.plural()))
        })
    }

    /// User-driven change of field `index`.
    ///
    /// Clears every descendant's value and marks its options `NotLoaded`.
    /// Selecting a value that is not among the loaded options is rejected.
    pub fn set_value(
        &mut self,
        index: usize,
        value: Option<EntityId>,
    ) -> Result<CascadeChange, CoreError> {
        self.check_index(index)?;

        if let Some(id) = &value {
            let field = &self.fields[index];
            if !field.options.is_loaded() {
                return Err(CoreError::Validation(format!(
                    "{} options are not available",
                    field.kind.title()
                )));
            }
            if !field.options.options().iter().any(|o| &o.id == id) {
                return Err(CoreError::NotFound {
                    entity: field.kind.singular(),
                    id: id.clone(),
                });
            }
        }

        let has_value = value.is_some();
        self.fields[index].value = value;

        let cleared: Vec<usize> = (index + 1..self.fields.len()).collect();
        for &j in &cleared {
            self.fields[j].reset();
        }

        let load = (has_value && index + 1 < self.fields.len()).then_some(index + 1);
        Ok(CascadeChange { cleared, load })
    }

    /// Pre-populate the chain from an existing entity, top to bottom,
    /// without clearing descendants. Values after the first missing one are
    /// dropped. Returns the indices whose options should be loaded.
    pub fn hydrate(&mut self, values: &[Option<EntityId>]) -> Vec<usize> {
        let mut gap = false;
        for (i, field) in self.fields.iter_mut().enumerate() {
            field.options = OptionsState::NotLoaded;
            field.pending = None;
            let value = if gap {
                None
            } else {
                values.get(i).cloned().flatten()
            };
            gap |= value.is_none();
            field.value = value;
        }
        (0..self.fields.len())
            .filter(|&i| self.options_key(i).is_some())
            .collect()
    }

    /// Mark field `index` as loading and return the key to fetch.
    pub fn begin_load(&mut self, index: usize) -> Option<QueryKey> {
        let key = self.options_key(index)?;
        let field = &mut self.fields[index];
        field.options = OptionsState::Loading;
        field.pending = Some(key.clone());
        Some(key)
    }

    /// Store the outcome of a fetch started by [`Self::begin_load`].
    ///
    /// Returns `false` (and changes nothing) when `key` is no longer the
    /// field's pending key, e.g. an ancestor changed meanwhile. A hydrated
    /// value missing from the loaded options is kept and reported by
    /// [`Self::validate`].
    pub fn finish_load(
        &mut self,
        index: usize,
        key: &QueryKey,
        result: Result<Vec<SelectOption>, String>,
    ) -> bool {
        let Some(field) = self.fields.get_mut(index) else {
            return false;
        };
        if field.pending.as_ref() != Some(key) {
            return false;
        }
        field.pending = None;
        field.options = match result {
            Ok(options) => OptionsState::Loaded(options),
            Err(message) => OptionsState::Failed(message),
        };
        true
    }

    /// Every field must be selected, and each selection must be one of the
    /// loaded options when they are known.
    pub fn validate(&self) -> Result<(), CoreError> {
        for field in &self.fields {
            let Some(id) = &field.value else {
                return Err(CoreError::Validation(format!(
                    "{} is required",
                    field.kind.title()
                )));
            };
            if let OptionsState::Loaded(options) = &field.options {
                if !options.iter().any(|o| &o.id == id) {
                    return Err(CoreError::Validation(format!(
                        "Selected {} is no longer available",
                        field.kind.singular()
                    )));
                }
            }
        }
        Ok(())
    }
}
