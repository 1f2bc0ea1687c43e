//! Drives a [`CascadeSelection`] against the query cache.
//!
//! The selection state sits behind a synchronous mutex that is never held
//! across an await. Option fetches go through the cache keyed by the whole
//! ancestor chain, so two forms asking for the same options share one
//! request.

use std::sync::{Arc, Mutex, MutexGuard};

use campus_client::{ApiError, QueryCache, ResourceClient};
use campus_core::cascade::CascadeSelection;
use campus_core::models::{EntityKind, SelectOption};
use campus_core::query::QueryKey;
use campus_core::types::EntityId;

use crate::error::AdminError;

pub struct CascadeController {
    selection: Mutex<CascadeSelection>,
    client: ResourceClient,
    cache: QueryCache,
}

impl CascadeController {
    pub fn new(chain: &[EntityKind], client: ResourceClient, cache: QueryCache) -> Self {
        Self {
            selection: Mutex::new(CascadeSelection::new(chain)),
            client,
            cache,
        }
    }

    fn lock(&self) -> MutexGuard<'_, CascadeSelection> {
        self.selection
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Copy of the current selection.
    pub fn snapshot(&self) -> CascadeSelection {
        self.lock().clone()
    }

    pub fn last_value(&self) -> Option<EntityId> {
        self.lock().last_value().cloned()
    }

    pub fn validate(&self) -> Result<(), AdminError> {
        Ok(self.lock().validate()?)
    }

    /// Reset to an empty chain and load the first field's options.
    pub async fn start(&self) {
        let empty = {
            let mut selection = self.lock();
            let chain: Vec<EntityKind> = selection.fields().iter().map(|f| f.kind).collect();
            *selection = CascadeSelection::new(&chain);
            selection.is_empty()
        };
        if !empty {
            self.load(0).await;
        }
    }

    /// User-driven change of field `index`. Descendants are cleared and
    /// the next field's options are fetched.
    pub async fn select(&self, index: usize, value: Option<EntityId>) -> Result<(), AdminError> {
        let change = self.lock().set_value(index, value)?;
        if !change.cleared.is_empty() {
            tracing::debug!(index, cleared = ?change.cleared, "Cascade descendants cleared");
        }
        if let Some(next) = change.load {
            self.load(next).await;
        }
        Ok(())
    }

    /// Pre-populate the chain from an existing entity and load every
    /// field's options top to bottom. Values are kept as given; ancestors
    /// the entity does not carry are looked up first.
    pub async fn hydrate(&self, values: &[Option<EntityId>]) {
        let values = self.resolve_ancestors(values).await;
        let to_load = self.lock().hydrate(&values);
        for index in to_load {
            self.load(index).await;
        }
    }

    /// Fill unknown ancestors bottom-up from the nearest known descendant,
    /// e.g. a semester that only names its session gets the session's
    /// course and the course's department. Stops at the first failed lookup.
    async fn resolve_ancestors(&self, values: &[Option<EntityId>]) -> Vec<Option<EntityId>> {
        let chain: Vec<EntityKind> = self.lock().fields().iter().map(|f| f.kind).collect();
        let mut values: Vec<Option<EntityId>> = (0..chain.len())
            .map(|i| values.get(i).cloned().flatten())
            .collect();

        for i in (1..chain.len()).rev() {
            if values[i - 1].is_some() {
                continue;
            }
            let Some(id) = values[i].clone() else {
                continue;
            };
            match fetch_parent(&self.client, &self.cache, chain[i], &id).await {
                Ok(parent) => values[i - 1] = (*parent).clone(),
                Err(e) => {
                    tracing::warn!(kind = chain[i].singular(), %id, error = %e, "Failed to resolve cascade ancestor");
                    break;
                }
            }
        }
        values
    }

    /// Fetch the options of field `index`. Failures are stored on the field
    /// rather than returned.
    pub async fn load(&self, index: usize) {
        let Some(key) = self.lock().begin_load(index) else {
            return;
        };

        let outcome = match fetch_options(&self.client, &self.cache, &key).await {
            Ok(options) => Ok(Vec::<SelectOption>::clone(&options)),
            Err(e) => {
                tracing::warn!(%key, error = %e, "Failed to load cascade options");
                Err(format!("Failed to load {}", key.kind().plural()))
            }
        };

        if !self.lock().finish_load(index, &key, outcome) {
            tracing::debug!(%key, "Discarded options for a superseded selection");
        }
    }
}

/// Load the dropdown options named by an options `key` through the cache.
pub(crate) async fn fetch_options(
    client: &ResourceClient,
    cache: &QueryCache,
    key: &QueryKey,
) -> Result<Arc<Vec<SelectOption>>, ApiError> {
    let client = client.clone();
    let fetch_key = key.clone();
    cache
        .get_or_fetch(key.clone(), move || async move {
            let scope = fetch_key.scope();
            client.options(fetch_key.kind(), scope.as_ref()).await
        })
        .await
}

/// Parent id of one entity through the cache, keyed by the entity itself so
/// that updating it invalidates the lookup.
async fn fetch_parent(
    client: &ResourceClient,
    cache: &QueryCache,
    kind: EntityKind,
    id: &EntityId,
) -> Result<Arc<Option<EntityId>>, ApiError> {
    let client = client.clone();
    let fetch_id = id.clone();
    cache
        .get_or_fetch(QueryKey::entity(kind, id.clone()), move || async move {
            client.parent_of(kind, &fetch_id).await
        })
        .await
}
