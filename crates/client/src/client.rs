//! Typed remote resource client.
//!
//! Reads decode into the entity schemas of `campus_core` and are retried on
//! transient failures. Mutations are sent exactly once.

use std::sync::Arc;

use serde_json::Value;

use campus_core::models::{
    Course, Department, Entity, EntityKind, Semester, Session, SelectOption, Subject, User,
};
use campus_core::mutation::MutationIntent;
use campus_core::pagination::{PageCursor, PagedCollection};
use campus_core::query::ParentScope;
use campus_core::types::EntityId;

use crate::config::ClientConfig;
use crate::endpoints;
use crate::envelope;
use crate::error::ApiError;
use crate::retry::RetryPolicy;
use crate::transport::{ApiRequest, ApiResponse, HttpTransport, Transport};

#[derive(Clone)]
pub struct ResourceClient {
    transport: Arc<dyn Transport>,
    retry: RetryPolicy,
}

impl ResourceClient {
    pub fn new(transport: Arc<dyn Transport>, retry: RetryPolicy) -> Self {
        Self { transport, retry }
    }

    /// Client over HTTP using the configured URL, token, timeout, and
    /// retry policy.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ApiError> {
        let transport = HttpTransport::new(config)?;
        Ok(Self::new(Arc::new(transport), config.retry_policy()))
    }

    /// Fetch one page of `E`, optionally scoped to a parent.
    pub async fn list<E: Entity>(
        &self,
        parent: Option<&ParentScope>,
        cursor: PageCursor,
    ) -> Result<PagedCollection<E>, ApiError> {
        let body = self
            .read(endpoints::list_request(E::KIND, parent, cursor))
            .await?;
        envelope::decode_list(&body, cursor)
    }

    pub async fn get<E: Entity>(&self, id: &str) -> Result<E, ApiError> {
        let body = self.read(endpoints::get_request(E::KIND, id)).await?;
        envelope::decode_single(&body)
    }

    /// Dropdown options for `kind`, optionally scoped to a parent.
    pub async fn options(
        &self,
        kind: EntityKind,
        parent: Option<&ParentScope>,
    ) -> Result<Vec<SelectOption>, ApiError> {
        match kind {
            EntityKind::Department => self.options_of::<Department>(parent).await,
            EntityKind::Course => self.options_of::<Course>(parent).await,
            EntityKind::Session => self.options_of::<Session>(parent).await,
            EntityKind::Semester => self.options_of::<Semester>(parent).await,
            EntityKind::Subject => self.options_of::<Subject>(parent).await,
            EntityKind::User => self.options_of::<User>(parent).await,
        }
    }

    /// Parent id of one entity, read from the entity itself.
    pub async fn parent_of(&self, kind: EntityKind, id: &str) -> Result<Option<EntityId>, ApiError> {
        match kind {
            EntityKind::Department => self.parent_id_of::<Department>(id).await,
            EntityKind::Course => self.parent_id_of::<Course>(id).await,
            EntityKind::Session => self.parent_id_of::<Session>(id).await,
            EntityKind::Semester => self.parent_id_of::<Semester>(id).await,
            EntityKind::Subject => self.parent_id_of::<Subject>(id).await,
            EntityKind::User => self.parent_id_of::<User>(id).await,
        }
    }

    async fn parent_id_of<E: Entity>(&self, id: &str) -> Result<Option<EntityId>, ApiError> {
        let entity = self.get::<E>(id).await?;
        Ok(entity.parent_id().cloned())
    }

    async fn options_of<E: Entity>(
        &self,
        parent: Option<&ParentScope>,
    ) -> Result<Vec<SelectOption>, ApiError> {
        let page = self.list::<E>(parent, PageCursor::options()).await?;
        Ok(page.items.iter().map(Entity::to_option).collect())
    }

    /// Send a mutation. Never retried. Returns the response's `data`
    /// (`Value::Null` when absent).
    pub async fn execute(&self, intent: &MutationIntent) -> Result<Value, ApiError> {
        let request = endpoints::mutation_request(intent)?;
        let (method, path) = (request.method, request.path.clone());

        let result = self.transport.send(request).await.and_then(ensure_success);
        match &result {
            Ok(_) => tracing::debug!(%method, %path, op = intent.op_name(), "Mutation succeeded"),
            Err(e) => tracing::warn!(%method, %path, op = intent.op_name(), error = %e, "Mutation failed"),
        }

        let body = result?;
        Ok(serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|mut v| v.get_mut("data").map(Value::take))
            .unwrap_or(Value::Null))
    }

    async fn read(&self, request: ApiRequest) -> Result<String, ApiError> {
        let label = format!("{} {}", request.method, request.path);
        self.retry
            .run(&label, || {
                let transport = Arc::clone(&self.transport);
                let request = request.clone();
                async move { transport.send(request).await.and_then(ensure_success) }
            })
            .await
    }
}

/// Return the body of a 2xx response, or classify the failure.
fn ensure_success(response: ApiResponse) -> Result<String, ApiError> {
    if response.is_success() {
        Ok(response.body)
    } else {
        Err(ApiError::from_response(response.status, &response.body))
    }
}
