//! Shared dependencies of every entity page.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use campus_client::{ApiError, ClientConfig, QueryCache, ResourceClient};
use campus_core::models::Entity;
use campus_core::pagination::DEFAULT_PAGE_SIZE;
use campus_core::query::ParentScope;

use crate::auth::AuthSession;
use crate::controller::EntityController;
use crate::notify::Notifier;

/// Shared application state handed to every page controller.
///
/// Built once at the application root. Cloning is cheap; the cache and
/// collaborators are shared.
#[derive(Clone)]
pub struct AdminContext {
    pub client: ResourceClient,
    pub cache: QueryCache,
    pub notifier: Arc<dyn Notifier>,
    pub auth: Arc<dyn AuthSession>,
    /// Page size new controllers start with.
    pub page_size: u32,
    /// Cancelling this disposes every controller created from the context.
    pub shutdown: CancellationToken,
}

impl AdminContext {
    pub fn new(
        client: ResourceClient,
        cache: QueryCache,
        notifier: Arc<dyn Notifier>,
        auth: Arc<dyn AuthSession>,
    ) -> Self {
        Self {
            client,
            cache,
            notifier,
            auth,
            page_size: DEFAULT_PAGE_SIZE,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn from_config(
        config: &ClientConfig,
        notifier: Arc<dyn Notifier>,
        auth: Arc<dyn AuthSession>,
    ) -> Result<Self, ApiError> {
        let client = ResourceClient::from_config(config)?;
        let cache = QueryCache::new(config.cache_config());
        Ok(Self::new(client, cache, notifier, auth).with_page_size(config.page_size))
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Controller for the page listing `E`.
    pub fn controller<E: Entity>(&self, parent: Option<ParentScope>) -> EntityController<E> {
        EntityController::new(self.clone(), parent)
    }
}
