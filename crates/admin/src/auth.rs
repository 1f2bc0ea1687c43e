//! Authenticated-session collaborator.
//!
//! Login and credential storage live elsewhere; controllers only read the
//! current user and end the session when the API rejects it.

use std::sync::Mutex;

use async_trait::async_trait;

use campus_core::status::UserRole;
use campus_core::types::EntityId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: EntityId,
    pub full_name: String,
    pub role: UserRole,
}

#[async_trait]
pub trait AuthSession: Send + Sync {
    fn current_user(&self) -> Option<CurrentUser>;

    /// End the session, e.g. after the API answered 401.
    async fn logout(&self);
}

/// A session fixed at startup, used by the command-line binary.
pub struct StaticSession {
    user: Mutex<Option<CurrentUser>>,
}

impl StaticSession {
    pub fn new(user: Option<CurrentUser>) -> Self {
        Self {
            user: Mutex::new(user),
        }
    }
}

#[async_trait]
impl AuthSession for StaticSession {
    fn current_user(&self) -> Option<CurrentUser> {
        self.user.lock().ok().and_then(|u| u.clone())
    }

    async fn logout(&self) {
        if let Ok(mut user) = self.user.lock() {
            if let Some(u) = user.take() {
                tracing::info!(user_id = %u.id, "Session ended");
            }
        }
    }
}
