//! Entity management controllers for the campus administration dashboard.
//!
//! Each entity page is an [`EntityController`] built from a shared
//! [`AdminContext`]. Controllers consume two collaborators: a [`Notifier`]
//! for user-visible outcomes and an [`AuthSession`] that is ended when the
//! API rejects the session.

pub mod assign;
pub mod auth;
pub mod cascade;
pub mod context;
pub mod controller;
pub mod dialog;
pub mod error;
pub mod forms;
pub mod notify;
pub mod pages;
pub mod status_dialog;

pub use auth::{AuthSession, CurrentUser, StaticSession};
pub use context::AdminContext;
pub use controller::{EntityController, PagePhase, PageState, PageView};
pub use error::AdminError;
pub use notify::{Notification, Notifier, TracingNotifier, Variant};
