//! Domain logic for the campus administration dashboard.
//!
//! Pure, I/O-free building blocks shared by the HTTP client and the page
//! controllers: entity schemas and form drafts, status enumerations, the
//! pagination engine, cache keys, mutation intents, and the cascading
//! selection resolver used by dependent dropdowns.

pub mod cascade;
pub mod error;
pub mod filter;
pub mod models;
pub mod mutation;
pub mod pagination;
pub mod query;
pub mod status;
pub mod types;
