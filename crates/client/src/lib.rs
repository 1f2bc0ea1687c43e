//! Remote resource client and query cache for the campus administration API.

pub mod cache;
pub mod client;
pub mod config;
pub mod endpoints;
pub mod envelope;
pub mod error;
pub mod retry;
pub mod transport;

pub use cache::{CacheConfig, CacheEvent, Cached, QueryCache};
pub use client::ResourceClient;
pub use config::{ClientConfig, ConfigError};
pub use error::{ApiError, ErrorBody, FailureKind};
pub use transport::{ApiRequest, ApiResponse, HttpTransport, Method, Transport};
