//! Core library for intervue.
//!
//! This crate provides the authenticated client used by the intervue
//! front-ends to talk to the application's own `/api` routes:
//!
//! - `auth`: token storage, session state and the shared `AuthContext`
//! - `api`: the HTTP client core and its request/response interceptors
//! - `retry`: retry predicate and backoff schedule for read operations
//! - `query`: cache-keyed reads and one-shot mutations on top of the client
//! - `models`: wire types for users, interviews, payments and auth payloads
//! - `config`: configuration file and environment overrides

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod query;
pub mod retry;

pub use api::{ApiClient, ApiError};
pub use auth::{AuthContext, AuthState, SessionState, TokenStore};
pub use config::Config;
pub use query::{QueryClient, QueryKey, QueryState};
pub use retry::RetryPolicy;
