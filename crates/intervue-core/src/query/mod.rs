//! Cache-keyed reads and one-shot mutations on top of `ApiClient`.
//!
//! Reads are gated by an `enabled` precondition: a disabled read neither
//! fetches nor errors and reports `QueryState::Pending`. Successful reads are
//! kept in a `QueryCache` keyed by `QueryKey`. Mutations run exactly once and
//! report through a `Notifier`.

pub mod cache;
pub mod client;
pub mod key;
pub mod notify;
pub mod state;

pub use cache::{CachedData, QueryCache};
pub use client::QueryClient;
pub use key::QueryKey;
pub use notify::{Notifier, TracingNotifier};
pub use state::QueryState;
