//! Authentication state for the API client.
//!
//! This module provides:
//! - `KeyValueStorage`: the persisted string storage capability, with
//!   in-memory, file and OS keychain backends
//! - `TokenStore`: accessor for the bearer credential on top of a storage
//! - `SessionState`: the cached identity of the signed-in user
//! - `AuthContext`: owns both and performs login, logout and teardown
//!
//! A session is either authenticated (a credential is stored) or not. Any
//! 401 from the backend tears it down.

pub mod session;
pub mod storage;
pub mod token;

pub use session::{AuthContext, AuthState, SessionData, SessionState};
pub use storage::{FileStorage, KeyValueStorage, KeyringStorage, MemoryStorage, StorageError};
pub use token::TokenStore;
