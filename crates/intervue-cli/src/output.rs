//! Console rendering of query results and notifications.

use anyhow::Result;
use serde::Serialize;

use intervue_core::query::Notifier;
use intervue_core::{ApiError, QueryState};

/// Prints notifications to stderr so stdout stays machine-readable.
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn success(&self, message: &str) {
        eprintln!("✓ {}", message);
    }

    fn error(&self, message: &str) {
        eprintln!("✗ {}", message);
    }
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Unwrap a query result for display, mapping the non-success phases to
/// user-facing errors.
pub fn require<T>(state: QueryState<T>, what: &str) -> Result<T> {
    match state {
        QueryState::Success(data) => Ok(data),
        QueryState::Pending => Err(anyhow::anyhow!(
            "Cannot load {} - not signed in. Run `intervue login <email>` first.",
            what
        )),
        QueryState::Error(e) => Err(explain(e, what)),
    }
}

pub fn explain(error: ApiError, what: &str) -> anyhow::Error {
    if error.is_unauthorized() {
        anyhow::anyhow!("Session expired while loading {}. Run `intervue login <email>` to sign in again.", what)
    } else {
        anyhow::anyhow!("Failed to load {}: {}", what, error.user_message())
    }
}
