//! Capability probing.

use std::panic::{self, AssertUnwindSafe};

/// Evaluate a capability check, treating any failure as "not available".
///
/// Returns `true` only when `check` runs to completion and yields
/// `Ok(true)`. An `Err` or a panic inside the check yields `false`.
pub fn probe<F>(check: F) -> bool
where
    F: FnOnce() -> anyhow::Result<bool>,
{
    match panic::catch_unwind(AssertUnwindSafe(check)) {
        Ok(Ok(available)) => available,
        Ok(Err(e)) => {
            tracing::debug!("Capability check failed: {:#}", e);
            false
        }
        Err(_) => {
            tracing::debug!("Capability check panicked");
            false
        }
    }
}
