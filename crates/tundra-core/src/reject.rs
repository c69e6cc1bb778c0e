//! Discard of staged changes

use crate::sandbox::SandboxView;
use tundra_value::Value;

/// Drop a sandbox's change-log and return the value it wrapped
///
/// Values that are not a sandbox at the top are returned unchanged.
#[must_use]
pub fn reject(value: Value) -> Value {
    match SandboxView::from_value(&value) {
        Some(view) => {
            tracing::debug!(
                session = %view.session_id(),
                discarded = view.changes().len(),
                "Rejected sandbox"
            );
            view.original().clone()
        }
        None => value,
    }
}
