//! Store metrics.
//!
//! The store records through the `metrics` facade. Nothing is exported
//! unless the application installs a recorder; without one every call is a
//! no-op.

use metrics::{describe_counter, describe_gauge, describe_histogram};

// Re-export metrics macros for use in other modules
pub use metrics::{counter, gauge, histogram};

/// Actions accepted by a store
pub const ACTIONS_TOTAL: &str = "waiters.store.actions.total";

/// Actions rejected because the store was shutting down
pub const ACTIONS_REJECTED: &str = "waiters.store.actions.rejected";

/// Reducer execution time
pub const REDUCER_DURATION: &str = "waiters.store.reducer.duration_seconds";

/// Effects executed, labelled by `type`
pub const EFFECTS_EXECUTED: &str = "waiters.store.effects.executed";

/// Effects currently running
pub const EFFECTS_PENDING: &str = "waiters.store.effects.pending";

/// Register descriptions for every store metric.
///
/// Safe to call more than once; recorders keep the last description.
pub fn register_metrics() {
    describe_counter!(ACTIONS_TOTAL, "Total number of actions dispatched to the store");
    describe_counter!(
        ACTIONS_REJECTED,
        "Actions rejected because the store was shutting down"
    );
    describe_histogram!(
        REDUCER_DURATION,
        metrics::Unit::Seconds,
        "Time spent applying one action"
    );
    describe_counter!(EFFECTS_EXECUTED, "Effects executed, by effect type");
    describe_gauge!(EFFECTS_PENDING, "Effects currently running");
}
