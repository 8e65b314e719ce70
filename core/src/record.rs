//! The waiter record model.

use crate::request::SharedRequestCreator;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Lifecycle status of a waiter, projected from the record's flags.
///
/// Refreshing is not a separate status: a refreshing waiter is
/// [`Pending`](WaiterStatus::Pending) with `is_refreshing` set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WaiterStatus {
    /// No activity recorded, or cleared
    Idle,

    /// Operation in flight
    Pending,

    /// Operation succeeded
    Resolved,

    /// Operation failed
    Rejected,

    /// Operation canceled before completing
    Canceled,
}

/// Full state snapshot for one named operation.
///
/// Records are only ever produced by [`WaiterRecord::transition`]; the
/// registry owns them and hands out copies.
///
/// # Invariants
///
/// - At most one of `is_pending`, `is_resolved`, `is_rejected`, `is_canceled` is set
/// - `is_completed` is set exactly when `is_resolved` or `is_rejected` is
/// - `is_refreshing` implies `is_pending`
/// - `id` grows by one on every INIT and never otherwise
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WaiterRecord {
    /// Incremented on each INIT
    pub id: u64,

    /// Identity key, `None` only for the idle default
    pub name: Option<String>,

    /// Operation factory carried across events
    #[serde(skip)]
    pub request_creator: Option<SharedRequestCreator>,

    /// Last parameters passed to the operation
    pub params: Option<Value>,

    /// In-flight request descriptor
    pub request: Option<Value>,

    /// Last successful result
    pub response: Option<Value>,

    /// Last failure
    pub error: Option<Value>,

    /// Pending while a previous response is still held
    pub is_refreshing: bool,

    /// Operation in flight
    pub is_pending: bool,

    /// Last operation failed
    pub is_rejected: bool,

    /// Last operation succeeded
    pub is_resolved: bool,

    /// Resolved or rejected
    pub is_completed: bool,

    /// Canceled before completing
    pub is_canceled: bool,

    /// Reserved, never set by any transition
    pub is_retrying: bool,

    /// When the current operation was initiated
    pub start_time: Option<DateTime<Utc>>,

    /// When the last operation settled or was canceled
    pub end_time: Option<DateTime<Utc>>,

    /// `end_time - start_time` in milliseconds
    pub elapsed_ms: Option<i64>,

    /// Time of the last transition that changed the record
    pub last_modified: Option<DateTime<Utc>>,

    /// Reserved, only ever reset to zero
    pub attempts: u32,
}

impl WaiterRecord {
    /// The idle default model returned for names with no recorded activity.
    #[must_use]
    pub fn idle() -> Self {
        Self::default()
    }

    /// Status derived from the flags.
    ///
    /// Pending wins if the flags were ever inconsistent, matching the
    /// presentation priority.
    #[must_use]
    pub const fn status(&self) -> WaiterStatus {
        if self.is_pending {
            WaiterStatus::Pending
        } else if self.is_resolved {
            WaiterStatus::Resolved
        } else if self.is_rejected {
            WaiterStatus::Rejected
        } else if self.is_canceled {
            WaiterStatus::Canceled
        } else {
            WaiterStatus::Idle
        }
    }

    /// Whether the record is in idle shape (no flag set).
    #[must_use]
    pub const fn is_idle(&self) -> bool {
        matches!(self.status(), WaiterStatus::Idle)
    }

    /// Whether the record carries a request creator.
    #[must_use]
    pub const fn has_request_creator(&self) -> bool {
        self.request_creator.is_some()
    }
}
