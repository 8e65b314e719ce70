//! Transition edge detection.
//!
//! Observers care about the instant a flag turns on, not about every read
//! while it stays on. [`TransitionDetector::edges`] compares two consecutive
//! records and reports which flags rose in between.

use crate::record::WaiterRecord;
use smallvec::SmallVec;

/// A flag that rose from false to true.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Edge {
    /// `is_rejected` rose
    Reject,
    /// `is_pending` rose
    Pending,
    /// `is_resolved` rose
    Resolve,
    /// `is_completed` rose
    Complete,
    /// `is_refreshing` rose
    Refresh,
    /// `is_retrying` rose
    Retry,
    /// `is_canceled` rose
    Cancel,
}

impl Edge {
    /// All edges, in the order they are reported.
    pub const ALL: [Self; 7] = [
        Self::Reject,
        Self::Pending,
        Self::Resolve,
        Self::Complete,
        Self::Refresh,
        Self::Retry,
        Self::Cancel,
    ];

    /// The flag this edge watches.
    #[must_use]
    pub const fn flag(self, record: &WaiterRecord) -> bool {
        match self {
            Self::Reject => record.is_rejected,
            Self::Pending => record.is_pending,
            Self::Resolve => record.is_resolved,
            Self::Complete => record.is_completed,
            Self::Refresh => record.is_refreshing,
            Self::Retry => record.is_retrying,
            Self::Cancel => record.is_canceled,
        }
    }
}

/// Edges fired by one transition, in [`Edge::ALL`] order.
pub type Edges = SmallVec<[Edge; 4]>;

/// Compares consecutive records.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransitionDetector;

impl TransitionDetector {
    /// Edges that rose between `previous` and `next`.
    ///
    /// A flag that is true in both records does not fire. Identical records
    /// never fire anything.
    #[must_use]
    pub fn edges(previous: &WaiterRecord, next: &WaiterRecord) -> Edges {
        Edge::ALL
            .into_iter()
            .filter(|edge| edge.flag(next) && !edge.flag(previous))
            .collect()
    }

    /// Whether `edge` rose between `previous` and `next`.
    #[must_use]
    pub const fn fired(edge: Edge, previous: &WaiterRecord, next: &WaiterRecord) -> bool {
        edge.flag(next) && !edge.flag(previous)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::LifecycleEvent;
    use chrono::Utc;
    use serde_json::json;

    #[test]
    fn test_init_fires_pending_only() {
        let idle = WaiterRecord::idle();
        let pending = idle.transition(&LifecycleEvent::init("x", json!(1)), Utc::now());

        assert_eq!(
            TransitionDetector::edges(&idle, &pending).as_slice(),
            &[Edge::Pending]
        );
    }

    #[test]
    fn test_resolve_fires_resolve_and_complete() {
        let now = Utc::now();
        let pending = WaiterRecord::idle().transition(&LifecycleEvent::init("x", json!(1)), now);
        let resolved = pending.transition(&LifecycleEvent::resolve(json!(2)), now);

        assert_eq!(
            TransitionDetector::edges(&pending, &resolved).as_slice(),
            &[Edge::Resolve, Edge::Complete]
        );
    }

    #[test]
    fn test_steady_flag_does_not_refire() {
        let now = Utc::now();
        let resolved = WaiterRecord::idle()
            .transition(&LifecycleEvent::init("x", json!(1)), now)
            .transition(&LifecycleEvent::resolve(json!(2)), now);
        let again = resolved.transition(&LifecycleEvent::resolve(json!(3)), now);

        assert!(TransitionDetector::edges(&resolved, &again).is_empty());
        assert!(TransitionDetector::edges(&resolved, &resolved).is_empty());
    }

    #[test]
    fn test_refresh_fires_pending_and_refresh() {
        let now = Utc::now();
        let resolved = WaiterRecord::idle()
            .transition(&LifecycleEvent::init("x", json!(1)), now)
            .transition(&LifecycleEvent::resolve(json!(2)), now);
        let refreshing = resolved.transition(&LifecycleEvent::init("x", json!(3)), now);

        assert_eq!(
            TransitionDetector::edges(&resolved, &refreshing).as_slice(),
            &[Edge::Pending, Edge::Refresh]
        );
    }

    #[test]
    fn test_reject_after_resolve_keeps_complete_steady() {
        let now = Utc::now();
        let resolved = WaiterRecord::idle()
            .transition(&LifecycleEvent::init("x", json!(1)), now)
            .transition(&LifecycleEvent::resolve(json!(2)), now);
        let rejected = resolved.transition(&LifecycleEvent::reject(json!("boom")), now);

        assert_eq!(
            TransitionDetector::edges(&resolved, &rejected).as_slice(),
            &[Edge::Reject]
        );
    }

    #[test]
    fn test_retry_edge_reads_reserved_flag() {
        let previous = WaiterRecord::idle();
        let next = WaiterRecord {
            is_retrying: true,
            ..WaiterRecord::idle()
        };

        assert!(TransitionDetector::fired(Edge::Retry, &previous, &next));
        assert!(!TransitionDetector::fired(Edge::Retry, &next, &next));
    }

    #[test]
    fn test_cancel_edge() {
        let now = Utc::now();
        let pending = WaiterRecord::idle().transition(&LifecycleEvent::init("x", json!(1)), now);
        let canceled = pending.transition(&LifecycleEvent::Cancel, now);

        assert_eq!(
            TransitionDetector::edges(&pending, &canceled).as_slice(),
            &[Edge::Cancel]
        );
    }
}
