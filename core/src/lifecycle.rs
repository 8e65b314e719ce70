//! Record-level lifecycle transitions.
//!
//! ```text
//!   Idle ──INIT──► Pending ──RESOLVE──► Resolved
//!                    │  └────REJECT───► Rejected
//!                    └──────CANCEL────► Canceled
//! ```
//!
//! INIT from any state re-enters Pending, refreshing when a non-null
//! response is still held. CLEAR from any state returns to Idle.
//!
//! Every transition builds a new record from the previous one. The input
//! is never modified, and unknown events hand back an identical copy.

use crate::actions::LifecycleEvent;
use crate::record::WaiterRecord;
use chrono::{DateTime, Utc};

impl WaiterRecord {
    /// Apply `event` at time `now`, producing the next record.
    ///
    /// Total: every event, in every state, yields a well-formed record.
    /// `now` should be read once per transition from the environment clock.
    #[must_use]
    pub fn transition(&self, event: &LifecycleEvent, now: DateTime<Utc>) -> Self {
        match event {
            LifecycleEvent::Prepare {
                name,
                request_creator,
                params,
            } => Self {
                name: Some(name.clone()),
                request_creator: request_creator
                    .clone()
                    .or_else(|| self.request_creator.clone()),
                params: params
                    .clone()
                    .filter(|params| !params.is_null())
                    .or_else(|| self.params.clone()),
                ..self.clone()
            },

            LifecycleEvent::Init { name, request } => Self {
                id: self.id + 1,
                name: Some(name.clone()),
                request: Some(request.clone()),
                error: None,
                // A non-null response from an earlier run makes this a refresh.
                is_refreshing: self.response.as_ref().is_some_and(|r| !r.is_null()),
                is_pending: true,
                is_resolved: false,
                is_rejected: false,
                is_completed: false,
                is_canceled: false,
                is_retrying: false,
                start_time: Some(now),
                last_modified: Some(now),
                ..self.clone()
            },

            LifecycleEvent::Resolve { response } => Self {
                response: Some(response.clone()),
                error: None,
                is_refreshing: false,
                is_pending: false,
                is_resolved: true,
                is_rejected: false,
                is_completed: true,
                is_canceled: false,
                ..self.settled_at(now)
            },

            LifecycleEvent::Reject { error } => Self {
                response: None,
                error: Some(error.clone()),
                is_refreshing: false,
                is_pending: false,
                is_resolved: false,
                is_rejected: true,
                is_completed: true,
                is_canceled: false,
                ..self.settled_at(now)
            },

            LifecycleEvent::Cancel => Self {
                request: None,
                response: None,
                is_refreshing: false,
                is_pending: false,
                is_resolved: false,
                is_rejected: false,
                is_completed: false,
                is_canceled: true,
                ..self.settled_at(now)
            },

            LifecycleEvent::Clear => Self {
                id: self.id,
                name: self.name.clone(),
                request_creator: self.request_creator.clone(),
                params: self.params.clone(),
                last_modified: Some(now),
                ..Self::idle()
            },

            LifecycleEvent::Unknown => self.clone(),
        }
    }

    /// Copy with end-of-operation timestamps stamped at `now`.
    fn settled_at(&self, now: DateTime<Utc>) -> Self {
        Self {
            end_time: Some(now),
            elapsed_ms: self
                .start_time
                .map(|start| now.signed_duration_since(start).num_milliseconds()),
            last_modified: Some(now),
            ..self.clone()
        }
    }
}
