//! Presentation selection and render containment.
//!
//! A view that fails, by returning an error or by panicking, is stopped at
//! this boundary. The failure is logged and returned as a
//! [`RenderOutcome::Defect`]; it never reaches the waiter record.

use crate::config::{BindingConfig, View};
use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use thiserror::Error;
use waiters_core::WaiterRecord;

/// Which view a record selects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewKind {
    /// The configured pending view
    Pending,
    /// The configured rejected view
    Rejected,
    /// The wrapped view
    Wrapped,
}

/// A view failed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderDefect {
    /// The view returned an error
    #[error("view failed: {0}")]
    Failed(String),

    /// The view panicked
    #[error("view panicked: {0}")]
    Panicked(String),
}

/// Result of one render
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderOutcome<O> {
    /// The selected view produced output
    Rendered(O),
    /// The selected view failed; nothing was rendered
    Defect(RenderDefect),
}

impl<O> RenderOutcome<O> {
    /// Output, if the view succeeded
    pub fn rendered(self) -> Option<O> {
        match self {
            Self::Rendered(output) => Some(output),
            Self::Defect(_) => None,
        }
    }

    /// Whether the view failed
    pub const fn is_defect(&self) -> bool {
        matches!(self, Self::Defect(_))
    }
}

impl<I, O> BindingConfig<I, O> {
    /// View selected by `record`
    ///
    /// Pending wins over rejected. A state without its configured view falls
    /// through to the wrapped view.
    #[must_use]
    pub fn select_view(&self, record: &WaiterRecord) -> ViewKind {
        if record.is_pending && self.pending_view.is_some() {
            ViewKind::Pending
        } else if record.is_rejected && self.rejected_view.is_some() {
            ViewKind::Rejected
        } else {
            ViewKind::Wrapped
        }
    }

    pub(crate) fn view<'a>(&'a self, kind: ViewKind, wrapped: &'a View<I, O>) -> &'a View<I, O> {
        let selected = match kind {
            ViewKind::Pending => self.pending_view.as_ref(),
            ViewKind::Rejected => self.rejected_view.as_ref(),
            ViewKind::Wrapped => None,
        };
        selected.unwrap_or(wrapped)
    }
}

/// Run `view`, containing any failure
pub(crate) fn contain<I, O>(
    name: &str,
    kind: ViewKind,
    view: &View<I, O>,
    inputs: &I,
    record: &WaiterRecord,
) -> RenderOutcome<O> {
    let defect = match catch_unwind(AssertUnwindSafe(|| view(inputs, record))) {
        Ok(Ok(output)) => return RenderOutcome::Rendered(output),
        Ok(Err(error)) => RenderDefect::Failed(format!("{error:#}")),
        Err(payload) => RenderDefect::Panicked(panic_message(payload.as_ref())),
    };

    tracing::warn!(
        waiter = %name,
        view = ?kind,
        %defect,
        "Caught a failure in a bound view; the waiter is unaffected"
    );
    RenderOutcome::Defect(defect)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|message| (*message).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::panic)] // Test code

    use super::*;
    use std::sync::Arc;

    fn view<F>(f: F) -> View<(), &'static str>
    where
        F: Fn(&(), &WaiterRecord) -> anyhow::Result<&'static str> + Send + Sync + 'static,
    {
        Arc::new(f)
    }

    #[test]
    fn test_pending_wins_then_rejected_then_wrapped() {
        let config = BindingConfig::<(), &str>::named("x")
            .pending_view(|_, _| Ok("pending"))
            .rejected_view(|_, _| Ok("rejected"));

        let pending = WaiterRecord {
            is_pending: true,
            ..WaiterRecord::idle()
        };
        let rejected = WaiterRecord {
            is_rejected: true,
            ..WaiterRecord::idle()
        };

        assert_eq!(config.select_view(&pending), ViewKind::Pending);
        assert_eq!(config.select_view(&rejected), ViewKind::Rejected);
        assert_eq!(config.select_view(&WaiterRecord::idle()), ViewKind::Wrapped);
    }

    #[test]
    fn test_missing_view_falls_through_to_wrapped() {
        let config = BindingConfig::<(), &str>::named("x");
        let pending = WaiterRecord {
            is_pending: true,
            ..WaiterRecord::idle()
        };

        assert_eq!(config.select_view(&pending), ViewKind::Wrapped);
    }

    #[test]
    fn test_contain_reports_errors_and_panics() {
        let wrapped = view(|_, _| Ok("wrapped"));
        let failing = view(|_, _| Err(anyhow::anyhow!("bad template")));
        let panicking = view(|_, _| panic!("index out of range"));
        let record = WaiterRecord::idle();

        assert_eq!(
            contain("x", ViewKind::Wrapped, &wrapped, &(), &record),
            RenderOutcome::Rendered("wrapped")
        );
        assert_eq!(
            contain("x", ViewKind::Wrapped, &failing, &(), &record),
            RenderOutcome::Defect(RenderDefect::Failed("bad template".to_string()))
        );
        assert_eq!(
            contain("x", ViewKind::Wrapped, &panicking, &(), &record),
            RenderOutcome::Defect(RenderDefect::Panicked("index out of range".to_string()))
        );
    }
}
