//! Lifecycle events and registry actions.

use crate::request::SharedRequestCreator;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An event applied to a single waiter record.
///
/// On the wire an event is `{"type": "INIT", "payload": {...}}`. Any `type`
/// not listed here deserializes to [`LifecycleEvent::Unknown`], whatever its
/// payload, and leaves the record untouched. A payload on CANCEL or CLEAR is
/// ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    content = "payload",
    rename_all = "SCREAMING_SNAKE_CASE",
    try_from = "WireEvent"
)]
pub enum LifecycleEvent {
    /// Stage metadata before an INIT. No flag changes.
    Prepare {
        /// Waiter name
        name: String,

        /// Replaces the carried creator only when supplied
        #[serde(skip)]
        request_creator: Option<SharedRequestCreator>,

        /// Replaces the carried params only when supplied
        #[serde(default)]
        params: Option<Value>,
    },

    /// An operation was issued.
    Init {
        /// Waiter name
        name: String,

        /// In-flight request descriptor
        request: Value,
    },

    /// The operation succeeded.
    Resolve {
        /// Operation result
        response: Value,
    },

    /// The operation failed.
    Reject {
        /// Failure payload
        error: Value,
    },

    /// Stop displaying the operation as in flight.
    Cancel,

    /// Return the record to idle shape.
    Clear,

    /// Any event kind this version does not recognize.
    Unknown,
}

/// Loosest shape an event can take on the wire
#[derive(Deserialize)]
struct WireEvent {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    payload: Option<Value>,
}

#[derive(Deserialize)]
struct PreparePayload {
    name: String,
    #[serde(default)]
    params: Option<Value>,
}

#[derive(Deserialize)]
struct InitPayload {
    name: String,
    request: Value,
}

#[derive(Deserialize)]
struct ResolvePayload {
    response: Value,
}

#[derive(Deserialize)]
struct RejectPayload {
    error: Value,
}

impl TryFrom<WireEvent> for LifecycleEvent {
    type Error = serde_json::Error;

    fn try_from(wire: WireEvent) -> Result<Self, Self::Error> {
        let payload = wire.payload.unwrap_or_default();

        let event = match wire.kind.as_str() {
            "PREPARE" => {
                let PreparePayload { name, params } = serde_json::from_value(payload)?;
                Self::prepare(name, None, params)
            },
            "INIT" => {
                let InitPayload { name, request } = serde_json::from_value(payload)?;
                Self::Init { name, request }
            },
            "RESOLVE" => {
                let ResolvePayload { response } = serde_json::from_value(payload)?;
                Self::Resolve { response }
            },
            "REJECT" => {
                let RejectPayload { error } = serde_json::from_value(payload)?;
                Self::Reject { error }
            },
            "CANCEL" => Self::Cancel,
            "CLEAR" => Self::Clear,
            _ => Self::Unknown,
        };
        Ok(event)
    }
}

impl LifecycleEvent {
    /// PREPARE event.
    #[must_use]
    pub fn prepare(
        name: impl Into<String>,
        request_creator: Option<SharedRequestCreator>,
        params: Option<Value>,
    ) -> Self {
        Self::Prepare {
            name: name.into(),
            request_creator,
            params,
        }
    }

    /// INIT event.
    #[must_use]
    pub fn init(name: impl Into<String>, request: Value) -> Self {
        Self::Init {
            name: name.into(),
            request,
        }
    }

    /// RESOLVE event.
    #[must_use]
    pub const fn resolve(response: Value) -> Self {
        Self::Resolve { response }
    }

    /// REJECT event.
    #[must_use]
    pub const fn reject(error: Value) -> Self {
        Self::Reject { error }
    }

    /// Wire name of the event kind, for logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Prepare { .. } => "PREPARE",
            Self::Init { .. } => "INIT",
            Self::Resolve { .. } => "RESOLVE",
            Self::Reject { .. } => "REJECT",
            Self::Cancel => "CANCEL",
            Self::Clear => "CLEAR",
            Self::Unknown => "UNKNOWN",
        }
    }
}

/// Actions processed by [`WaiterReducer`](crate::WaiterReducer).
///
/// Every action is keyed by the waiter name it targets.
#[derive(Debug, Clone, PartialEq)]
pub enum WaiterAction {
    /// Apply a lifecycle event to the named record.
    Dispatch {
        /// Target waiter
        name: String,

        /// Event to apply
        event: LifecycleEvent,
    },

    /// Issue the operation: PREPARE, INIT, then run the request creator.
    ///
    /// The creator and params fall back to those already carried by the
    /// record when not supplied.
    Call {
        /// Target waiter
        name: String,

        /// Operation factory
        request_creator: Option<SharedRequestCreator>,

        /// Parameters for the operation
        params: Option<Value>,
    },

    /// Completion of an operation started by [`WaiterAction::Call`].
    ///
    /// Fed back by the request effect. Becomes a RESOLVE or REJECT.
    Settled {
        /// Target waiter
        name: String,

        /// Record id at the time the operation was initiated
        observed_id: u64,

        /// `Ok(response)` or `Err(error)`
        outcome: Result<Value, Value>,
    },
}

impl WaiterAction {
    /// Name of the waiter this action targets.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Dispatch { name, .. } | Self::Call { name, .. } | Self::Settled { name, .. } => {
                name
            },
        }
    }

    /// Apply `event` to `name`.
    #[must_use]
    pub fn dispatch(name: impl Into<String>, event: LifecycleEvent) -> Self {
        Self::Dispatch {
            name: name.into(),
            event,
        }
    }

    /// PREPARE against `name`.
    #[must_use]
    pub fn prepare(
        name: impl Into<String>,
        request_creator: Option<SharedRequestCreator>,
        params: Option<Value>,
    ) -> Self {
        let name = name.into();
        let event = LifecycleEvent::prepare(name.clone(), request_creator, params);
        Self::Dispatch { name, event }
    }

    /// INIT against `name`.
    #[must_use]
    pub fn init(name: impl Into<String>, request: Value) -> Self {
        let name = name.into();
        let event = LifecycleEvent::init(name.clone(), request);
        Self::Dispatch { name, event }
    }

    /// RESOLVE against `name`.
    #[must_use]
    pub fn resolve(name: impl Into<String>, response: Value) -> Self {
        Self::dispatch(name, LifecycleEvent::resolve(response))
    }

    /// REJECT against `name`.
    #[must_use]
    pub fn reject(name: impl Into<String>, error: Value) -> Self {
        Self::dispatch(name, LifecycleEvent::reject(error))
    }

    /// CANCEL against `name`.
    #[must_use]
    pub fn cancel(name: impl Into<String>) -> Self {
        Self::dispatch(name, LifecycleEvent::Cancel)
    }

    /// CLEAR against `name`.
    #[must_use]
    pub fn clear(name: impl Into<String>) -> Self {
        Self::dispatch(name, LifecycleEvent::Clear)
    }

    /// Issue the operation for `name`.
    #[must_use]
    pub fn call(
        name: impl Into<String>,
        request_creator: Option<SharedRequestCreator>,
        params: Option<Value>,
    ) -> Self {
        Self::Call {
            name: name.into(),
            request_creator,
            params,
        }
    }
}
