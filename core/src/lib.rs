//! # Waiters Core
//!
//! Core types for tracking named asynchronous operations ("waiters").
//!
//! A waiter is a named record describing where one operation is in its
//! lifecycle: idle, pending (possibly refreshing a previous response),
//! resolved, rejected or canceled. Records only change through the pure
//! lifecycle transition in [`lifecycle`], driven by [`LifecycleEvent`]s.
//!
//! ## Core Concepts
//!
//! - **Record**: [`WaiterRecord`], the full snapshot for one waiter
//! - **Event**: [`LifecycleEvent`], one of PREPARE, INIT, RESOLVE, REJECT, CANCEL, CLEAR
//! - **Registry**: [`WaiterState`], every record keyed by name, with an idle default for unknown names
//! - **Reducer**: [`WaiterReducer`], routes name-keyed [`WaiterAction`]s to the record transition
//! - **Edges**: [`TransitionDetector`], which flags rose between two records
//!
//! ## Example
//!
//! ```
//! use waiters_core::{LifecycleEvent, WaiterRecord};
//! use chrono::Utc;
//! use serde_json::json;
//!
//! let now = Utc::now();
//! let record = WaiterRecord::idle()
//!     .transition(&LifecycleEvent::init("profile", json!({"user": 1})), now)
//!     .transition(&LifecycleEvent::resolve(json!({"name": "Ada"})), now);
//!
//! assert!(record.is_resolved);
//! assert_eq!(record.id, 1);
//! ```

// Re-export commonly used types
pub use chrono::{DateTime, Utc};
pub use serde::{Deserialize, Serialize};
pub use smallvec::{SmallVec, smallvec};

/// Lifecycle events and name-keyed registry actions
pub mod actions;

/// Edge detection between two consecutive records
pub mod edges;

/// The pure record-level state machine
pub mod lifecycle;

/// The waiter record model
pub mod record;

/// Registry state and selectors
pub mod registry;

/// Request creators: the opaque operation factories carried by records
pub mod request;

/// Registry-level reducer
pub mod waiter_reducer;

pub use actions::{LifecycleEvent, WaiterAction};
pub use edges::{Edge, Edges, TransitionDetector};
pub use record::{WaiterRecord, WaiterStatus};
pub use registry::{WaiterState, get_waiter, get_waiter_error, get_waiter_response};
pub use request::{RequestCreator, RequestFuture, SharedRequestCreator, request_fn};
pub use waiter_reducer::{StaleCompletionPolicy, WaiterEnvironment, WaiterReducer};

/// Reducer module - The core trait for state transitions
///
/// Reducers are pure functions: `(State, Action, Environment) → (State, Effects)`
pub mod reducer {
    use super::effect::Effect;
    use smallvec::SmallVec;

    /// The Reducer trait - core abstraction for state transitions
    ///
    /// # Type Parameters
    ///
    /// - `State`: The state this reducer operates on
    /// - `Action`: The action type this reducer processes
    /// - `Environment`: The injected dependencies this reducer needs
    pub trait Reducer {
        /// The state type this reducer operates on
        type State;

        /// The action type this reducer processes
        type Action;

        /// The environment type with injected dependencies
        type Environment;

        /// Reduce an action into state changes and effects
        ///
        /// Updates state in place and returns effect descriptions for the
        /// runtime to execute. Most actions produce no effects, so the
        /// inline capacity of four avoids heap allocation.
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]>;
    }
}

/// Effect module - Side effect descriptions
///
/// Effects describe side effects to be performed by the runtime.
/// They are values, not execution.
pub mod effect {
    use std::future::Future;
    use std::pin::Pin;

    /// Effect type - describes a side effect to be executed
    ///
    /// Effects are NOT executed immediately. They are returned from reducers
    /// and executed by the Store runtime.
    pub enum Effect<Action> {
        /// No-op effect
        None,

        /// Arbitrary async computation
        ///
        /// Returns `Option<Action>` - if Some, the action is fed back into the reducer
        Future(Pin<Box<dyn Future<Output = Option<Action>> + Send>>),
    }

    // Manual Debug implementation since Future doesn't implement Debug
    impl<Action> std::fmt::Debug for Effect<Action>
    where
        Action: std::fmt::Debug,
    {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                Effect::None => write!(f, "Effect::None"),
                Effect::Future(_) => write!(f, "Effect::Future(<future>)"),
            }
        }
    }

    impl<Action> Effect<Action> {
        /// Whether this effect does nothing
        #[must_use]
        pub const fn is_none(&self) -> bool {
            matches!(self, Effect::None)
        }
    }
}

/// Environment module - Dependency injection traits
///
/// All time reads go through [`Clock`](environment::Clock) so transitions
/// can be tested with a fixed or manually advanced clock.
pub mod environment {
    use chrono::{DateTime, Utc};

    /// Clock trait - abstracts time operations for testability
    ///
    /// # Examples
    ///
    /// ```
    /// use waiters_core::environment::{Clock, SystemClock};
    ///
    /// let clock = SystemClock;
    /// let _now = clock.now();
    /// ```
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Wall clock backed by [`Utc::now`]
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }
}
