//! # Waiters Testing
//!
//! Testing utilities for the waiters workspace.
//!
//! This crate provides:
//! - Deterministic clocks ([`FixedClock`], [`ManualClock`])
//! - Request creators with scripted outcomes ([`ScriptedRequest`])
//! - The [`ReducerTest`] Given/When/Then harness
//! - proptest strategies for lifecycle events
//!
//! ## Example
//!
//! ```ignore
//! use waiters_testing::{test_store, ScriptedRequest};
//! use serde_json::json;
//!
//! #[tokio::test]
//! async fn test_profile_loads() {
//!     let store = test_store();
//!     let request = ScriptedRequest::new().then_resolve(json!({"name": "Ada"}));
//!
//!     let mut handle = store.call("profile", Some(request.shared()), None).await?;
//!     handle.wait().await;
//!
//!     assert!(store.waiter("profile").await.is_resolved);
//! }
//! ```

use chrono::{DateTime, Duration, Utc};
use std::sync::{Arc, Mutex, PoisonError};
use waiters_core::{WaiterEnvironment, environment::Clock};
use waiters_runtime::WaiterStore;

/// Given/When/Then harness for reducers
pub mod reducer_test;

/// Request creators with scripted outcomes
pub mod scripted;

/// Mock implementations of Environment traits
pub mod mocks {
    use super::{Arc, Clock, DateTime, Duration, Mutex, PoisonError, Utc};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use waiters_testing::mocks::FixedClock;
    /// use waiters_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Clock that only moves when told to
    ///
    /// Clones share the same time, so a test can keep one handle and give
    /// another to the environment.
    ///
    /// # Example
    ///
    /// ```
    /// use waiters_testing::mocks::ManualClock;
    /// use waiters_core::environment::Clock;
    /// use chrono::{Duration, Utc};
    ///
    /// let clock = ManualClock::new(Utc::now());
    /// let start = clock.now();
    /// clock.advance(Duration::milliseconds(250));
    /// assert_eq!(clock.now() - start, Duration::milliseconds(250));
    /// ```
    #[derive(Debug, Clone)]
    pub struct ManualClock {
        time: Arc<Mutex<DateTime<Utc>>>,
    }

    impl ManualClock {
        /// Create a clock stopped at `time`
        #[must_use]
        pub fn new(time: DateTime<Utc>) -> Self {
            Self {
                time: Arc::new(Mutex::new(time)),
            }
        }

        /// Move the clock forward
        pub fn advance(&self, by: Duration) {
            let mut time = self.time.lock().unwrap_or_else(PoisonError::into_inner);
            *time += by;
        }

        /// Jump to an absolute time
        pub fn set(&self, to: DateTime<Utc>) {
            *self.time.lock().unwrap_or_else(PoisonError::into_inner) = to;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            *self.time.lock().unwrap_or_else(PoisonError::into_inner)
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }
}

/// Property-based testing utilities
///
/// Strategies for generating lifecycle events with proptest.
pub mod properties {
    use proptest::prelude::*;
    use serde_json::{Value, json};
    use waiters_core::LifecycleEvent;

    /// Small JSON payloads
    pub fn payload() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(Value::Null),
            any::<i64>().prop_map(|n| json!(n)),
            "[a-z]{0,8}".prop_map(Value::String),
            any::<bool>().prop_map(|b| json!({ "ok": b })),
        ]
    }

    /// Any lifecycle event against `name`, including unknown kinds
    pub fn lifecycle_event(name: &'static str) -> impl Strategy<Value = LifecycleEvent> {
        prop_oneof![
            proptest::option::of(payload())
                .prop_map(move |params| LifecycleEvent::prepare(name, None, params)),
            payload().prop_map(move |request| LifecycleEvent::init(name, request)),
            payload().prop_map(LifecycleEvent::resolve),
            payload().prop_map(LifecycleEvent::reject),
            Just(LifecycleEvent::Cancel),
            Just(LifecycleEvent::Clear),
            Just(LifecycleEvent::Unknown),
        ]
    }
}

/// Waiter environment on the fixed test clock
#[must_use]
pub fn test_environment() -> WaiterEnvironment {
    WaiterEnvironment::new(Arc::new(test_clock()))
}

/// Empty waiter store on the fixed test clock
#[must_use]
pub fn test_store() -> WaiterStore {
    WaiterStore::waiters(test_environment())
}

/// Install a fmt subscriber honoring `RUST_LOG` for the current test binary
///
/// Safe to call from every test; only the first call installs.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// Re-export commonly used items
pub use mocks::{FixedClock, ManualClock, test_clock};
pub use reducer_test::{ReducerTest, assertions};
pub use scripted::{RequestGate, ScriptedRequest};
