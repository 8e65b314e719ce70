//! Registry-level reducer.
//!
//! Routes name-keyed [`WaiterAction`]s to the record transition and turns a
//! [`WaiterAction::Call`] into PREPARE + INIT plus an effect that runs the
//! request creator and feeds its outcome back as [`WaiterAction::Settled`].

use crate::actions::{LifecycleEvent, WaiterAction};
use crate::effect::Effect;
use crate::environment::{Clock, SystemClock};
use crate::reducer::Reducer;
use crate::registry::WaiterState;
use chrono::{DateTime, Utc};
use serde_json::Value;
use smallvec::{SmallVec, smallvec};
use std::sync::Arc;

/// Environment dependencies for the waiter reducer
#[derive(Clone)]
pub struct WaiterEnvironment {
    /// Single time source for every transition
    pub clock: Arc<dyn Clock>,
}

impl WaiterEnvironment {
    /// Creates a new `WaiterEnvironment`
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    /// Environment backed by the wall clock
    #[must_use]
    pub fn system() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl Default for WaiterEnvironment {
    fn default() -> Self {
        Self::system()
    }
}

impl std::fmt::Debug for WaiterEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WaiterEnvironment").finish_non_exhaustive()
    }
}

/// What to do with a completion whose operation has been superseded.
///
/// An operation is superseded when the record was re-initiated, canceled or
/// cleared after it started. Nothing stops the operation itself; this only
/// decides whether its late RESOLVE/REJECT is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StaleCompletionPolicy {
    /// Apply every completion to whatever record currently exists.
    #[default]
    Apply,

    /// Drop completions whose observed id is not the record's current id,
    /// or that arrive while the record is no longer pending.
    ///
    /// This changes observable behavior: a canceled waiter stays canceled
    /// even if its operation later succeeds.
    Discard,
}

/// Reducer for the waiter registry
#[derive(Debug, Clone, Copy, Default)]
pub struct WaiterReducer {
    stale_completions: StaleCompletionPolicy,
}

impl WaiterReducer {
    /// Creates a new `WaiterReducer` that applies every completion
    #[must_use]
    pub const fn new() -> Self {
        Self {
            stale_completions: StaleCompletionPolicy::Apply,
        }
    }

    /// Set the policy for superseded completions
    #[must_use]
    pub const fn with_stale_completions(mut self, policy: StaleCompletionPolicy) -> Self {
        self.stale_completions = policy;
        self
    }

    /// Policy for superseded completions
    #[must_use]
    pub const fn stale_completions(&self) -> StaleCompletionPolicy {
        self.stale_completions
    }

    /// Applies one lifecycle event to the named record
    fn apply(state: &mut WaiterState, name: String, event: &LifecycleEvent, now: DateTime<Utc>) {
        let next = state.get(&name).transition(event, now);
        tracing::debug!(
            waiter = %name,
            event = event.kind(),
            id = next.id,
            status = ?next.status(),
            "Applied waiter event"
        );
        state.insert(name, next);
    }

    /// Whether a completion for `observed_id` should be dropped
    fn is_stale(&self, state: &WaiterState, name: &str, observed_id: u64) -> bool {
        match self.stale_completions {
            StaleCompletionPolicy::Apply => false,
            StaleCompletionPolicy::Discard => state
                .get_stored(name)
                .is_none_or(|record| record.id != observed_id || !record.is_pending),
        }
    }

    /// PREPARE + INIT, returning the effect that runs the request creator
    fn call(
        state: &mut WaiterState,
        name: String,
        request_creator: Option<crate::SharedRequestCreator>,
        params: Option<Value>,
        now: DateTime<Utc>,
    ) -> SmallVec<[Effect<WaiterAction>; 4]> {
        let prepare = LifecycleEvent::prepare(name.clone(), request_creator, params);
        let prepared = state.get(&name).transition(&prepare, now);

        let Some(creator) = prepared.request_creator.clone() else {
            tracing::warn!(
                waiter = %name,
                "Waiter called without a request creator, skipping INIT"
            );
            state.insert(name, prepared);
            return SmallVec::new();
        };

        let params = prepared.params.clone();
        let init = LifecycleEvent::init(name.clone(), creator.describe(params.as_ref()));
        let initiated = prepared.transition(&init, now);
        let observed_id = initiated.id;

        tracing::debug!(waiter = %name, id = observed_id, "Issuing waiter request");
        state.insert(name.clone(), initiated);

        smallvec![Effect::Future(Box::pin(async move {
            let outcome = creator.call(params).await;
            Some(WaiterAction::Settled {
                name,
                observed_id,
                outcome,
            })
        }))]
    }
}

impl Reducer for WaiterReducer {
    type State = WaiterState;
    type Action = WaiterAction;
    type Environment = WaiterEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            WaiterAction::Dispatch {
                name,
                event: LifecycleEvent::Unknown,
            } => {
                // Identity transition; never materializes a record
                tracing::trace!(waiter = %name, "Ignoring unknown waiter event");
                SmallVec::new()
            },

            WaiterAction::Dispatch { name, event } => {
                Self::apply(state, name, &event, env.clock.now());
                SmallVec::new()
            },

            WaiterAction::Call {
                name,
                request_creator,
                params,
            } => Self::call(state, name, request_creator, params, env.clock.now()),

            WaiterAction::Settled {
                name,
                observed_id,
                outcome,
            } => {
                if self.is_stale(state, &name, observed_id) {
                    tracing::debug!(
                        waiter = %name,
                        observed_id,
                        "Discarding completion of superseded request"
                    );
                    return SmallVec::new();
                }

                let event = match outcome {
                    Ok(response) => LifecycleEvent::resolve(response),
                    Err(error) => LifecycleEvent::reject(error),
                };
                Self::apply(state, name, &event, env.clock.now());
                SmallVec::new()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request_fn;
    use serde_json::json;

    struct StoppedClock(DateTime<Utc>);

    impl Clock for StoppedClock {
        fn now(&self) -> DateTime<Utc> {
            self.0
        }
    }

    fn test_env() -> WaiterEnvironment {
        WaiterEnvironment::new(Arc::new(StoppedClock(Utc::now())))
    }

    fn settled(name: &str, observed_id: u64, outcome: Result<Value, Value>) -> WaiterAction {
        WaiterAction::Settled {
            name: name.to_string(),
            observed_id,
            outcome,
        }
    }

    #[test]
    fn test_dispatch_creates_record_implicitly() {
        let reducer = WaiterReducer::new();
        let mut state = WaiterState::new();
        let env = test_env();

        let effects = reducer.reduce(&mut state, WaiterAction::init("x", json!(1)), &env);

        assert!(effects.is_empty());
        assert!(state.get("x").is_pending);
        assert_eq!(state.len(), 1);
    }

    #[test]
    fn test_unknown_event_does_not_materialize() {
        let reducer = WaiterReducer::new();
        let mut state = WaiterState::new();
        let env = test_env();

        reducer.reduce(
            &mut state,
            WaiterAction::dispatch("ghost", LifecycleEvent::Unknown),
            &env,
        );

        assert!(state.is_empty());
    }

    #[test]
    fn test_names_are_independent() {
        let reducer = WaiterReducer::new();
        let mut state = WaiterState::new();
        let env = test_env();

        reducer.reduce(&mut state, WaiterAction::init("a", json!(1)), &env);
        reducer.reduce(&mut state, WaiterAction::init("b", json!(1)), &env);
        reducer.reduce(&mut state, WaiterAction::resolve("a", json!("done")), &env);

        assert!(state.get("a").is_resolved);
        assert!(state.get("b").is_pending);
    }

    #[test]
    fn test_call_prepares_inits_and_returns_request_effect() {
        let reducer = WaiterReducer::new();
        let mut state = WaiterState::new();
        let env = test_env();
        let creator = request_fn(|params| async move { Ok(json!({ "got": params })) });

        let effects = reducer.reduce(
            &mut state,
            WaiterAction::call("x", Some(creator.clone()), Some(json!({"p": 1}))),
            &env,
        );

        let record = state.get("x");
        assert!(record.is_pending);
        assert_eq!(record.id, 1);
        assert_eq!(record.params, Some(json!({"p": 1})));
        assert_eq!(record.request, Some(json!({"p": 1})));
        assert_eq!(record.request_creator, Some(creator));
        assert_eq!(effects.len(), 1);
        assert!(matches!(effects[0], Effect::Future(_)));
    }

    #[test]
    fn test_call_effect_reports_settled_with_observed_id() {
        let reducer = WaiterReducer::new();
        let mut state = WaiterState::new();
        let env = test_env();
        let creator = request_fn(|_| async { Err(json!("boom")) });

        let mut effects =
            reducer.reduce(&mut state, WaiterAction::call("x", Some(creator), None), &env);

        let Some(Effect::Future(future)) = effects.pop() else {
            unreachable!("call always returns a future effect when a creator is present");
        };
        let feedback = tokio_test::block_on(future);

        assert_eq!(feedback, Some(settled("x", 1, Err(json!("boom")))));
    }

    #[test]
    fn test_call_reuses_carried_creator_and_params() {
        let reducer = WaiterReducer::new();
        let mut state = WaiterState::new();
        let env = test_env();
        let creator = request_fn(|_| async { Ok(json!(1)) });

        reducer.reduce(
            &mut state,
            WaiterAction::call("x", Some(creator), Some(json!("first"))),
            &env,
        );
        reducer.reduce(&mut state, settled("x", 1, Ok(json!(1))), &env);
        let effects = reducer.reduce(&mut state, WaiterAction::call("x", None, None), &env);

        let record = state.get("x");
        assert_eq!(effects.len(), 1);
        assert_eq!(record.id, 2);
        assert!(record.is_refreshing);
        assert_eq!(record.params, Some(json!("first")));
    }

    #[test]
    fn test_call_without_creator_only_prepares() {
        let reducer = WaiterReducer::new();
        let mut state = WaiterState::new();
        let env = test_env();

        let effects = reducer.reduce(
            &mut state,
            WaiterAction::call("x", None, Some(json!(1))),
            &env,
        );

        let record = state.get("x");
        assert!(effects.is_empty());
        assert_eq!(record.id, 0);
        assert!(!record.is_pending);
        assert_eq!(record.params, Some(json!(1)));
    }

    #[test]
    fn test_settled_resolves_and_rejects() {
        let reducer = WaiterReducer::new();
        let mut state = WaiterState::new();
        let env = test_env();

        reducer.reduce(&mut state, WaiterAction::init("x", json!(1)), &env);
        reducer.reduce(&mut state, settled("x", 1, Ok(json!("yes"))), &env);
        assert_eq!(state.get("x").response, Some(json!("yes")));

        reducer.reduce(&mut state, WaiterAction::init("x", json!(2)), &env);
        reducer.reduce(&mut state, settled("x", 2, Err(json!("no"))), &env);
        assert!(state.get("x").is_rejected);
        assert_eq!(state.get("x").error, Some(json!("no")));
    }

    #[test]
    fn test_late_completion_applies_by_default() {
        let reducer = WaiterReducer::new();
        let mut state = WaiterState::new();
        let env = test_env();

        reducer.reduce(&mut state, WaiterAction::init("x", json!(1)), &env);
        reducer.reduce(&mut state, WaiterAction::cancel("x"), &env);
        reducer.reduce(&mut state, settled("x", 1, Ok(json!("late"))), &env);

        let record = state.get("x");
        assert!(record.is_resolved);
        assert!(!record.is_canceled);
        assert_eq!(record.response, Some(json!("late")));
    }

    #[test]
    fn test_discard_policy_drops_superseded_completions() {
        let reducer = WaiterReducer::new().with_stale_completions(StaleCompletionPolicy::Discard);
        let mut state = WaiterState::new();
        let env = test_env();

        reducer.reduce(&mut state, WaiterAction::init("x", json!(1)), &env);
        reducer.reduce(&mut state, WaiterAction::init("x", json!(2)), &env);
        reducer.reduce(&mut state, settled("x", 1, Ok(json!("old"))), &env);
        assert!(state.get("x").is_pending);

        reducer.reduce(&mut state, settled("x", 2, Ok(json!("new"))), &env);
        assert_eq!(state.get("x").response, Some(json!("new")));

        reducer.reduce(&mut state, WaiterAction::init("x", json!(3)), &env);
        reducer.reduce(&mut state, WaiterAction::cancel("x"), &env);
        reducer.reduce(&mut state, settled("x", 3, Err(json!("late"))), &env);
        assert!(state.get("x").is_canceled);

        reducer.reduce(&mut state, settled("unknown", 1, Ok(json!(1))), &env);
        assert!(!state.contains("unknown"));
    }
}
