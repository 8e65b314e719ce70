//! Request creators whose outcomes are set by the test.

use futures::future::FutureExt;
use serde_json::{Value, json};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::oneshot;
use waiters_core::{RequestCreator, RequestFuture, SharedRequestCreator};

type Outcome = Result<Value, Value>;

enum Step {
    Ready(Outcome),
    Gated(oneshot::Receiver<Outcome>),
}

#[derive(Default)]
struct Script {
    steps: VecDeque<Step>,
    calls: Vec<Option<Value>>,
}

/// Request creator that plays back a script of outcomes, one per call
///
/// Steps are consumed in order. A call with no step left rejects with
/// `"script exhausted"`. Every call's params are recorded.
///
/// # Example
///
/// ```
/// use waiters_testing::ScriptedRequest;
/// use serde_json::json;
///
/// let request = ScriptedRequest::new()
///     .then_resolve(json!(1))
///     .then_reject(json!("boom"));
///
/// let first = tokio_test::block_on(request.shared().call(None));
/// assert_eq!(first, Ok(json!(1)));
/// assert_eq!(request.call_count(), 1);
/// ```
#[derive(Clone, Default)]
pub struct ScriptedRequest {
    script: Arc<Mutex<Script>>,
}

impl ScriptedRequest {
    /// Empty script
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, step: Step) {
        self.script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .steps
            .push_back(step);
    }

    /// Next call resolves with `response`
    #[must_use]
    pub fn then_resolve(self, response: Value) -> Self {
        self.push(Step::Ready(Ok(response)));
        self
    }

    /// Next call rejects with `error`
    #[must_use]
    pub fn then_reject(self, error: Value) -> Self {
        self.push(Step::Ready(Err(error)));
        self
    }

    /// Next call stays in flight until the returned gate is opened
    #[must_use]
    pub fn then_gate(&self) -> RequestGate {
        let (tx, rx) = oneshot::channel();
        self.push(Step::Gated(rx));
        RequestGate { tx }
    }

    /// Params of every call so far, in order
    #[must_use]
    pub fn calls(&self) -> Vec<Option<Value>> {
        self.script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .calls
            .clone()
    }

    /// Number of calls so far
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .calls
            .len()
    }

    /// Handle to store in a waiter record
    ///
    /// Each call returns a new identity; clone one handle to compare equal.
    #[must_use]
    pub fn shared(&self) -> SharedRequestCreator {
        SharedRequestCreator::from(Arc::new(self.clone()) as Arc<dyn RequestCreator>)
    }
}

impl RequestCreator for ScriptedRequest {
    fn call(&self, params: Option<Value>) -> RequestFuture {
        let step = {
            let mut script = self.script.lock().unwrap_or_else(PoisonError::into_inner);
            script.calls.push(params);
            script.steps.pop_front()
        };

        async move {
            match step {
                Some(Step::Ready(outcome)) => outcome,
                Some(Step::Gated(rx)) => rx
                    .await
                    .unwrap_or_else(|_| Err(json!("request gate dropped"))),
                None => Err(json!("script exhausted")),
            }
        }
        .boxed()
    }
}

impl std::fmt::Debug for ScriptedRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptedRequest")
            .field("calls", &self.call_count())
            .finish_non_exhaustive()
    }
}

/// Completes one gated call of a [`ScriptedRequest`]
///
/// Dropping the gate rejects the call with `"request gate dropped"`.
#[derive(Debug)]
pub struct RequestGate {
    tx: oneshot::Sender<Outcome>,
}

impl RequestGate {
    /// Resolve the gated call
    pub fn resolve(self, response: Value) {
        let _ = self.tx.send(Ok(response));
    }

    /// Reject the gated call
    pub fn reject(self, error: Value) {
        let _ = self.tx.send(Err(error));
    }
}
