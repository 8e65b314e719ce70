//! The waiter store.
//!
//! A [`WaiterStore`] is a [`Store`] running the [`WaiterReducer`] over the
//! [`WaiterState`] registry. The inherent methods here are thin wrappers that
//! build [`WaiterAction`]s and read records through the registry selectors.

use crate::error::StoreError;
use crate::store::Store;
use crate::{EffectHandle, StoreConfig};
use serde_json::Value;
use waiters_core::{
    LifecycleEvent, SharedRequestCreator, WaiterAction, WaiterEnvironment, WaiterReducer,
    WaiterRecord, WaiterState, get_waiter, get_waiter_error, get_waiter_response,
};

/// Store holding every waiter record
pub type WaiterStore = Store<WaiterState, WaiterAction, WaiterEnvironment, WaiterReducer>;

impl WaiterStore {
    /// Empty registry with the default reducer
    #[must_use]
    pub fn waiters(environment: WaiterEnvironment) -> Self {
        Self::new(WaiterState::new(), WaiterReducer::new(), environment)
    }

    /// Empty registry with a configured reducer and store settings
    #[must_use]
    pub fn waiters_with(
        reducer: WaiterReducer,
        environment: WaiterEnvironment,
        config: StoreConfig,
    ) -> Self {
        Self::with_config(WaiterState::new(), reducer, environment, config)
    }

    /// Current record for `name`, or the idle default
    pub async fn waiter(&self, name: &str) -> WaiterRecord {
        self.state(|state| get_waiter(state, name)).await
    }

    /// Latest response for `name`
    pub async fn waiter_response(&self, name: &str) -> Option<Value> {
        self.state(|state| get_waiter_response(state, name)).await
    }

    /// Latest error for `name`
    pub async fn waiter_error(&self, name: &str) -> Option<Value> {
        self.state(|state| get_waiter_error(state, name)).await
    }

    /// Apply one lifecycle event to `name`
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] if the store is shutting down.
    pub async fn dispatch(
        &self,
        name: impl Into<String>,
        event: LifecycleEvent,
    ) -> Result<EffectHandle, StoreError> {
        self.send(WaiterAction::dispatch(name, event)).await
    }

    /// Issue the request for `name`
    ///
    /// A `None` creator or `None` params reuse whatever the record carries.
    /// Wait on the returned handle to observe the settled record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] if the store is shutting down.
    pub async fn call(
        &self,
        name: impl Into<String>,
        request_creator: Option<SharedRequestCreator>,
        params: Option<Value>,
    ) -> Result<EffectHandle, StoreError> {
        self.send(WaiterAction::call(name, request_creator, params))
            .await
    }

    /// Cancel the pending operation for `name`
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] if the store is shutting down.
    pub async fn cancel(&self, name: impl Into<String>) -> Result<EffectHandle, StoreError> {
        self.send(WaiterAction::cancel(name)).await
    }

    /// Reset `name` to idle, keeping its request creator and params
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] if the store is shutting down.
    pub async fn clear(&self, name: impl Into<String>) -> Result<EffectHandle, StoreError> {
        self.send(WaiterAction::clear(name)).await
    }
}
