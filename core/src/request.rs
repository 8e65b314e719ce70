//! Request creators.
//!
//! A request creator is the opaque factory that actually performs a waiter's
//! operation. The core never looks inside it: the record carries it so that
//! a refresh can re-run the same operation without the caller supplying it
//! again, and the runtime invokes it when a waiter is called.

use futures::future::{BoxFuture, FutureExt};
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;

/// The future returned by a request creator.
///
/// `Ok` becomes a RESOLVE with the value as response, `Err` becomes a
/// REJECT with the value as error payload.
pub type RequestFuture = BoxFuture<'static, Result<Value, Value>>;

/// An operation factory.
pub trait RequestCreator: Send + Sync {
    /// Request descriptor stored in the record's `request` slot while the
    /// operation is in flight.
    ///
    /// Defaults to the parameters, or `null` when there are none.
    fn describe(&self, params: Option<&Value>) -> Value {
        params.cloned().unwrap_or(Value::Null)
    }

    /// Start the operation.
    fn call(&self, params: Option<Value>) -> RequestFuture;
}

/// Reference-counted handle to a [`RequestCreator`].
///
/// Two handles are equal when they point at the same creator.
#[derive(Clone)]
pub struct SharedRequestCreator(Arc<dyn RequestCreator>);

impl SharedRequestCreator {
    /// Wrap a request creator.
    #[must_use]
    pub fn new<C>(creator: C) -> Self
    where
        C: RequestCreator + 'static,
    {
        Self(Arc::new(creator))
    }

    /// See [`RequestCreator::describe`].
    #[must_use]
    pub fn describe(&self, params: Option<&Value>) -> Value {
        self.0.describe(params)
    }

    /// See [`RequestCreator::call`].
    #[must_use]
    pub fn call(&self, params: Option<Value>) -> RequestFuture {
        self.0.call(params)
    }
}

impl From<Arc<dyn RequestCreator>> for SharedRequestCreator {
    fn from(creator: Arc<dyn RequestCreator>) -> Self {
        Self(creator)
    }
}

impl PartialEq for SharedRequestCreator {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl std::fmt::Debug for SharedRequestCreator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SharedRequestCreator(<request creator>)")
    }
}

/// Closure-backed request creator, built with [`request_fn`].
pub struct FnRequestCreator<F>(F);

impl<F, Fut> RequestCreator for FnRequestCreator<F>
where
    F: Fn(Option<Value>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value, Value>> + Send + 'static,
{
    fn call(&self, params: Option<Value>) -> RequestFuture {
        (self.0)(params).boxed()
    }
}

/// Build a request creator from an async closure.
///
/// # Example
///
/// ```
/// use waiters_core::request_fn;
/// use serde_json::{json, Value};
///
/// let creator = request_fn(|params: Option<Value>| async move {
///     Ok::<_, Value>(json!({ "echo": params }))
/// });
/// let _future = creator.call(Some(json!(1)));
/// ```
#[must_use]
pub fn request_fn<F, Fut>(f: F) -> SharedRequestCreator
where
    F: Fn(Option<Value>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, Value>> + Send + 'static,
{
    SharedRequestCreator::new(FnRequestCreator(f))
}
