//! Binding configuration.
//!
//! Every option is optional except the name source. An unset option
//! disables its behavior.

use serde_json::Value;
use std::sync::Arc;
use waiters_core::{Edge, SharedRequestCreator, WaiterRecord};

/// Called with the current record and the binding's inputs
pub type Callback<I> = Arc<dyn Fn(&WaiterRecord, &I) + Send + Sync>;

/// Presentational unit: inputs and current record to output
pub type View<I, O> = Arc<dyn Fn(&I, &WaiterRecord) -> anyhow::Result<O> + Send + Sync>;

type ParamsFn<I> = Arc<dyn Fn(&I) -> Value + Send + Sync>;
type ChangeFn<I> = Arc<dyn Fn(&I, &I) -> bool + Send + Sync>;
type NameFn<I> = Arc<dyn Fn(&I) -> String + Send + Sync>;

/// Where a binding's waiter name comes from
pub enum WaiterName<I> {
    /// One name for every instance
    Static(String),
    /// Derived from the inputs, for per-instance waiters
    Dynamic(NameFn<I>),
}

impl<I> WaiterName<I> {
    /// Name for the given inputs
    pub fn resolve(&self, inputs: &I) -> String {
        match self {
            Self::Static(name) => name.clone(),
            Self::Dynamic(name) => name(inputs),
        }
    }
}

impl<I> std::fmt::Debug for WaiterName<I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Static(name) => f.debug_tuple("Static").field(name).finish(),
            Self::Dynamic(_) => write!(f, "Dynamic(<fn>)"),
        }
    }
}

struct EdgeCallbacks<I> {
    pending: Option<Callback<I>>,
    resolve: Option<Callback<I>>,
    reject: Option<Callback<I>>,
    complete: Option<Callback<I>>,
    refresh: Option<Callback<I>>,
    retry: Option<Callback<I>>,
    cancel: Option<Callback<I>>,
}

/// Configuration for a [`WaiterBinding`](crate::WaiterBinding)
///
/// `I` is the binding's input type, `O` what its views produce.
///
/// # Example
///
/// ```
/// use waiters_binding::BindingConfig;
/// use serde_json::json;
///
/// #[derive(PartialEq)]
/// struct Props { user: u64 }
///
/// let config = BindingConfig::<Props, String>::named_by(|p| format!("user-{}", p.user))
///     .request_on_mount_params(|p| json!({ "user": p.user }))
///     .request_on_props_change(|new, old| new != old)
///     .clear_on_unmount(true)
///     .on_resolve(|record, _| println!("loaded {:?}", record.response))
///     .pending_view(|_, _| Ok("loading".to_string()));
///
/// assert!(config.requests_on_mount());
/// ```
pub struct BindingConfig<I, O> {
    pub(crate) name: WaiterName<I>,
    pub(crate) pending_view: Option<View<I, O>>,
    pub(crate) rejected_view: Option<View<I, O>>,
    pub(crate) request_on_mount: bool,
    pub(crate) request_on_mount_params: Option<ParamsFn<I>>,
    pub(crate) request_on_props_change: Option<ChangeFn<I>>,
    pub(crate) clear_on_mount: bool,
    pub(crate) clear_on_unmount: bool,
    pub(crate) on_mount: Option<Callback<I>>,
    pub(crate) on_unmount: Option<Callback<I>>,
    edges: EdgeCallbacks<I>,
    pub(crate) request_creator: Option<SharedRequestCreator>,
}

impl<I, O> BindingConfig<I, O> {
    /// Bind to a fixed waiter name
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self::with_name(WaiterName::Static(name.into()))
    }

    /// Bind to a name derived from the inputs
    #[must_use]
    pub fn named_by<F>(name: F) -> Self
    where
        F: Fn(&I) -> String + Send + Sync + 'static,
    {
        Self::with_name(WaiterName::Dynamic(Arc::new(name)))
    }

    fn with_name(name: WaiterName<I>) -> Self {
        Self {
            name,
            pending_view: None,
            rejected_view: None,
            request_on_mount: false,
            request_on_mount_params: None,
            request_on_props_change: None,
            clear_on_mount: false,
            clear_on_unmount: false,
            on_mount: None,
            on_unmount: None,
            edges: EdgeCallbacks {
                pending: None,
                resolve: None,
                reject: None,
                complete: None,
                refresh: None,
                retry: None,
                cancel: None,
            },
            request_creator: None,
        }
    }

    /// Shown instead of the wrapped view while the waiter is pending
    #[must_use]
    pub fn pending_view<F>(mut self, view: F) -> Self
    where
        F: Fn(&I, &WaiterRecord) -> anyhow::Result<O> + Send + Sync + 'static,
    {
        self.pending_view = Some(Arc::new(view));
        self
    }

    /// Shown instead of the wrapped view while the waiter is rejected
    #[must_use]
    pub fn rejected_view<F>(mut self, view: F) -> Self
    where
        F: Fn(&I, &WaiterRecord) -> anyhow::Result<O> + Send + Sync + 'static,
    {
        self.rejected_view = Some(Arc::new(view));
        self
    }

    /// Issue the operation on mount
    #[must_use]
    pub const fn request_on_mount(mut self, enabled: bool) -> Self {
        self.request_on_mount = enabled;
        self
    }

    /// Params for every issued operation; also enables request on mount
    #[must_use]
    pub fn request_on_mount_params<F>(mut self, params: F) -> Self
    where
        F: Fn(&I) -> Value + Send + Sync + 'static,
    {
        self.request_on_mount_params = Some(Arc::new(params));
        self
    }

    /// Re-issue the operation when this returns true for (new, old) inputs
    #[must_use]
    pub fn request_on_props_change<F>(mut self, changed: F) -> Self
    where
        F: Fn(&I, &I) -> bool + Send + Sync + 'static,
    {
        self.request_on_props_change = Some(Arc::new(changed));
        self
    }

    /// Dispatch CLEAR on mount
    #[must_use]
    pub const fn clear_on_mount(mut self, enabled: bool) -> Self {
        self.clear_on_mount = enabled;
        self
    }

    /// Dispatch CLEAR on unmount
    #[must_use]
    pub const fn clear_on_unmount(mut self, enabled: bool) -> Self {
        self.clear_on_unmount = enabled;
        self
    }

    /// Runs first on every mount
    #[must_use]
    pub fn on_mount<F>(mut self, callback: F) -> Self
    where
        F: Fn(&WaiterRecord, &I) + Send + Sync + 'static,
    {
        self.on_mount = Some(Arc::new(callback));
        self
    }

    /// Runs first on every unmount
    #[must_use]
    pub fn on_unmount<F>(mut self, callback: F) -> Self
    where
        F: Fn(&WaiterRecord, &I) + Send + Sync + 'static,
    {
        self.on_unmount = Some(Arc::new(callback));
        self
    }

    /// Runs when `edge` rises
    #[must_use]
    pub fn on_edge<F>(mut self, edge: Edge, callback: F) -> Self
    where
        F: Fn(&WaiterRecord, &I) + Send + Sync + 'static,
    {
        let callback: Callback<I> = Arc::new(callback);
        let slot = match edge {
            Edge::Pending => &mut self.edges.pending,
            Edge::Resolve => &mut self.edges.resolve,
            Edge::Reject => &mut self.edges.reject,
            Edge::Complete => &mut self.edges.complete,
            Edge::Refresh => &mut self.edges.refresh,
            Edge::Retry => &mut self.edges.retry,
            Edge::Cancel => &mut self.edges.cancel,
        };
        *slot = Some(callback);
        self
    }

    /// Runs when the waiter becomes pending
    #[must_use]
    pub fn on_pending<F>(self, callback: F) -> Self
    where
        F: Fn(&WaiterRecord, &I) + Send + Sync + 'static,
    {
        self.on_edge(Edge::Pending, callback)
    }

    /// Runs when the waiter resolves
    #[must_use]
    pub fn on_resolve<F>(self, callback: F) -> Self
    where
        F: Fn(&WaiterRecord, &I) + Send + Sync + 'static,
    {
        self.on_edge(Edge::Resolve, callback)
    }

    /// Runs when the waiter rejects
    #[must_use]
    pub fn on_reject<F>(self, callback: F) -> Self
    where
        F: Fn(&WaiterRecord, &I) + Send + Sync + 'static,
    {
        self.on_edge(Edge::Reject, callback)
    }

    /// Runs when the waiter resolves or rejects
    #[must_use]
    pub fn on_complete<F>(self, callback: F) -> Self
    where
        F: Fn(&WaiterRecord, &I) + Send + Sync + 'static,
    {
        self.on_edge(Edge::Complete, callback)
    }

    /// Runs when a request starts over a previous response
    #[must_use]
    pub fn on_refresh<F>(self, callback: F) -> Self
    where
        F: Fn(&WaiterRecord, &I) + Send + Sync + 'static,
    {
        self.on_edge(Edge::Refresh, callback)
    }

    /// Runs when the waiter starts retrying
    ///
    /// No lifecycle event raises `is_retrying` today.
    #[must_use]
    pub fn on_retry<F>(self, callback: F) -> Self
    where
        F: Fn(&WaiterRecord, &I) + Send + Sync + 'static,
    {
        self.on_edge(Edge::Retry, callback)
    }

    /// Runs when the waiter is canceled
    #[must_use]
    pub fn on_cancel<F>(self, callback: F) -> Self
    where
        F: Fn(&WaiterRecord, &I) + Send + Sync + 'static,
    {
        self.on_edge(Edge::Cancel, callback)
    }

    /// Operation factory carried into the record on first issue
    #[must_use]
    pub fn request_creator(mut self, creator: SharedRequestCreator) -> Self {
        self.request_creator = Some(creator);
        self
    }

    /// Whether mounting issues the operation
    #[must_use]
    pub const fn requests_on_mount(&self) -> bool {
        self.request_on_mount || self.request_on_mount_params.is_some()
    }

    /// Callback registered for `edge`
    #[must_use]
    pub const fn edge_callback(&self, edge: Edge) -> Option<&Callback<I>> {
        match edge {
            Edge::Pending => self.edges.pending.as_ref(),
            Edge::Resolve => self.edges.resolve.as_ref(),
            Edge::Reject => self.edges.reject.as_ref(),
            Edge::Complete => self.edges.complete.as_ref(),
            Edge::Refresh => self.edges.refresh.as_ref(),
            Edge::Retry => self.edges.retry.as_ref(),
            Edge::Cancel => self.edges.cancel.as_ref(),
        }
    }

    /// Params for an issued operation
    pub(crate) fn params_for(&self, inputs: &I) -> Option<Value> {
        self.request_on_mount_params
            .as_ref()
            .map(|params| params(inputs))
    }
}

impl<I, O> std::fmt::Debug for BindingConfig<I, O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let edges: Vec<Edge> = Edge::ALL
            .into_iter()
            .filter(|edge| self.edge_callback(*edge).is_some())
            .collect();

        f.debug_struct("BindingConfig")
            .field("name", &self.name)
            .field("pending_view", &self.pending_view.is_some())
            .field("rejected_view", &self.rejected_view.is_some())
            .field("request_on_mount", &self.requests_on_mount())
            .field("request_on_props_change", &self.request_on_props_change.is_some())
            .field("clear_on_mount", &self.clear_on_mount)
            .field("clear_on_unmount", &self.clear_on_unmount)
            .field("edge_callbacks", &edges)
            .field("request_creator", &self.request_creator.is_some())
            .finish_non_exhaustive()
    }
}
