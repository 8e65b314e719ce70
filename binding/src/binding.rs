//! The binding controller.

use crate::config::{BindingConfig, View};
use crate::error::BindingError;
use crate::render::{RenderOutcome, contain};
use std::sync::Arc;
use waiters_core::{Edges, TransitionDetector, WaiterRecord};
use waiters_runtime::{EffectHandle, WaiterStore};

/// What one protocol step did
#[derive(Debug, Default)]
pub struct Reaction {
    /// Edges whose callbacks ran, in firing order
    pub edges: Edges,
    /// Handle for the operation issued by this step, if any
    pub issued: Option<EffectHandle>,
}

impl Reaction {
    /// Wait for the issued operation, if any, to settle
    pub async fn settle(&mut self) {
        if let Some(handle) = self.issued.as_mut() {
            handle.wait().await;
        }
    }
}

struct Mounted<I> {
    inputs: I,
    name: String,
    /// Record as of the last edge evaluation
    seen: WaiterRecord,
}

/// Binds an observer with inputs `I` to a named waiter
///
/// The binding only submits actions to the store; it never touches a record
/// directly. Edge callbacks fire once per rising flag, measured against the
/// record seen at the previous evaluation.
///
/// # Example
///
/// ```ignore
/// let config = BindingConfig::named("profile")
///     .request_creator(load_profile)
///     .request_on_mount(true)
///     .on_resolve(|record, _| tracing::info!(?record.response, "loaded"));
///
/// let mut binding = WaiterBinding::new(store.clone(), config, |props, record| {
///     Ok(format!("{props:?}: {:?}", record.response))
/// });
///
/// binding.mount(props).await?.settle().await;
/// binding.observe().await?; // fires on_resolve
/// ```
pub struct WaiterBinding<I, O> {
    store: WaiterStore,
    config: BindingConfig<I, O>,
    view: View<I, O>,
    mounted: Option<Mounted<I>>,
}

impl<I, O> WaiterBinding<I, O> {
    /// Create an unmounted binding
    pub fn new<F>(store: WaiterStore, config: BindingConfig<I, O>, view: F) -> Self
    where
        F: Fn(&I, &WaiterRecord) -> anyhow::Result<O> + Send + Sync + 'static,
    {
        Self {
            store,
            config,
            view: Arc::new(view),
            mounted: None,
        }
    }

    /// The binding's configuration
    pub const fn config(&self) -> &BindingConfig<I, O> {
        &self.config
    }

    /// Whether the binding is mounted
    pub const fn is_mounted(&self) -> bool {
        self.mounted.is_some()
    }

    /// Waiter name for the current inputs
    pub fn name(&self) -> Option<&str> {
        self.mounted.as_ref().map(|mounted| mounted.name.as_str())
    }

    /// Current inputs
    pub fn inputs(&self) -> Option<&I> {
        self.mounted.as_ref().map(|mounted| &mounted.inputs)
    }

    /// Activate with `inputs`
    ///
    /// Runs `on_mount`, clears if configured, issues the operation if
    /// configured, then evaluates edges from the idle default to the record
    /// read afterwards, so a record already settled by an earlier mount
    /// fires its edges again.
    ///
    /// # Errors
    ///
    /// - [`BindingError::AlreadyMounted`] if the binding is mounted
    /// - [`BindingError::Store`] if the store is shutting down
    #[tracing::instrument(skip_all, name = "binding_mount")]
    pub async fn mount(&mut self, inputs: I) -> Result<Reaction, BindingError> {
        if self.mounted.is_some() {
            return Err(BindingError::AlreadyMounted);
        }

        let name = self.config.name.resolve(&inputs);
        tracing::debug!(waiter = %name, "Mounting binding");

        if let Some(on_mount) = &self.config.on_mount {
            on_mount(&self.store.waiter(&name).await, &inputs);
        }

        if self.config.clear_on_mount {
            self.store.clear(name.clone()).await?;
        }

        let issued = if self.config.requests_on_mount() {
            Some(self.issue_for(&name, &inputs).await?)
        } else {
            None
        };

        let mounted = self.mounted.insert(Mounted {
            inputs,
            name,
            seen: WaiterRecord::idle(),
        });
        let edges = Self::evaluate(&self.store, &self.config, mounted).await;

        Ok(Reaction { edges, issued })
    }

    /// Evaluate edges against the current record without new inputs
    ///
    /// Call this when the store reports a change, such as a completion.
    ///
    /// # Errors
    ///
    /// Returns [`BindingError::NotMounted`] before [`mount`](Self::mount).
    pub async fn observe(&mut self) -> Result<Edges, BindingError> {
        let mounted = self.mounted.as_mut().ok_or(BindingError::NotMounted)?;
        Ok(Self::evaluate(&self.store, &self.config, mounted).await)
    }

    /// Replace the inputs
    ///
    /// Re-resolves the name, evaluates edges from the previously seen record
    /// to the current one, then re-issues the operation if
    /// `request_on_props_change(new, old)` holds.
    ///
    /// # Errors
    ///
    /// - [`BindingError::NotMounted`] before [`mount`](Self::mount)
    /// - [`BindingError::Store`] if the store is shutting down
    #[tracing::instrument(skip_all, name = "binding_update")]
    pub async fn update(&mut self, inputs: I) -> Result<Reaction, BindingError> {
        let mounted = self.mounted.as_mut().ok_or(BindingError::NotMounted)?;

        let previous = std::mem::replace(&mut mounted.inputs, inputs);
        mounted.name = self.config.name.resolve(&mounted.inputs);
        let edges = Self::evaluate(&self.store, &self.config, mounted).await;

        let changed = self
            .config
            .request_on_props_change
            .as_ref()
            .is_some_and(|changed| changed(&mounted.inputs, &previous));

        let issued = if changed {
            tracing::debug!(waiter = %mounted.name, "Inputs changed, re-issuing");
            Some(self.issue().await?)
        } else {
            None
        };

        Ok(Reaction { edges, issued })
    }

    /// Deactivate
    ///
    /// Runs `on_unmount`, then clears if configured.
    ///
    /// # Errors
    ///
    /// - [`BindingError::NotMounted`] before [`mount`](Self::mount)
    /// - [`BindingError::Store`] if the store is shutting down
    #[tracing::instrument(skip_all, name = "binding_unmount")]
    pub async fn unmount(&mut self) -> Result<I, BindingError> {
        let Mounted { inputs, name, .. } = self.mounted.take().ok_or(BindingError::NotMounted)?;
        tracing::debug!(waiter = %name, "Unmounting binding");

        if let Some(on_unmount) = &self.config.on_unmount {
            on_unmount(&self.store.waiter(&name).await, &inputs);
        }

        if self.config.clear_on_unmount {
            self.store.clear(name).await?;
        }

        Ok(inputs)
    }

    /// Issue the operation for the current inputs
    ///
    /// Params come from `request_on_mount_params` when configured. The
    /// configured request creator is passed along; without one the record's
    /// carried creator is used.
    ///
    /// # Errors
    ///
    /// - [`BindingError::NotMounted`] before [`mount`](Self::mount)
    /// - [`BindingError::Store`] if the store is shutting down
    pub async fn issue(&self) -> Result<EffectHandle, BindingError> {
        let mounted = self.mounted.as_ref().ok_or(BindingError::NotMounted)?;
        self.issue_for(&mounted.name, &mounted.inputs).await
    }

    async fn issue_for(&self, name: &str, inputs: &I) -> Result<EffectHandle, BindingError> {
        let params = self.config.params_for(inputs);
        let handle = self
            .store
            .call(name, self.config.request_creator.clone(), params)
            .await?;
        Ok(handle)
    }

    /// Render the view selected by `record`
    ///
    /// Failures are contained and returned as [`RenderOutcome::Defect`].
    /// Defects are logged under the mounted waiter name, falling back to the
    /// record's own name.
    pub fn present(&self, inputs: &I, record: &WaiterRecord) -> RenderOutcome<O> {
        let name = self
            .name()
            .or(record.name.as_deref())
            .unwrap_or_default();
        let kind = self.config.select_view(record);
        let view = self.config.view(kind, &self.view);
        contain(name, kind, view, inputs, record)
    }

    /// Render the current record with the current inputs
    ///
    /// # Errors
    ///
    /// Returns [`BindingError::NotMounted`] before [`mount`](Self::mount).
    pub async fn render(&self) -> Result<RenderOutcome<O>, BindingError> {
        let mounted = self.mounted.as_ref().ok_or(BindingError::NotMounted)?;
        let record = self.store.waiter(&mounted.name).await;
        Ok(self.present(&mounted.inputs, &record))
    }

    /// Fire callbacks for edges from the seen record to the current one
    async fn evaluate(
        store: &WaiterStore,
        config: &BindingConfig<I, O>,
        mounted: &mut Mounted<I>,
    ) -> Edges {
        let current = store.waiter(&mounted.name).await;
        let edges = TransitionDetector::edges(&mounted.seen, &current);

        for edge in &edges {
            tracing::trace!(waiter = %mounted.name, ?edge, "Edge fired");
            if let Some(callback) = config.edge_callback(*edge) {
                callback(&current, &mounted.inputs);
            }
        }

        mounted.seen = current;
        edges
    }
}

impl<I, O> std::fmt::Debug for WaiterBinding<I, O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WaiterBinding")
            .field("config", &self.config)
            .field("name", &self.name())
            .finish_non_exhaustive()
    }
}
