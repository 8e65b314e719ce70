//! # Waiters Binding
//!
//! Connects an observer (anything with inputs that renders output) to one
//! named waiter in a [`WaiterStore`](waiters_runtime::WaiterStore).
//!
//! The binding follows a mount / update / unmount protocol:
//!
//! - **mount**: `on_mount`, optional CLEAR, optional request, edge evaluation
//! - **update**: edge evaluation, then a refresh if the inputs changed enough
//! - **unmount**: `on_unmount`, optional CLEAR
//!
//! Edge callbacks (`on_pending`, `on_resolve`, ...) fire only when their
//! flag rises, never again while it stays up. Rendering picks the pending or
//! rejected view when configured and contains view failures so they are never
//! mistaken for a failed request.

/// Binding configuration builder
pub mod config;

/// Presentation selection and failure containment
pub mod render;

mod binding;

pub use binding::{Reaction, WaiterBinding};
pub use config::{BindingConfig, Callback, View, WaiterName};
pub use error::BindingError;
pub use render::{RenderDefect, RenderOutcome, ViewKind};

/// Error types for the binding controller
pub mod error {
    use thiserror::Error;
    use waiters_runtime::StoreError;

    /// Errors from driving a binding
    #[derive(Error, Debug)]
    pub enum BindingError {
        /// The binding has not been mounted
        #[error("Binding is not mounted")]
        NotMounted,

        /// The binding is already mounted
        #[error("Binding is already mounted")]
        AlreadyMounted,

        /// The store rejected an action
        #[error(transparent)]
        Store(#[from] StoreError),
    }
}
