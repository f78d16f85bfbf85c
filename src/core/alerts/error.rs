use std::any::Any;

use thiserror::Error;

/// Errors surfaced by the alert subsystem.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AlertError {
    /// The service was configured without a render collaborator.
    #[error("alert service requires a renderer")]
    MissingRenderer,
    /// `spawn` was called outside a tokio runtime.
    #[error("alert service must be spawned inside a tokio runtime")]
    NoRuntime,
    /// No alert service is bound to the global facade.
    #[error("no alert service is running")]
    NotMounted,
    /// The service task has stopped and no longer accepts commands.
    #[error("alert service has stopped")]
    ServiceStopped,
    /// A caller-supplied callback panicked. Controller cleanup still ran.
    #[error("{callback} callback panicked: {message}")]
    CallbackPanicked {
        callback: &'static str,
        message: String,
    },
    #[error("alert has no button at index {0}")]
    NoSuchButton(usize),
}

impl AlertError {
    pub(crate) fn from_panic(callback: &'static str, payload: &(dyn Any + Send)) -> Self {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_string());
        Self::CallbackPanicked { callback, message }
    }
}
