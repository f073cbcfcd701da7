use std::time::Duration;

use crate::object::ValueKind;

/// Errors reported by the platform itself.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HostError {
    /// The named package, component, class or service does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The platform refused the request (permissions, export flags, ...).
    #[error("permission denied: {0}")]
    Denied(String),

    /// The platform declined to start a binding for the intent.
    #[error("bind rejected for {0}")]
    BindRejected(String),

    /// Any other platform failure.
    #[error("{0}")]
    Other(String),
}

/// Errors from establishing a transient service connection.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConnectError {
    /// The platform declined the bind request.
    #[error("bind rejected for {target}: {source}")]
    Rejected { target: String, source: HostError },

    /// No connection event arrived before the deadline.
    #[error("bind timed out for {target} after {timeout:?}")]
    Timeout { target: String, timeout: Duration },

    /// The service connected but handed back no binder.
    #[error("binder was null after service connection for {0}")]
    NullBinder(String),

    /// The service explicitly returned a null binding.
    #[error("null binding for {0}")]
    NullBinding(String),

    /// The platform dropped the connection sink without an event.
    #[error("connection channel closed for {0}")]
    Closed(String),
}

/// Errors from invoking a method on a [`ControlObject`](crate::ControlObject).
#[derive(Debug, thiserror::Error)]
pub enum InvokeError {
    /// No method with this exact name and parameter list exists.
    #[error("no such method {name}({params:?})")]
    NoSuchMethod { name: String, params: Vec<ValueKind> },

    /// Arguments did not satisfy the method.
    #[error("illegal argument: {0}")]
    IllegalArgument(String),

    /// The method itself failed; `source` is the underlying cause.
    #[error("invocation target failed: {source}")]
    Target {
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl InvokeError {
    /// Wrap an underlying failure raised by the invoked method.
    pub fn target(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Target {
            source: source.into(),
        }
    }

    /// The underlying cause, with the invocation wrapper removed.
    pub fn cause(&self) -> String {
        match self {
            InvokeError::Target { source } => source.to_string(),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, HostError>;
