use auxswitch_binder::{BinderError, ParcelError};
use auxswitch_host::{ConnectError, HostError, InvokeError};
use tracing::debug;

/// Failures an aux-in operation can report.
///
/// A failed support probe never becomes one of these; it only means the
/// backend is not applicable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuxError {
    /// No backend applies, or the backend lacks the requested operation.
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// The vendor service did not connect in time.
    #[error("connect timed out: {0}")]
    ConnectTimeout(String),

    /// The vendor service refused the connection or returned no handle.
    #[error("connect failed: {0}")]
    ConnectFailed(String),

    /// The remote side raised an exception.
    #[error("remote fault: {0}")]
    RemoteFault(String),

    /// A reply was missing, null, or shaped differently than expected.
    #[error("unexpected reply: {0}")]
    UnexpectedReply(String),

    /// The remote side answered with a failure status.
    #[error("command rejected: {command} (rc={rc})")]
    CommandRejected { command: String, rc: i64 },
}

impl AuxError {
    /// Stable machine-readable name of the error class.
    pub fn kind(&self) -> &'static str {
        match self {
            AuxError::Unsupported(_) => "unsupported",
            AuxError::ConnectTimeout(_) => "connect_timeout",
            AuxError::ConnectFailed(_) => "connect_failed",
            AuxError::RemoteFault(_) => "remote_fault",
            AuxError::UnexpectedReply(_) => "unexpected_reply",
            AuxError::CommandRejected { .. } => "command_rejected",
        }
    }

    /// How much an error tells about the device. Errors raised after the
    /// vendor answered rank above errors about reaching it at all.
    pub fn informativeness(&self) -> u8 {
        match self {
            AuxError::Unsupported(_) => 0,
            AuxError::ConnectTimeout(_) => 1,
            AuxError::ConnectFailed(_) => 2,
            AuxError::UnexpectedReply(_) => 3,
            AuxError::RemoteFault(_) => 4,
            AuxError::CommandRejected { .. } => 5,
        }
    }

    /// Keep the more informative of a primary and a fallback failure.
    ///
    /// Ties go to the fallback, the most recent attempt. The discarded
    /// error is only logged.
    pub fn most_informative(primary: AuxError, fallback: AuxError) -> AuxError {
        let (kept, discarded) = if primary.informativeness() > fallback.informativeness() {
            (primary, fallback)
        } else {
            (fallback, primary)
        };
        debug!(error = %discarded, "discarded less informative error");
        kept
    }
}

impl From<ConnectError> for AuxError {
    fn from(err: ConnectError) -> Self {
        match err {
            ConnectError::Timeout { .. } => AuxError::ConnectTimeout(err.to_string()),
            other => AuxError::ConnectFailed(other.to_string()),
        }
    }
}

impl From<BinderError> for AuxError {
    fn from(err: BinderError) -> Self {
        match err {
            BinderError::Parcel(inner) => inner.into(),
            BinderError::NoReply(_) => AuxError::UnexpectedReply(err.to_string()),
            other => AuxError::RemoteFault(other.to_string()),
        }
    }
}

impl From<ParcelError> for AuxError {
    fn from(err: ParcelError) -> Self {
        AuxError::UnexpectedReply(err.to_string())
    }
}

impl From<InvokeError> for AuxError {
    fn from(err: InvokeError) -> Self {
        match err {
            InvokeError::NoSuchMethod { .. } => AuxError::Unsupported(err.to_string()),
            other => AuxError::RemoteFault(other.cause()),
        }
    }
}

impl From<HostError> for AuxError {
    fn from(err: HostError) -> Self {
        match err {
            HostError::NotFound(_) => AuxError::Unsupported(err.to_string()),
            other => AuxError::ConnectFailed(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, AuxError>;

/// Errors loading a [`ManagerConfig`](crate::ManagerConfig).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    /// The file is not valid configuration JSON.
    #[error("invalid config: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn connect_timeout_maps_to_timeout_class() {
        let err: AuxError = ConnectError::Timeout {
            target: "svc".into(),
            timeout: Duration::from_millis(10),
        }
        .into();
        assert_eq!(err.kind(), "connect_timeout");

        let err: AuxError = ConnectError::NullBinder("svc".into()).into();
        assert_eq!(err.kind(), "connect_failed");
    }

    #[test]
    fn binder_errors_split_between_fault_and_reply() {
        let fault: AuxError = BinderError::RemoteException {
            code: -3,
            message: "bad".into(),
        }
        .into();
        assert!(matches!(fault, AuxError::RemoteFault(ref m) if m.contains("bad")));

        let reply: AuxError = BinderError::Parcel(ParcelError::InvalidString).into();
        assert_eq!(reply.kind(), "unexpected_reply");

        let reply: AuxError = BinderError::NoReply(2).into();
        assert_eq!(reply.kind(), "unexpected_reply");
    }

    #[test]
    fn invoke_target_is_unwrapped() {
        let err: AuxError = InvokeError::target("mcu write failed").into();
        assert_eq!(err, AuxError::RemoteFault("mcu write failed".into()));
    }

    #[test]
    fn most_informative_prefers_rejection_over_connect() {
        let primary = AuxError::ConnectTimeout("toolkit".into());
        let fallback = AuxError::CommandRejected {
            command: "open".into(),
            rc: -1,
        };
        let kept = AuxError::most_informative(primary.clone(), fallback.clone());
        assert_eq!(kept, fallback);

        let kept = AuxError::most_informative(fallback.clone(), primary);
        assert_eq!(kept, fallback);
    }

    #[test]
    fn ties_keep_fallback() {
        let primary = AuxError::ConnectFailed("component".into());
        let fallback = AuxError::ConnectFailed("action".into());
        assert_eq!(
            AuxError::most_informative(primary, fallback.clone()),
            fallback
        );
    }
}
