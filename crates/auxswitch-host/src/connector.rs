use std::fmt;
use std::sync::mpsc::RecvTimeoutError;
use std::time::Duration;

use auxswitch_binder::BinderRef;
use tracing::debug;

use crate::error::ConnectError;
use crate::host::{BindToken, ConnectionEvent, ConnectionSink, Host};
use crate::intent::Intent;

/// Shortest wait ever used for a connection, however small the caller's budget.
pub const CONNECT_FLOOR: Duration = Duration::from_millis(50);

/// A live service binding plus the binder it produced.
///
/// The binding is released exactly once when this value is dropped, on
/// every path out of the operation that created it. The binder can only be
/// reached through `&self`, so it is never used after release.
pub struct BoundService<'h> {
    binder: BinderRef,
    _binding: Binding<'h>,
}

impl BoundService<'_> {
    pub fn binder(&self) -> &BinderRef {
        &self.binder
    }
}

impl fmt::Debug for BoundService<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundService")
            .field("target", &self._binding.target)
            .field("token", &self._binding.token)
            .finish()
    }
}

struct Binding<'h> {
    host: &'h dyn Host,
    token: BindToken,
    target: String,
}

impl Drop for Binding<'_> {
    fn drop(&mut self) {
        debug!(target = %self.target, token = self.token.id(), "unbinding service");
        self.host.unbind_service(self.token);
    }
}

/// Bind `intent` and wait for the connection, at most `timeout`.
///
/// The wait is a bounded receive on a single-slot channel. The binding is
/// released before returning on every error path.
pub fn connect<'h>(
    host: &'h dyn Host,
    intent: &Intent,
    timeout: Duration,
) -> Result<BoundService<'h>, ConnectError> {
    let target = intent.to_string();
    let wait = timeout.max(CONNECT_FLOOR);
    let (sink, events) = ConnectionSink::channel();

    let token = host
        .bind_service(intent, sink)
        .map_err(|source| ConnectError::Rejected {
            target: target.clone(),
            source,
        })?;
    debug!(%target, token = token.id(), ?wait, "bind requested");

    let binding = Binding {
        host,
        token,
        target: target.clone(),
    };

    match events.recv_timeout(wait) {
        Ok(ConnectionEvent::Connected(Some(binder))) => {
            debug!(%target, "service connected");
            Ok(BoundService {
                binder,
                _binding: binding,
            })
        }
        Ok(ConnectionEvent::Connected(None)) => Err(ConnectError::NullBinder(target)),
        Ok(ConnectionEvent::NullBinding) => Err(ConnectError::NullBinding(target)),
        Err(RecvTimeoutError::Timeout) => Err(ConnectError::Timeout {
            target,
            timeout: wait,
        }),
        Err(RecvTimeoutError::Disconnected) => Err(ConnectError::Closed(target)),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Instant;

    use auxswitch_binder::{Binder, Parcel};

    use super::*;
    use crate::sim::{BindBehavior, SimHost};

    struct Nop;

    impl Binder for Nop {
        fn transact(
            &self,
            _code: u32,
            _data: &Parcel,
            _flags: u32,
        ) -> auxswitch_binder::Result<Option<Parcel>> {
            Ok(None)
        }
    }

    fn intent() -> Intent {
        Intent::action("vendor.action").with_package("vendor.pkg")
    }

    #[test]
    fn connects_and_releases_on_drop() {
        let host = SimHost::new("test.app");
        host.on_bind_action("vendor.action", "vendor.pkg", BindBehavior::Connect(Arc::new(Nop)));

        {
            let bound = connect(&host, &intent(), Duration::from_millis(100)).unwrap();
            let _ = bound.binder();
            assert_eq!(host.live_bindings(), 1);
        }

        assert_eq!(host.bind_count(), 1);
        assert_eq!(host.unbind_count(), 1);
        assert_eq!(host.live_bindings(), 0);
    }

    #[test]
    fn null_binder_is_connect_failure_and_still_released() {
        let host = SimHost::new("test.app");
        host.on_bind_action("vendor.action", "vendor.pkg", BindBehavior::ConnectNull);

        let err = connect(&host, &intent(), Duration::from_millis(100)).unwrap_err();
        assert!(matches!(err, ConnectError::NullBinder(_)));
        assert_eq!(host.bind_count(), 1);
        assert_eq!(host.unbind_count(), 1);
    }

    #[test]
    fn null_binding_reported() {
        let host = SimHost::new("test.app");
        host.on_bind_action("vendor.action", "vendor.pkg", BindBehavior::NullBinding);

        let err = connect(&host, &intent(), Duration::from_millis(100)).unwrap_err();
        assert!(matches!(err, ConnectError::NullBinding(_)));
        assert_eq!(host.unbind_count(), 1);
    }

    #[test]
    fn silent_service_times_out_within_budget() {
        let host = SimHost::new("test.app");
        host.on_bind_action("vendor.action", "vendor.pkg", BindBehavior::Never);

        let start = Instant::now();
        let err = connect(&host, &intent(), Duration::from_millis(80)).unwrap_err();
        assert!(matches!(err, ConnectError::Timeout { .. }));
        assert!(start.elapsed() < Duration::from_millis(500));
        assert_eq!(host.unbind_count(), 1);
    }

    #[test]
    fn zero_timeout_still_waits_for_floor() {
        let host = SimHost::new("test.app");
        host.on_bind_action(
            "vendor.action",
            "vendor.pkg",
            BindBehavior::Delayed(Duration::from_millis(5), Arc::new(Nop)),
        );

        let bound = connect(&host, &intent(), Duration::ZERO);
        assert!(bound.is_ok());
    }

    #[test]
    fn rejected_bind_acquires_nothing() {
        let host = SimHost::new("test.app");

        let err = connect(&host, &intent(), Duration::from_millis(50)).unwrap_err();
        assert!(matches!(err, ConnectError::Rejected { .. }));
        assert_eq!(host.bind_count(), 0);
        assert_eq!(host.unbind_count(), 0);
    }
}
