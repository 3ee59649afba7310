//! Server run-state machine and in-flight request bookkeeping.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use qml_protocol::{INVALID_REQUEST, SERVER_NOT_INITIALIZED};
use rustc_hash::FxHashMap;

/// Opaque request identifier. The JSON-RPC dispatcher (external
/// collaborator) is responsible for canonicalizing numeric and string
/// request ids to this form before calling into the coordinator.
pub type RequestId = String;

/// The monotonic lifecycle states of the server process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RunState {
    /// Process started; no handlers registered yet.
    NotSetup,
    /// Handler registration in progress.
    SettingUp,
    /// Handlers registered; waiting for `initialize`.
    DidSetup,
    /// `initialize` received; building capabilities.
    Initializing,
    /// Capabilities sent; server fully operational.
    DidInitialize,
    /// `shutdown` received with requests still in flight.
    WaitPending,
    /// Ready to answer `shutdown` (no requests remain in flight).
    Stopping,
    /// `exit` received; the process should terminate.
    Stopped,
}

/// Bookkeeping for a request that has been received but not yet responded
/// to.
#[derive(Debug, Clone)]
struct RequestInProgress {
    canceled: bool,
}

/// A lifecycle transition was attempted against the monotonic ordering of
/// [`RunState`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot transition run-state from {from:?} back to {to:?}")]
pub struct LifecycleError {
    /// State the server was in.
    pub from: RunState,
    /// State the caller asked to move to.
    pub to: RunState,
}

/// How an incoming message should be handled given the current run-state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageGate {
    /// Dispatch the message normally.
    Pass,
    /// Respond with `ServerNotInitialized` (requests only).
    ServerNotInitialized,
    /// Respond with `InvalidRequest` (requests only).
    InvalidRequest,
    /// Silently discard (notifications, or requests with no id in a
    /// dropping state).
    Drop,
}

impl MessageGate {
    /// The JSON-RPC error code implied by this gate, if any.
    pub fn error_code(&self) -> Option<i32> {
        match self {
            MessageGate::ServerNotInitialized => Some(SERVER_NOT_INITIALIZED),
            MessageGate::InvalidRequest => Some(INVALID_REQUEST),
            MessageGate::Pass | MessageGate::Drop => None,
        }
    }
}

struct Inner {
    state: RwLock<RunState>,
    in_flight: Mutex<FxHashMap<RequestId, RequestInProgress>>,
    deferred_shutdown: Mutex<Option<RequestId>>,
}

/// The server's run-state machine, shared across the transport loop and
/// every analysis module.
#[derive(Clone)]
pub struct ServerLifecycle {
    inner: Arc<Inner>,
}

impl Default for ServerLifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerLifecycle {
    /// A freshly constructed server, in `NotSetup`.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                state: RwLock::new(RunState::NotSetup),
                in_flight: Mutex::new(FxHashMap::default()),
                deferred_shutdown: Mutex::new(None),
            }),
        }
    }

    /// Current run-state.
    pub fn state(&self) -> RunState {
        *self.inner.state.read()
    }

    fn transition(&self, to: RunState) -> Result<(), LifecycleError> {
        let mut state = self.inner.state.write();
        if to < *state {
            let err = LifecycleError { from: *state, to };
            tracing::error!(?err, "rejected backward run-state transition");
            return Err(err);
        }
        *state = to;
        Ok(())
    }

    /// `finishSetup` — `NotSetup` → `SettingUp`.
    pub fn finish_setup(&self) -> Result<(), LifecycleError> {
        self.transition(RunState::SettingUp)
    }

    /// Handlers are registered — `SettingUp` → `DidSetup`.
    pub fn complete_setup(&self) -> Result<(), LifecycleError> {
        self.transition(RunState::DidSetup)
    }

    /// `initialize` request received — `DidSetup` → `Initializing`.
    pub fn begin_initialize(&self) -> Result<(), LifecycleError> {
        self.transition(RunState::Initializing)
    }

    /// Capabilities built and the `initialize` response sent —
    /// `Initializing` → `DidInitialize`.
    pub fn complete_initialize(&self) -> Result<(), LifecycleError> {
        self.transition(RunState::DidInitialize)
    }

    /// Decide how to handle an incoming message.
    pub fn gate(&self, method: &str, has_id: bool) -> MessageGate {
        use qml_protocol::methods::{EXIT, INITIALIZE};

        if method == EXIT {
            return MessageGate::Pass;
        }

        match self.state() {
            RunState::DidSetup => {
                if method == INITIALIZE {
                    MessageGate::Pass
                } else if has_id {
                    MessageGate::ServerNotInitialized
                } else {
                    MessageGate::Drop
                }
            }
            RunState::WaitPending | RunState::Stopping | RunState::Stopped => {
                if has_id {
                    MessageGate::InvalidRequest
                } else {
                    MessageGate::Drop
                }
            }
            RunState::DidInitialize => MessageGate::Pass,
            RunState::NotSetup | RunState::SettingUp | RunState::Initializing => {
                if has_id {
                    MessageGate::ServerNotInitialized
                } else {
                    MessageGate::Drop
                }
            }
        }
    }

    /// Register a request with an id as in-flight.
    pub fn register_request(&self, id: RequestId) {
        self.inner.in_flight.lock().insert(id, RequestInProgress { canceled: false });
    }

    /// Mark an in-flight request canceled (`$/cancelRequest`).
    pub fn cancel(&self, id: &RequestId) {
        if let Some(req) = self.inner.in_flight.lock().get_mut(id) {
            req.canceled = true;
        }
    }

    /// Whether a registered request has been canceled.
    pub fn is_canceled(&self, id: &RequestId) -> bool {
        self.inner.in_flight.lock().get(id).is_some_and(|r| r.canceled)
    }

    /// Number of requests currently in flight.
    pub fn in_flight_count(&self) -> usize {
        self.inner.in_flight.lock().len()
    }

    /// Remove `id` from the in-flight set on response dispatch. If the
    /// server is `WaitPending` and this was the last in-flight request,
    /// transitions to `Stopping` and returns the id of the deferred
    /// `shutdown` request so the caller can send its response.
    pub fn complete_request(&self, id: &RequestId) -> Option<RequestId> {
        self.inner.in_flight.lock().remove(id);
        if self.state() == RunState::WaitPending && self.inner.in_flight.lock().is_empty() {
            let _ = self.transition(RunState::Stopping);
            return self.inner.deferred_shutdown.lock().take();
        }
        None
    }

    /// Handle a `shutdown` request with id `id`. Returns `true` if the
    /// caller should answer immediately (no requests were in flight);
    /// `false` if the response must wait for [`Self::complete_request`] to
    /// drain the last in-flight request.
    pub fn shutdown(&self, id: RequestId) -> bool {
        if self.inner.in_flight.lock().is_empty() {
            let _ = self.transition(RunState::Stopping);
            true
        } else {
            *self.inner.deferred_shutdown.lock() = Some(id);
            let _ = self.transition(RunState::WaitPending);
            false
        }
    }

    /// `executeShutdown` — `Stopping` → `Stopped`, invoked once the
    /// `shutdown` response itself has been sent.
    pub fn execute_shutdown(&self) -> Result<(), LifecycleError> {
        self.transition(RunState::Stopped)
    }

    /// `exit` notification — always finalizes to `Stopped`, regardless of
    /// the state it arrives in (an editor may send `exit` without a prior
    /// `shutdown`).
    pub fn exit(&self) {
        *self.inner.state.write() = RunState::Stopped;
    }

    /// Exit code for the process: `0` if `exit` followed a clean
    /// `shutdown`, `1` otherwise (EOF or lifecycle error before `exit`).
    pub fn exit_code(&self) -> i32 {
        if self.state() == RunState::Stopped { 0 } else { 1 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boot(lc: &ServerLifecycle) {
        lc.finish_setup().expect("finish_setup");
        lc.complete_setup().expect("complete_setup");
        lc.begin_initialize().expect("begin_initialize");
        lc.complete_initialize().expect("complete_initialize");
    }

    #[test]
    fn pre_initialize_requests_get_server_not_initialized() {
        let lc = ServerLifecycle::new();
        lc.finish_setup().expect("finish_setup");
        lc.complete_setup().expect("complete_setup");
        assert_eq!(lc.gate("textDocument/completion", true), MessageGate::ServerNotInitialized);
        assert_eq!(lc.gate("initialize", true), MessageGate::Pass);
    }

    #[test]
    fn exit_always_passes_and_finalizes() {
        let lc = ServerLifecycle::new();
        assert_eq!(lc.gate("exit", false), MessageGate::Pass);
        lc.exit();
        assert_eq!(lc.state(), RunState::Stopped);
        assert_eq!(lc.exit_code(), 0);
    }

    #[test]
    fn shutdown_with_pending_request_defers_until_drained() {
        let lc = ServerLifecycle::new();
        boot(&lc);
        lc.register_request("req-1".to_string());
        assert!(!lc.shutdown("shutdown-1".to_string()));
        assert_eq!(lc.state(), RunState::WaitPending);

        let deferred = lc.complete_request(&"req-1".to_string());
        assert_eq!(deferred.as_deref(), Some("shutdown-1"));
        assert_eq!(lc.state(), RunState::Stopping);
    }

    #[test]
    fn shutdown_with_no_pending_requests_completes_immediately() {
        let lc = ServerLifecycle::new();
        boot(&lc);
        assert!(lc.shutdown("shutdown-1".to_string()));
        assert_eq!(lc.state(), RunState::Stopping);
    }

    #[test]
    fn backward_transition_is_rejected_not_fatal() {
        let lc = ServerLifecycle::new();
        boot(&lc);
        assert!(lc.finish_setup().is_err());
        assert_eq!(lc.state(), RunState::DidInitialize);
    }
}
