//! Per-module, version-gated request queue.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use qml_protocol::LspError;
use qml_registry::DocumentRegistry;
use rustc_hash::FxHashMap;
use tokio::sync::oneshot;

use crate::lifecycle::RequestId;

/// Either a successful response value or an [`LspError`] — exactly one of
/// these reaches the caller for every request.
pub type RequestOutcome<Response> = Result<Response, LspError>;

/// Ensures exactly one of `send`/`send_error` fires for a request even if
/// the processor returns early or panics.
struct ResponseGuard<Response> {
    sender: Option<oneshot::Sender<RequestOutcome<Response>>>,
}

impl<Response> Drop for ResponseGuard<Response> {
    fn drop(&mut self) {
        if let Some(tx) = self.sender.take() {
            let _ = tx.send(Err(LspError::new(
                qml_protocol::INVALID_REQUEST,
                "handler exited without responding",
            )));
        }
    }
}

/// A single module-specific analysis request, captured at `receive` time
/// and replayed once its version precondition is satisfied.
pub struct PendingRequest<Params, Response> {
    /// Document the request concerns.
    pub url: String,
    /// The text-document version the request must be answered against or
    /// newer (captured at enqueue time).
    pub min_version: i32,
    /// Request id, for cancellation lookups.
    pub id: RequestId,
    /// Module-specific request parameters (e.g. a completion position).
    pub params: Params,
    canceled: Arc<AtomicBool>,
    responder: ResponseGuard<Response>,
}

impl<Params, Response> PendingRequest<Params, Response> {
    /// Whether `$/cancelRequest` has marked this request canceled.
    pub fn is_canceled(&self) -> bool {
        self.canceled.load(Ordering::SeqCst)
    }

    /// Send the successful response, consuming the guard.
    pub fn respond(mut self, value: Response) {
        if let Some(tx) = self.responder.sender.take() {
            let _ = tx.send(Ok(value));
        }
    }

    /// Send an error response, consuming the guard.
    pub fn respond_error(mut self, error: LspError) {
        if let Some(tx) = self.responder.sender.take() {
            let _ = tx.send(Err(error));
        }
    }
}

struct Inner<Params, Response> {
    registry: Arc<DocumentRegistry>,
    pending: Mutex<FxHashMap<String, Vec<PendingRequest<Params, Response>>>>,
    cancel_flags: Mutex<FxHashMap<RequestId, Arc<AtomicBool>>>,
    processor: Arc<dyn Fn(PendingRequest<Params, Response>) + Send + Sync>,
}

/// Queues requests for one analysis module (e.g. completion), releasing
/// them once a snapshot of sufficient version is published for their URL.
pub struct RequestCoordinator<Params, Response> {
    inner: Arc<Inner<Params, Response>>,
}

impl<Params, Response> Clone for RequestCoordinator<Params, Response> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<Params, Response> RequestCoordinator<Params, Response>
where
    Params: Send + 'static,
    Response: Send + 'static,
{
    /// Create a coordinator that hands ready requests to `processor`. The
    /// processor runs on a blocking worker thread and must call
    /// `req.respond(..)` / `req.respond_error(..)` exactly once.
    pub fn new(
        registry: Arc<DocumentRegistry>,
        processor: impl Fn(PendingRequest<Params, Response>) + Send + Sync + 'static,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                registry,
                pending: Mutex::new(FxHashMap::default()),
                cancel_flags: Mutex::new(FxHashMap::default()),
                processor: Arc::new(processor),
            }),
        }
    }

    /// Enqueue a request, capturing `min_version` as the document's current
    /// text-document version. If the current snapshot already satisfies
    /// `min_version`, dispatches immediately as a synthetic
    /// `snapshot_updated` event.
    pub fn receive(
        &self,
        url: String,
        id: RequestId,
        params: Params,
    ) -> oneshot::Receiver<RequestOutcome<Response>> {
        let (tx, rx) = oneshot::channel();
        let min_version = self
            .inner
            .registry
            .open_document(&url)
            .and_then(|d| d.text_document.version())
            .unwrap_or(0);
        let canceled = Arc::new(AtomicBool::new(false));
        self.inner.cancel_flags.lock().insert(id.clone(), Arc::clone(&canceled));

        let req = PendingRequest {
            url: url.clone(),
            min_version,
            id,
            params,
            canceled,
            responder: ResponseGuard { sender: Some(tx) },
        };
        self.inner.pending.lock().entry(url.clone()).or_default().push(req);

        if let Some(snapshot) = self.inner.registry.snapshot(&url) {
            if snapshot.doc_version.is_some_and(|v| v >= min_version) {
                self.on_snapshot_updated(&url);
            }
        }
        rx
    }

    /// `$/cancelRequest`: mark a pending request canceled. It is still
    /// dispatched once ready, but immediately answered with
    /// `LspError::cancelled()` instead of running the processor.
    pub fn cancel(&self, id: &RequestId) {
        if let Some(flag) = self.inner.cancel_flags.lock().get(id) {
            flag.store(true, Ordering::SeqCst);
        }
    }

    /// Drain every pending request for `url` whose `min_version` is
    /// satisfied by the current snapshot, dispatching them LIFO (latest
    /// enqueued first).
    pub fn on_snapshot_updated(&self, url: &str) {
        let Some(doc_version) = self.inner.registry.snapshot(url).and_then(|s| s.doc_version)
        else {
            return;
        };

        let ready = {
            let mut pending = self.inner.pending.lock();
            let Some(list) = pending.get_mut(url) else { return };
            let taken = std::mem::take(list);
            let (ready, remaining): (Vec<_>, Vec<_>) =
                taken.into_iter().partition(|req| req.min_version <= doc_version);
            *list = remaining;
            ready
        };

        let mut cancel_flags = self.inner.cancel_flags.lock();
        for req in &ready {
            cancel_flags.remove(&req.id);
        }
        drop(cancel_flags);

        for req in ready.into_iter().rev() {
            if req.is_canceled() {
                req.respond_error(LspError::cancelled());
                continue;
            }
            let processor = Arc::clone(&self.inner.processor);
            tokio::task::spawn_blocking(move || processor(req));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn receive_dispatches_immediately_when_snapshot_already_satisfies_version() {
        let registry = Arc::new(DocumentRegistry::default());
        registry.open("file:///a.qml", 1, "Item {}");
        let tree = qml_dom::parser::parse_source(std::path::Path::new("a.qml"), "Item {}").tree;
        registry.publish_snapshot("file:///a.qml", 1, qml_dom::DomItem::root(tree), true);

        let coordinator: RequestCoordinator<u32, u32> =
            RequestCoordinator::new(Arc::clone(&registry), |req: PendingRequest<u32, u32>| {
                let value = req.params + 1;
                req.respond(value);
            });
        let rx = coordinator.receive("file:///a.qml".to_string(), "1".to_string(), 41);
        let outcome = rx.await.expect("resolved");
        assert_eq!(outcome, Ok(42));
    }

    #[tokio::test]
    async fn canceled_request_resolves_with_request_cancelled() {
        let registry = Arc::new(DocumentRegistry::default());
        registry.open("file:///a.qml", 1, "Item {}");
        let tree = qml_dom::parser::parse_source(std::path::Path::new("a.qml"), "Item {}").tree;
        registry.publish_snapshot("file:///a.qml", 1, qml_dom::DomItem::root(tree), true);

        let coordinator: RequestCoordinator<u32, u32> =
            RequestCoordinator::new(Arc::clone(&registry), |req: PendingRequest<u32, u32>| {
                let value = req.params;
                req.respond(value);
            });
        let rx = coordinator.receive("file:///a.qml".to_string(), "1".to_string(), 7);
        coordinator.cancel(&"1".to_string());
        coordinator.on_snapshot_updated("file:///a.qml");
        let outcome = rx.await.expect("resolved");
        assert_eq!(outcome, Err(LspError::cancelled()));
    }
}
