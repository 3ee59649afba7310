//! Wiring for the process-wide components and the stdio message loop.

use std::io::{self, BufReader, Write};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use qml_completion::{CompletionEngine, CompletionParams};
use qml_coordinator::{RequestCoordinator, ServerLifecycle};
use qml_doc_updater::OpenDocUpdater;
use qml_environment::Environment;
use qml_indexer::Indexer;
use qml_protocol::{JsonRpcError, JsonRpcNotification, JsonRpcResponse};
use qml_registry::DocumentRegistry;
use rustc_hash::FxHashMap;
use serde_json::Value;

use crate::config;

/// Maximum directory depth the indexer descends when a workspace root is
/// registered, keeping a pathological workspace tree from running away on
/// startup.
const INDEX_MAX_DEPTH: u32 = 64;

/// The process-wide state a single server instance holds for its lifetime.
pub struct Server {
    pub(crate) registry: Arc<DocumentRegistry>,
    // `current_env`/`valid_env` back the indexer and open-document updater;
    // kept here too so `handle_did_change_watched_files` can remove deleted
    // files directly without re-threading environments through the indexer.
    pub(crate) current_env: Environment,
    pub(crate) valid_env: Environment,
    pub(crate) indexer: Indexer,
    pub(crate) doc_updater: OpenDocUpdater,
    pub(crate) lifecycle: ServerLifecycle,
    pub(crate) completion: RequestCoordinator<CompletionParams, Vec<qml_completion::CompletionItem>>,
    output: Mutex<Box<dyn Write + Send>>,
    /// Original JSON-RPC id of a `shutdown` request deferred until the last
    /// in-flight analysis request drains.
    deferred_shutdown: Mutex<FxHashMap<String, Value>>,
    /// Counter for ids on server-initiated requests (e.g. dynamic capability
    /// registration), separate from client-assigned request ids.
    next_request_id: AtomicU64,
}

impl Server {
    /// Build a server with fresh, empty state, writing to stdout.
    pub fn new() -> Arc<Self> {
        Self::with_output(io::stdout())
    }

    /// Build a server that writes responses/notifications to `output`
    /// instead of stdout, so tests can inspect what the server sends.
    pub fn with_output(output: impl Write + Send + 'static) -> Arc<Self> {
        let registry = Arc::new(DocumentRegistry::new(
            config::env_fallback_dirs(),
            Some(config::settings_lookup()),
        ));
        let current_env = Environment::new();
        let valid_env = Environment::new();
        let indexer = Indexer::new(current_env.clone(), valid_env.clone());
        let doc_updater = OpenDocUpdater::new(Arc::clone(&registry), current_env.clone(), Vec::new());
        let completion = CompletionEngine::coordinator(Arc::clone(&registry));

        Arc::new(Self {
            registry,
            current_env,
            valid_env,
            indexer,
            doc_updater,
            lifecycle: ServerLifecycle::new(),
            completion,
            output: Mutex::new(Box::new(output)),
            deferred_shutdown: Mutex::new(FxHashMap::default()),
            next_request_id: AtomicU64::new(1),
        })
    }

    /// Record a `shutdown` request's id to answer once the in-flight
    /// analysis requests it is waiting on have all completed.
    pub fn defer_shutdown_response(&self, id: Value) {
        let canonical = crate::convert::canonical_id(&id);
        self.deferred_shutdown.lock().insert(canonical, id);
    }

    /// Answer a deferred `shutdown` whose wait condition
    /// [`qml_coordinator::ServerLifecycle::complete_request`] has just
    /// reported as satisfied.
    pub fn finish_deferred_shutdown(&self, canonical_id: &str) {
        if let Some(id) = self.deferred_shutdown.lock().remove(canonical_id) {
            self.respond(Some(id), Value::Null);
            self.lifecycle.execute_shutdown().ok();
        }
    }

    /// Current background-scan progress, for diagnostics and tests.
    pub fn index_state(&self) -> qml_indexer::IndexState {
        self.indexer.state()
    }

    /// Register a workspace root for background scanning.
    pub fn add_workspace_root(&self, root_url: &str) {
        self.registry.add_root(root_url.to_string());
        if let Some(path) = self.registry.url_to_path(root_url, qml_uri::LookupMode::Force) {
            self.indexer.add_directories(&[path], INDEX_MAX_DEPTH);
            self.indexer.kick();
        }
    }

    /// Mark `url` for re-parse and wake the updater worker.
    pub fn schedule_update(&self, url: &str) {
        self.doc_updater.schedule(url);
        self.doc_updater.kick();
    }

    /// Write a success response.
    pub fn respond(&self, id: Option<Value>, result: Value) {
        let response = JsonRpcResponse::success(id, result);
        self.write_response(&response);
    }

    /// Write an error response.
    pub fn respond_error(&self, id: Option<Value>, error: JsonRpcError) {
        let response = JsonRpcResponse::error(id, error);
        self.write_response(&response);
    }

    fn write_response(&self, response: &JsonRpcResponse) {
        qml_transport::log_response(response);
        let mut out = self.output.lock();
        if let Err(err) = qml_transport::write_message(&mut *out, response) {
            tracing::error!(%err, "failed writing response");
        }
    }

    /// Send a server-to-client notification.
    pub fn notify(&self, method: &str, params: Value) {
        let notification = JsonRpcNotification::new(method, params);
        let mut out = self.output.lock();
        if let Err(err) = qml_transport::write_notification(&mut *out, &notification) {
            tracing::error!(%err, "failed writing notification");
        }
    }

    /// Send a server-to-client request. The response is not correlated back
    /// to a waiting caller; used for fire-and-forget dynamic registration.
    fn request(&self, method: &str, params: Value) {
        let id = self.next_request_id.fetch_add(1, Ordering::SeqCst).to_string();
        let mut out = self.output.lock();
        if let Err(err) = qml_transport::write_request(&mut *out, &id, method, params) {
            tracing::error!(%err, "failed writing request");
        }
    }

    /// Ask the client to dynamically register a file-system watcher for the
    /// declarative-UI source globs (`*.{qml,js,mjs}`, `qmldir`,
    /// `*.qmltypes`), mirroring the three watchers the reference
    /// implementation registers once the client has finished initializing.
    pub fn register_file_watchers(&self) {
        let watch_all = 7; // Create | Change | Delete
        let params = serde_json::json!({
            "registrations": [{
                "id": "qml-source-watcher",
                "method": qml_protocol::methods::DID_CHANGE_WATCHED_FILES,
                "registerOptions": {
                    "watchers": [
                        { "globPattern": "**/*.{qml,js,mjs}", "kind": watch_all },
                        { "globPattern": "**/qmldir", "kind": watch_all },
                        { "globPattern": "**/*.qmltypes", "kind": watch_all },
                    ],
                },
            }],
        });
        self.request(qml_protocol::methods::REGISTER_CAPABILITY, params);
    }

    /// Run the server against stdin/stdout until EOF or `exit`. Returns the
    /// process exit code.
    pub async fn run(self: Arc<Self>) -> i32 {
        self.lifecycle.finish_setup().ok();
        self.lifecycle.complete_setup().ok();

        self.spawn_snapshot_bridge();

        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        Self::spawn_stdin_reader(tx);

        while let Some(request) = rx.recv().await {
            let server = Arc::clone(&self);
            tokio::spawn(async move {
                crate::dispatch::handle(&server, request).await;
            });
        }

        self.lifecycle.exit_code()
    }

    /// Bridge `snapshot_updated(url)` events onto the completion
    /// coordinator, which is otherwise only driven by `receive`.
    fn spawn_snapshot_bridge(self: &Arc<Self>) {
        let server = Arc::clone(self);
        let subscriber = server.registry.subscribe_snapshot_updated();
        tokio::task::spawn_blocking(move || {
            while let Ok(url) = subscriber.recv() {
                server.completion.on_snapshot_updated(&url);
            }
        });
    }

    /// Read Content-Length-framed messages from stdin on a dedicated
    /// blocking thread, forwarding each to the async dispatch loop.
    /// Malformed frames are already skipped internally by
    /// [`qml_transport::read_message`], so `Ok(None)` here means EOF.
    fn spawn_stdin_reader(tx: tokio::sync::mpsc::UnboundedSender<qml_protocol::JsonRpcRequest>) {
        tokio::task::spawn_blocking(move || {
            let mut reader = BufReader::new(io::stdin());
            loop {
                match qml_transport::read_message(&mut reader) {
                    Ok(Some(request)) => {
                        if tx.send(request).is_err() {
                            break;
                        }
                    }
                    Ok(None) => break,
                    Err(err) => {
                        tracing::error!(%err, "stdin read error");
                        break;
                    }
                }
            }
        });
    }
}
