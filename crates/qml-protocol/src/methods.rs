//! LSP method name constants used by the dispatcher (external collaborator)
//! to route into `ServerLifecycle`/`RequestCoordinator`.

/// Initialize request — first message from the client.
pub const INITIALIZE: &str = "initialize";
/// Initialized notification, sent after the initialize response.
pub const INITIALIZED: &str = "initialized";
/// Graceful shutdown request.
pub const SHUTDOWN: &str = "shutdown";
/// Terminate-process notification.
pub const EXIT: &str = "exit";

/// Document opened.
pub const TEXT_DOCUMENT_DID_OPEN: &str = "textDocument/didOpen";
/// Document changed.
pub const TEXT_DOCUMENT_DID_CHANGE: &str = "textDocument/didChange";
/// Document closed.
pub const TEXT_DOCUMENT_DID_CLOSE: &str = "textDocument/didClose";

/// Code completion request, the representative analysis module.
pub const TEXT_DOCUMENT_COMPLETION: &str = "textDocument/completion";

/// Request cancellation notification.
pub const CANCEL_REQUEST: &str = "$/cancelRequest";

/// Workspace folders changed.
pub const DID_CHANGE_WORKSPACE_FOLDERS: &str = "workspace/didChangeWorkspaceFolders";

/// A watched file on disk was created, changed, or deleted.
pub const DID_CHANGE_WATCHED_FILES: &str = "workspace/didChangeWatchedFiles";

/// Server-to-client request asking the client to dynamically register a
/// capability (used here for the watched-files glob registration).
pub const REGISTER_CAPABILITY: &str = "client/registerCapability";

/// Custom extension: client-supplied build directories for a
/// project root, bypassing the heuristic search.
pub const ADD_BUILD_DIRS: &str = "$/addBuildDirs";
