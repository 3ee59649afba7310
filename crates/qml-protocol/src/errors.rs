//! LSP/JSON-RPC error codes used by the core.

/// Standard JSON-RPC "invalid request" code, used for malformed messages and
/// for requests with an id received while the server is shutting down.
pub const INVALID_REQUEST: i32 = -32600;

/// LSP-specific code for requests received before `initialize` completes.
pub const SERVER_NOT_INITIALIZED: i32 = -32002;

/// LSP-specific code for a request whose response was never sent because it
/// was cancelled.
pub const REQUEST_CANCELLED: i32 = -32800;

/// Request-target errors (unknown document, out-of-range position) use code
/// `0` rather than a reserved JSON-RPC range — these are recoverable,
/// per-request failures, not protocol or lifecycle errors.
pub const REQUEST_TARGET_ERROR: i32 = 0;

/// A structured LSP error: code plus human-readable message, as returned by
/// an analysis module's `process` step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LspError {
    /// One of the codes in this module, or a module-specific code.
    pub code: i32,
    /// Message shown to the user or logged by the client.
    pub message: String,
}

impl LspError {
    /// Build an error with the given code and message.
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }

    /// A request-target error: unknown document, closed document,
    /// or an out-of-range position.
    pub fn request_target(message: impl Into<String>) -> Self {
        Self::new(REQUEST_TARGET_ERROR, message)
    }

    /// The standard "request cancelled" error.
    pub fn cancelled() -> Self {
        Self::new(REQUEST_CANCELLED, "request cancelled")
    }
}

impl std::fmt::Display for LspError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for LspError {}

impl From<LspError> for crate::jsonrpc::JsonRpcError {
    fn from(err: LspError) -> Self {
        crate::jsonrpc::JsonRpcError::new(err.code, err.message)
    }
}
