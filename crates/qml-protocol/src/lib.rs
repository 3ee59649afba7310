//! JSON-RPC message types, LSP method name constants, and the error codes
//! the core coordinator and its analysis modules report.

#![warn(missing_docs)]

mod errors;
mod jsonrpc;
pub mod methods;

pub use errors::{LspError, INVALID_REQUEST, REQUEST_CANCELLED, REQUEST_TARGET_ERROR, SERVER_NOT_INITIALIZED};
pub use jsonrpc::{JsonRpcError, JsonRpcNotification, JsonRpcRequest, JsonRpcResponse};
