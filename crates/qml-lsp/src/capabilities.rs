//! The `initialize` response payload.

use serde_json::{json, Value};

/// Server capabilities advertised to the client, including the custom
/// `$/addBuildDirs` extension under `experimental`.
pub fn server_capabilities() -> Value {
    json!({
        "capabilities": {
            "textDocumentSync": {
                "openClose": true,
                "change": 2, // Incremental
            },
            "completionProvider": {
                "triggerCharacters": [".", ":"],
            },
            "workspace": {
                "workspaceFolders": {
                    "supported": true,
                    "changeNotifications": true,
                },
            },
            "experimental": {
                "addBuildDirs": {
                    "supported": true,
                },
            },
        },
        "serverInfo": {
            "name": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
        },
    })
}
