//! Method routing: applies lifecycle gating, then dispatches to the
//! relevant component.

use lsp_types::{CompletionParams as LspCompletionParams, Position};
use qml_coordinator::MessageGate;
use qml_protocol::{methods, JsonRpcError, JsonRpcRequest, SERVER_NOT_INITIALIZED};
use serde_json::{json, Value};

use crate::convert::{canonical_id, completion_item};
use crate::server::Server;

/// Route one decoded request or notification to its handler.
pub async fn handle(server: &Server, request: JsonRpcRequest) {
    let has_id = request.id.is_some();
    let gate = server.lifecycle.gate(&request.method, has_id);

    match gate {
        MessageGate::Drop => {}
        MessageGate::ServerNotInitialized => {
            if has_id {
                server.respond_error(
                    request.id,
                    JsonRpcError::new(SERVER_NOT_INITIALIZED, "server not initialized"),
                );
            }
        }
        MessageGate::InvalidRequest => {
            if has_id {
                server.respond_error(
                    request.id,
                    JsonRpcError::new(qml_protocol::INVALID_REQUEST, "server is shutting down"),
                );
            }
        }
        MessageGate::Pass => route(server, request).await,
    }
}

async fn route(server: &Server, request: JsonRpcRequest) {
    match request.method.as_str() {
        methods::INITIALIZE => handle_initialize(server, request),
        methods::INITIALIZED => server.register_file_watchers(),
        methods::SHUTDOWN => handle_shutdown(server, request),
        methods::EXIT => handle_exit(server),
        methods::TEXT_DOCUMENT_DID_OPEN => handle_did_open(server, request),
        methods::TEXT_DOCUMENT_DID_CHANGE => handle_did_change(server, request),
        methods::TEXT_DOCUMENT_DID_CLOSE => handle_did_close(server, request),
        methods::TEXT_DOCUMENT_COMPLETION => handle_completion(server, request).await,
        methods::CANCEL_REQUEST => handle_cancel(server, request),
        methods::DID_CHANGE_WORKSPACE_FOLDERS => handle_workspace_folders(server, request),
        methods::DID_CHANGE_WATCHED_FILES => handle_did_change_watched_files(server, request),
        methods::ADD_BUILD_DIRS => handle_add_build_dirs(server, request),
        other => {
            tracing::debug!(method = other, "unhandled method");
            if request.id.is_some() {
                server.respond_error(
                    request.id,
                    JsonRpcError::new(qml_protocol::INVALID_REQUEST, format!("unknown method: {other}")),
                );
            }
        }
    }
}

fn handle_initialize(server: &Server, request: JsonRpcRequest) {
    server.lifecycle.begin_initialize().ok();

    if let Some(params) = &request.params {
        for root in workspace_roots(params) {
            server.add_workspace_root(&root);
        }
    }

    server.lifecycle.complete_initialize().ok();
    server.respond(request.id, crate::capabilities::server_capabilities());
}

fn workspace_roots(params: &Value) -> Vec<String> {
    if let Some(folders) = params.get("workspaceFolders").and_then(Value::as_array) {
        return folders
            .iter()
            .filter_map(|f| f.get("uri").and_then(Value::as_str))
            .map(str::to_string)
            .collect();
    }
    params
        .get("rootUri")
        .and_then(Value::as_str)
        .map(|uri| vec![uri.to_string()])
        .unwrap_or_default()
}

fn handle_shutdown(server: &Server, request: JsonRpcRequest) {
    let Some(id) = request.id else { return };
    let canonical = canonical_id(&id);
    if server.lifecycle.shutdown(canonical) {
        server.respond(Some(id), Value::Null);
        server.lifecycle.execute_shutdown().ok();
    } else {
        // Deferred: `Server::finish_deferred_shutdown` answers this once the
        // last pending analysis request drains.
        server.defer_shutdown_response(id);
    }
}

fn handle_exit(server: &Server) {
    let code = server.lifecycle.exit_code();
    server.lifecycle.exit();
    std::process::exit(code);
}

fn handle_did_open(server: &Server, request: JsonRpcRequest) {
    let Some(params) = request.params.and_then(|p| serde_json::from_value::<lsp_types::DidOpenTextDocumentParams>(p).ok())
    else {
        return;
    };
    let url = params.text_document.uri.to_string();
    server.registry.open(&url, params.text_document.version, &params.text_document.text);
    server.schedule_update(&url);
}

fn handle_did_change(server: &Server, request: JsonRpcRequest) {
    let Some(params) = request
        .params
        .and_then(|p| serde_json::from_value::<lsp_types::DidChangeTextDocumentParams>(p).ok())
    else {
        return;
    };
    let url = params.text_document.uri.to_string();
    server.registry.change(&url, params.text_document.version, &params.content_changes);
    server.schedule_update(&url);
}

fn handle_did_close(server: &Server, request: JsonRpcRequest) {
    let Some(params) =
        request.params.and_then(|p| serde_json::from_value::<lsp_types::DidCloseTextDocumentParams>(p).ok())
    else {
        return;
    };
    server.registry.close(params.text_document.uri.as_str());
}

async fn handle_completion(server: &Server, request: JsonRpcRequest) {
    let id = request.id.clone();
    let Some(params) = request.params.and_then(|p| serde_json::from_value::<LspCompletionParams>(p).ok())
    else {
        if id.is_some() {
            server.respond_error(id, JsonRpcError::new(qml_protocol::INVALID_REQUEST, "malformed completion params"));
        }
        return;
    };
    let Some(id) = id else { return };
    let canonical = canonical_id(&id);

    let url = params.text_document_position.text_document.uri.to_string();
    let position: Position = params.text_document_position.position;
    server.lifecycle.register_request(canonical.clone());

    let rx = server.completion.receive(
        url.clone(),
        canonical.clone(),
        qml_completion::CompletionParams { url, position },
    );

    let outcome = rx.await;
    if let Some(deferred_id) = server.lifecycle.complete_request(&canonical) {
        server.finish_deferred_shutdown(&deferred_id);
    }

    match outcome {
        Ok(Ok(items)) => {
            let items: Vec<lsp_types::CompletionItem> = items.into_iter().map(completion_item).collect();
            server.respond(Some(id), json!(items));
        }
        Ok(Err(err)) => server.respond_error(Some(id), err.into()),
        Err(_) => server.respond_error(Some(id), JsonRpcError::new(qml_protocol::INVALID_REQUEST, "completion dropped")),
    }
}

fn handle_cancel(server: &Server, request: JsonRpcRequest) {
    let Some(params) = request.params else { return };
    let Some(id) = params.get("id") else { return };
    server.completion.cancel(&canonical_id(id));
}

fn handle_workspace_folders(server: &Server, request: JsonRpcRequest) {
    let Some(params) = request.params else { return };
    if let Some(added) = params.get("event").and_then(|e| e.get("added")).and_then(Value::as_array) {
        for folder in added {
            if let Some(uri) = folder.get("uri").and_then(Value::as_str) {
                server.add_workspace_root(uri);
            }
        }
    }
    if let Some(removed) = params.get("event").and_then(|e| e.get("removed")).and_then(Value::as_array) {
        for folder in removed {
            if let Some(uri) = folder.get("uri").and_then(Value::as_str) {
                server.registry.remove_root(uri);
            }
        }
    }
}

/// A watched file's `FileChangeType::Deleted` value per the LSP spec.
const FILE_CHANGE_DELETED: u64 = 3;

fn handle_did_change_watched_files(server: &Server, request: JsonRpcRequest) {
    let Some(params) = request.params else { return };
    let Some(changes) = params.get("changes").and_then(Value::as_array) else { return };

    for change in changes {
        let Some(uri) = change.get("uri").and_then(Value::as_str) else { continue };
        let Some(path) = server.registry.url_to_path(uri, qml_uri::LookupMode::Force) else { continue };
        let change_type = change.get("type").and_then(Value::as_u64).unwrap_or(0);

        if change_type == FILE_CHANGE_DELETED {
            server.current_env.remove_path(&path);
            server.valid_env.remove_path(&path);
            continue;
        }

        let Some(dir) = path.parent() else { continue };
        server.indexer.add_directories(&[dir.to_path_buf()], 0);
        server.indexer.kick();
    }
}

fn handle_add_build_dirs(server: &Server, request: JsonRpcRequest) {
    let Some(params) = request.params else { return };
    let Some(entries) = params.get("buildDirsToSet").and_then(Value::as_array) else { return };
    for entry in entries {
        let Some(base_uri) = entry.get("baseUri").and_then(Value::as_str) else { continue };
        let dirs: Vec<std::path::PathBuf> = entry
            .get("buildDirs")
            .and_then(Value::as_array)
            .map(|arr| arr.iter().filter_map(Value::as_str).map(std::path::PathBuf::from).collect())
            .unwrap_or_default();
        server.registry.set_build_dirs(base_uri.to_string(), dirs);
    }
}
