//! End-to-end smoke tests driving the dispatcher directly, without a real
//! stdio transport. Each test builds a server with an in-memory output
//! buffer, feeds it requests through `qml_lsp::dispatch::handle`, and
//! decodes whatever Content-Length-framed messages came back out.

use std::sync::{Arc, Mutex};

use qml_lsp::Server;
use qml_protocol::JsonRpcRequest;
use serde_json::{json, Value};

#[derive(Clone, Default)]
struct SharedBuf(Arc<Mutex<Vec<u8>>>);

impl std::io::Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }
    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Split every Content-Length frame currently sitting in `buf` into decoded
/// JSON values, draining the buffer.
fn drain_frames(buf: &SharedBuf) -> Vec<Value> {
    let mut bytes = buf.0.lock().unwrap();
    let mut out = Vec::new();
    let mut rest: &[u8] = &bytes;

    loop {
        let Some(header_end) = find(rest, b"\r\n\r\n") else { break };
        let header = std::str::from_utf8(&rest[..header_end]).unwrap();
        let Some(length) = header
            .lines()
            .find_map(|l| l.strip_prefix("Content-Length: "))
            .and_then(|n| n.trim().parse::<usize>().ok())
        else {
            break;
        };
        let body_start = header_end + 4;
        let body_end = body_start + length;
        if rest.len() < body_end {
            break;
        }
        out.push(serde_json::from_slice(&rest[body_start..body_end]).unwrap());
        rest = &rest[body_end..];
    }

    bytes.clear();
    out
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn request(id: i64, method: &str, params: Value) -> JsonRpcRequest {
    serde_json::from_value(json!({"jsonrpc": "2.0", "id": id, "method": method, "params": params})).unwrap()
}

fn notification(method: &str, params: Value) -> JsonRpcRequest {
    serde_json::from_value(json!({"jsonrpc": "2.0", "method": method, "params": params})).unwrap()
}

async fn initialize(server: &Server, buf: &SharedBuf) -> Value {
    qml_lsp::dispatch::handle(server, request(1, "initialize", json!({}))).await;
    qml_lsp::dispatch::handle(server, notification("initialized", json!({}))).await;
    drain_frames(buf).into_iter().next().expect("initialize response")
}

#[tokio::test]
async fn initialize_advertises_completion_and_build_dir_extension() {
    let buf = SharedBuf::default();
    let server = Server::with_output(buf.clone());
    let response = initialize(&server, &buf).await;

    assert_eq!(response["id"], json!(1));
    let caps = &response["result"]["capabilities"];
    assert!(caps["completionProvider"].is_object());
    assert_eq!(caps["experimental"]["addBuildDirs"]["supported"], json!(true));
    assert_eq!(caps["workspace"]["workspaceFolders"]["supported"], json!(true));
}

#[tokio::test]
async fn completion_in_an_empty_object_body_returns_items() {
    let buf = SharedBuf::default();
    let server = Server::with_output(buf.clone());
    initialize(&server, &buf).await;

    let uri = "file:///scratch/main.qml";
    qml_lsp::dispatch::handle(
        &server,
        notification(
            "textDocument/didOpen",
            json!({
                "textDocument": {
                    "uri": uri,
                    "languageId": "qml",
                    "version": 1,
                    "text": "Item {\n    \n}\n",
                }
            }),
        ),
    )
    .await;

    qml_lsp::dispatch::handle(
        &server,
        request(
            2,
            "textDocument/completion",
            json!({
                "textDocument": { "uri": uri },
                "position": { "line": 1, "character": 4 },
            }),
        ),
    )
    .await;

    let response = drain_frames(&buf).into_iter().next().expect("completion response");
    assert_eq!(response["id"], json!(2));
    assert!(response["result"].is_array());
}

#[tokio::test]
async fn shutdown_is_deferred_until_the_pending_completion_drains() {
    let buf = SharedBuf::default();
    let server = Server::with_output(buf.clone());
    initialize(&server, &buf).await;

    let uri = "file:///scratch/deferred.qml";
    qml_lsp::dispatch::handle(
        &server,
        notification(
            "textDocument/didOpen",
            json!({
                "textDocument": { "uri": uri, "languageId": "qml", "version": 1, "text": "Item {\n}\n" }
            }),
        ),
    )
    .await;

    let completion = tokio::spawn({
        let server = Arc::clone(&server);
        async move {
            qml_lsp::dispatch::handle(
                &server,
                request(
                    10,
                    "textDocument/completion",
                    json!({
                        "textDocument": { "uri": uri },
                        "position": { "line": 1, "character": 0 },
                    }),
                ),
            )
            .await;
        }
    });

    qml_lsp::dispatch::handle(&server, request(11, "shutdown", json!(null))).await;
    completion.await.unwrap();

    let frames = drain_frames(&buf);
    let completion_response = frames.iter().find(|r| r["id"] == json!(10)).expect("completion answered");
    assert!(completion_response["result"].is_array());

    let shutdown_response = frames.iter().find(|r| r["id"] == json!(11)).expect("shutdown answered");
    assert_eq!(shutdown_response["result"], Value::Null);
}

#[tokio::test]
async fn initialized_registers_the_source_file_watchers() {
    let buf = SharedBuf::default();
    let server = Server::with_output(buf.clone());

    qml_lsp::dispatch::handle(&server, request(1, "initialize", json!({}))).await;
    drain_frames(&buf);

    qml_lsp::dispatch::handle(&server, notification("initialized", json!({}))).await;
    let registration = drain_frames(&buf).into_iter().next().expect("a registerCapability request");

    assert_eq!(registration["method"], json!("client/registerCapability"));
    let watchers = &registration["params"]["registrations"][0]["registerOptions"]["watchers"];
    let patterns: Vec<&str> = watchers.as_array().unwrap().iter().map(|w| w["globPattern"].as_str().unwrap()).collect();
    assert!(patterns.contains(&"**/*.{qml,js,mjs}"));
    assert!(patterns.contains(&"**/qmldir"));
    assert!(patterns.contains(&"**/*.qmltypes"));
}

#[tokio::test]
async fn did_change_watched_files_reindexes_the_changed_directory() {
    let dir = tempfile::tempdir().expect("tempdir");
    let file_path = dir.path().join("Widget.qml");
    std::fs::write(&file_path, "Item {\n}\n").expect("write fixture");
    let uri = format!("file://{}", file_path.display());

    let buf = SharedBuf::default();
    let server = Server::with_output(buf.clone());
    initialize(&server, &buf).await;

    qml_lsp::dispatch::handle(
        &server,
        notification(
            "workspace/didChangeWatchedFiles",
            json!({ "changes": [{ "uri": uri, "type": 2 }] }),
        ),
    )
    .await;

    for _ in 0..200 {
        if server.index_state().is_ready() {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }
    assert!(server.index_state().is_ready(), "indexer never caught up with the watched-file change");
}

#[tokio::test]
async fn unknown_method_is_rejected_before_initialize() {
    let buf = SharedBuf::default();
    let server = Server::with_output(buf.clone());

    qml_lsp::dispatch::handle(&server, request(1, "textDocument/completion", json!({}))).await;

    let response = drain_frames(&buf).into_iter().next().expect("an error response");
    assert!(response["error"].is_object());
    assert_eq!(response["error"]["code"], json!(-32002));
}
