//! Content-Length message framing (LSP Base Protocol).

use std::collections::HashMap;
use std::io::{self, BufRead, Read, Write};

use qml_protocol::{JsonRpcNotification, JsonRpcRequest, JsonRpcResponse};
use serde_json::Value;

/// Read one LSP message from a buffered reader, skipping over malformed
/// frames rather than giving up on the stream.
///
/// Returns `Ok(None)` only on genuine EOF. A malformed header or an
/// unparseable body is logged and treated as consumed, and the function
/// tries the next frame in the stream. Returns `Err` only on an underlying
/// I/O error.
pub fn read_message<R: BufRead>(reader: &mut R) -> io::Result<Option<JsonRpcRequest>> {
    loop {
        let mut headers = HashMap::new();
        let mut saw_any_bytes = false;

        loop {
            let mut line = String::new();
            if reader.read_line(&mut line)? == 0 {
                return if saw_any_bytes {
                    tracing::warn!("LSP stream ended mid-header");
                    Ok(None)
                } else {
                    Ok(None) // clean EOF between messages
                };
            }
            saw_any_bytes = true;
            let line = line.trim_end();
            if line.is_empty() {
                break;
            }
            if let Some((key, value)) = line.split_once(": ") {
                headers.insert(key.to_string(), value.to_string());
            }
        }

        let Some(length) = headers.get("Content-Length").and_then(|v| v.parse::<usize>().ok())
        else {
            tracing::warn!("LSP message missing or malformed Content-Length header, resyncing");
            continue;
        };

        let mut content = vec![0u8; length];
        reader.read_exact(&mut content)?;

        match serde_json::from_slice(&content) {
            Ok(request) => return Ok(Some(request)),
            Err(err) => {
                let preview = String::from_utf8_lossy(&content);
                let preview = preview.chars().take(100).collect::<String>();
                tracing::warn!(%err, frame = %preview, "discarding malformed frame, resyncing");
                continue;
            }
        }
    }
}

/// Write a response with Content-Length framing.
pub fn write_message<W: Write>(writer: &mut W, response: &JsonRpcResponse) -> io::Result<()> {
    let content = serde_json::to_string(response)?;
    write!(writer, "Content-Length: {}\r\n\r\n{}", content.len(), content)?;
    writer.flush()
}

/// Write a server-to-client notification with Content-Length framing.
pub fn write_notification<W: Write>(writer: &mut W, notification: &JsonRpcNotification) -> io::Result<()> {
    let content = serde_json::to_string(notification)?;
    write!(writer, "Content-Length: {}\r\n\r\n{}", content.len(), content)?;
    writer.flush()
}

/// Write a server-to-client request with Content-Length framing. Used for
/// the rare case where the server itself initiates a request (dynamic
/// capability registration); the response, if any, is not correlated back
/// to a waiting caller.
pub fn write_request<W: Write>(writer: &mut W, id: &str, method: &str, params: Value) -> io::Result<()> {
    let body = serde_json::json!({ "jsonrpc": "2.0", "id": id, "method": method, "params": params });
    let content = serde_json::to_string(&body)?;
    write!(writer, "Content-Length: {}\r\n\r\n{}", content.len(), content)?;
    writer.flush()
}

/// Trace an outgoing response without the full payload.
pub fn log_response(response: &JsonRpcResponse) {
    if let Ok(content) = serde_json::to_string(response) {
        tracing::debug!(
            id = ?response.id,
            has_result = response.result.is_some(),
            has_error = response.error.is_some(),
            len = content.len(),
            "sent response"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufReader, Cursor};

    #[test]
    fn round_trips_a_request_through_framing() {
        let body = r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#;
        let frame = format!("Content-Length: {}\r\n\r\n{}", body.len(), body);
        let mut reader = BufReader::new(Cursor::new(frame.into_bytes()));

        let request = read_message(&mut reader).expect("no io error").expect("a message");
        assert_eq!(request.method, "initialize");
    }

    #[test]
    fn truncated_stream_yields_eof() {
        let mut reader = BufReader::new(Cursor::new(Vec::new()));
        let request = read_message(&mut reader).expect("no io error");
        assert!(request.is_none());
    }

    #[test]
    fn malformed_json_body_is_recoverable() {
        let body = "{not json";
        let frame = format!("Content-Length: {}\r\n\r\n{}", body.len(), body);
        let mut reader = BufReader::new(Cursor::new(frame.into_bytes()));
        let request = read_message(&mut reader).expect("no io error");
        assert!(request.is_none());
    }

    #[test]
    fn write_message_produces_well_formed_frame() {
        let response = JsonRpcResponse::success(Some(serde_json::json!(1)), serde_json::json!(null));
        let mut out = Vec::new();
        write_message(&mut out, &response).expect("writes");
        let text = String::from_utf8(out).expect("utf8");
        assert!(text.starts_with("Content-Length: "));
        assert!(text.ends_with("\"result\":null}"));
    }
}
