use serde_json::Value;
use tokio::io::{self, AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::{
    adapters::{mcp::tools, Runner},
    cli::Args,
    core::{connection::resolve_path, Session},
    error::AppResult,
};

pub const SERVER_NAME: &str = "sqlite-crud-mcp";
const DEFAULT_PROTOCOL_VERSION: &str = "2024-11-05";

/// MCP server (JSON-RPC 2.0, one message per line).
///
/// Handles:
/// - initialize, ping
/// - tools/list
/// - tools/call: get_schema, execute_query, get_table_data, insert_record,
///   update_record, delete_record, create_database
///
/// Requests are answered one at a time, so the session's active database
/// only changes between tool calls.
pub struct McpServer {
    session: Session,
    runner: Runner,
}

impl McpServer {
    pub fn new(session: Session, runner: Runner) -> Self {
        Self { session, runner }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub async fn serve<R, W>(&mut self, reader: R, writer: W) -> AppResult<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut reader = reader;
        let mut writer = writer;
        let mut line = String::new();

        loop {
            line.clear();
            let n = reader.read_line(&mut line).await?;
            if n == 0 {
                break;
            }
            let raw = line.trim();
            if raw.is_empty() {
                continue;
            }

            let resp = match serde_json::from_str::<Value>(raw) {
                Ok(msg) => self.handle(msg).await,
                Err(e) => Some(jsonrpc_error(Value::Null, -32700, format!("parse error: {e}"))),
            };
            if let Some(resp) = resp {
                write_line(&mut writer, &resp).await?;
            }
        }

        tracing::info!("stdin closed; MCP server stopping");
        Ok(())
    }

    /// Answers one message. Notifications (no id) get no response.
    pub async fn handle(&mut self, msg: Value) -> Option<Value> {
        let id = msg.get("id").cloned().unwrap_or(Value::Null);
        if id.is_null() {
            if let Some(method) = msg.get("method").and_then(|m| m.as_str()) {
                tracing::debug!(method, "notification");
            }
            return None;
        }

        let Some(method) = msg.get("method").and_then(|m| m.as_str()) else {
            return Some(jsonrpc_error(id, -32600, "invalid request: missing method".into()));
        };
        let params = msg.get("params").cloned().unwrap_or(Value::Null);

        let resp = match method {
            "initialize" => handle_initialize(id, &params),
            "ping" => jsonrpc_result(id, serde_json::json!({})),
            "tools/list" => jsonrpc_result(id, serde_json::json!({ "tools": tools::definitions() })),
            "tools/call" => self.handle_tools_call(id, params).await,
            _ => jsonrpc_error(id, -32601, format!("method not found: {method}")),
        };
        Some(resp)
    }

    async fn handle_tools_call(&mut self, id: Value, params: Value) -> Value {
        let Some(name) = params.get("name").and_then(|v| v.as_str()) else {
            return jsonrpc_error(id, -32602, "invalid params: missing name".into());
        };
        let arguments = params
            .get("arguments")
            .cloned()
            .unwrap_or_else(|| Value::Object(Default::default()));

        let res = tools::call(name, arguments, &mut self.session, &self.runner).await;

        match res {
            Ok(structured) => {
                let text = serde_json::to_string_pretty(&structured).unwrap_or_else(|_| "<result>".into());
                jsonrpc_result(
                    id,
                    serde_json::json!({
                        "content": [{ "type": "text", "text": text }],
                        "isError": false
                    }),
                )
            }
            Err(e) => {
                tracing::warn!(tool = name, code = e.code(), error = %e, "tool call failed");
                jsonrpc_result(
                    id,
                    serde_json::json!({
                        "content": [{ "type": "text", "text": format!("Error: {e}") }],
                        "isError": true
                    }),
                )
            }
        }
    }
}

pub async fn run(args: &Args) -> AppResult<()> {
    let db_path = resolve_path(&args.db)?;
    tracing::info!(db = %db_path.display(), "MCP SQLite CRUD server started");
    let runner = Runner::from_args(args);
    let mut server = McpServer::new(Session::new(db_path, runner.options), runner);

    let stdin = io::BufReader::new(io::stdin());
    let stdout = io::BufWriter::new(io::stdout());
    server.serve(stdin, stdout).await
}

fn handle_initialize(id: Value, params: &Value) -> Value {
    let version = params
        .get("protocolVersion")
        .and_then(|v| v.as_str())
        .unwrap_or(DEFAULT_PROTOCOL_VERSION);
    jsonrpc_result(
        id,
        serde_json::json!({
            "protocolVersion": version,
            "serverInfo": {
                "name": SERVER_NAME,
                "version": env!("CARGO_PKG_VERSION")
            },
            "capabilities": {
                "tools": { "listChanged": false }
            }
        }),
    )
}

async fn write_line<W: AsyncWrite + Unpin>(w: &mut W, v: &Value) -> AppResult<()> {
    let mut buf = serde_json::to_vec(v)?;
    buf.push(b'\n');
    w.write_all(&buf).await?;
    w.flush().await?;
    Ok(())
}

fn jsonrpc_result(id: Value, result: Value) -> Value {
    serde_json::json!({
        "jsonrpc": "2.0",
        "id": id,
        "result": result
    })
}

fn jsonrpc_error(id: Value, code: i64, message: String) -> Value {
    serde_json::json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": { "code": code, "message": message }
    })
}
