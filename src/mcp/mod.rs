//! MCP (Model Context Protocol) server exposing the SSO refresh tool.
//!
//! Launch via: `aws-sso-mcp serve`
//! Configure in `.mcp.json` (or any other client config):
//! ```json
//! {
//!   "mcpServers": {
//!     "aws-sso": {
//!       "command": "aws-sso-mcp",
//!       "args": ["serve", "--server-name", "aws-sso"],
//!       "env": { "AWS_PROFILE": "my-sso-profile" }
//!     }
//!   }
//! }
//! ```

pub mod jsonrpc;
pub mod tools;

use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info, warn};

use crate::constants::SERVER_NAME;
use crate::env::{EnvProvider, SystemEnv};
use crate::refresh::SsoRefresher;

use jsonrpc::{JsonRpcRequest, JsonRpcResponse, METHOD_NOT_FOUND, PARSE_ERROR, PROTOCOL_VERSION};

pub struct McpServer {
    refresher: SsoRefresher,
    env: Arc<dyn EnvProvider>,
}

impl McpServer {
    pub fn new(refresher: SsoRefresher, env: Arc<dyn EnvProvider>) -> Self {
        Self { refresher, env }
    }

    pub fn system(default_server: Option<String>) -> Self {
        Self::new(
            SsoRefresher::system().with_default_server(default_server),
            Arc::new(SystemEnv),
        )
    }

    /// `None` for notifications.
    pub async fn handle_request(&self, request: &JsonRpcRequest) -> Option<JsonRpcResponse> {
        let Some(id) = request.id.clone() else {
            debug!(method = %request.method, "Notification received");
            return None;
        };

        let response = match request.method.as_str() {
            "initialize" => JsonRpcResponse::success(
                id,
                serde_json::json!({
                    "protocolVersion": PROTOCOL_VERSION,
                    "capabilities": {
                        "tools": {}
                    },
                    "serverInfo": {
                        "name": SERVER_NAME,
                        "version": crate::VERSION
                    }
                }),
            ),

            "ping" => JsonRpcResponse::success(id, serde_json::json!({})),

            "tools/list" => JsonRpcResponse::success(
                id,
                serde_json::json!({ "tools": tools::list_tools() }),
            ),

            "tools/call" => {
                let tool_name = request
                    .params
                    .get("name")
                    .and_then(|v| v.as_str())
                    .unwrap_or("");
                let arguments = request
                    .params
                    .get("arguments")
                    .cloned()
                    .unwrap_or(Value::Object(Default::default()));
                info!(tool = %tool_name, "Tool call");
                let result =
                    tools::call_tool(tool_name, &arguments, &self.refresher, self.env.as_ref())
                        .await;
                JsonRpcResponse::success(id, serde_json::to_value(result).unwrap_or(Value::Null))
            }

            _ => JsonRpcResponse::failure(
                id,
                METHOD_NOT_FOUND,
                format!("Method not found: {}", request.method),
            ),
        };

        Some(response)
    }

    /// Handles one protocol line and returns the serialized reply, if any.
    pub async fn handle_line(&self, line: &str) -> Result<Option<String>> {
        let response = match serde_json::from_str::<JsonRpcRequest>(line) {
            Ok(request) => self.handle_request(&request).await,
            Err(e) => {
                warn!(error = %e, "Unparseable JSON-RPC message");
                Some(JsonRpcResponse::failure(
                    Value::Null,
                    PARSE_ERROR,
                    format!("Parse error: {}", e),
                ))
            }
        };

        response
            .map(|r| serde_json::to_string(&r).context("Serializing JSON-RPC response"))
            .transpose()
    }

    /// Serves newline-delimited JSON-RPC until `reader` reaches EOF.
    pub async fn serve<R, W>(&self, reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();
        while let Some(line) = lines.next_line().await.context("Reading from stdin")? {
            if line.trim().is_empty() {
                continue;
            }

            if let Some(reply) = self.handle_line(&line).await? {
                writer
                    .write_all(reply.as_bytes())
                    .await
                    .context("Writing to stdout")?;
                writer.write_all(b"\n").await.context("Writing to stdout")?;
                writer.flush().await.context("Flushing stdout")?;
            }
        }
        Ok(())
    }
}

/// Run the MCP server on stdio.
pub async fn run_server(default_server: Option<String>) -> Result<()> {
    info!(
        version = crate::VERSION,
        default_server = default_server.as_deref().unwrap_or("-"),
        "Starting MCP server on stdio"
    );
    let server = McpServer::system(default_server);
    server
        .serve(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
        .await?;
    info!("stdin closed, shutting down");
    Ok(())
}
