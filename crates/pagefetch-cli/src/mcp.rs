//! MCP (Model Context Protocol) server implementation
//!
//! Exposes the fetch operation twice: as a tool (autonomous intent,
//! robots.txt enforced) and as a prompt (manual intent, human-directed,
//! robots.txt bypassed).

use pagefetch::{FetchIntent, FetchRequest, Tool, TOOL_DESCRIPTION};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::io::{self, BufRead, Write};

const PROMPT_DESCRIPTION: &str = "Fetch a URL and extract its contents as markdown";

/// JSON-RPC 2.0 request
#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct JsonRpcRequest {
    jsonrpc: String,
    id: Option<Value>,
    method: String,
    #[serde(default)]
    params: Value,
}

/// JSON-RPC 2.0 response
#[derive(Debug, Serialize)]
struct JsonRpcResponse {
    jsonrpc: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<JsonRpcError>,
}

/// JSON-RPC 2.0 error
#[derive(Debug, Serialize)]
struct JsonRpcError {
    code: i32,
    message: String,
}

impl JsonRpcResponse {
    fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: Some(result),
            error: None,
        }
    }

    fn error(id: Option<Value>, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
            }),
        }
    }
}

/// MCP server state
struct McpServer {
    tool: Tool,
}

impl McpServer {
    fn new(tool: Tool) -> Self {
        Self { tool }
    }

    async fn handle_request(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        match request.method.as_str() {
            "initialize" => self.handle_initialize(request.id),
            "tools/list" => self.handle_tools_list(request.id),
            "tools/call" => self.handle_tools_call(request.id, request.params).await,
            "prompts/list" => self.handle_prompts_list(request.id),
            "prompts/get" => self.handle_prompts_get(request.id, request.params).await,
            "notifications/initialized" => JsonRpcResponse::success(request.id, json!(null)),
            _ => JsonRpcResponse::error(
                request.id,
                -32601,
                format!("Method not found: {}", request.method),
            ),
        }
    }

    fn handle_initialize(&self, id: Option<Value>) -> JsonRpcResponse {
        JsonRpcResponse::success(
            id,
            json!({
                "protocolVersion": "2024-11-05",
                "capabilities": {
                    "tools": {},
                    "prompts": {}
                },
                "serverInfo": {
                    "name": "pagefetch",
                    "version": env!("CARGO_PKG_VERSION")
                }
            }),
        )
    }

    fn handle_tools_list(&self, id: Option<Value>) -> JsonRpcResponse {
        JsonRpcResponse::success(
            id,
            json!({
                "tools": [{
                    "name": "fetch",
                    "description": TOOL_DESCRIPTION,
                    "inputSchema": self.tool.input_schema()
                }]
            }),
        )
    }

    fn handle_prompts_list(&self, id: Option<Value>) -> JsonRpcResponse {
        JsonRpcResponse::success(
            id,
            json!({
                "prompts": [{
                    "name": "fetch",
                    "description": PROMPT_DESCRIPTION,
                    "arguments": [{
                        "name": "url",
                        "description": "URL to fetch",
                        "required": true
                    }]
                }]
            }),
        )
    }

    async fn handle_tools_call(&self, id: Option<Value>, params: Value) -> JsonRpcResponse {
        let tool_name = params
            .get("name")
            .and_then(|v| v.as_str())
            .unwrap_or_default();

        if tool_name != "fetch" {
            return JsonRpcResponse::error(id, -32602, format!("Unknown tool: {}", tool_name));
        }

        let arguments = params.get("arguments").cloned().unwrap_or(json!({}));
        let request: FetchRequest = match serde_json::from_value(arguments) {
            Ok(req) => req,
            Err(e) => {
                return JsonRpcResponse::error(id, -32602, format!("Invalid arguments: {}", e));
            }
        };

        match self.tool.execute(&request, FetchIntent::Autonomous).await {
            Ok(payload) => JsonRpcResponse::success(
                id,
                json!({
                    "content": [{
                        "type": "text",
                        "text": payload
                    }]
                }),
            ),
            Err(e) => JsonRpcResponse::success(
                id,
                json!({
                    "content": [{
                        "type": "text",
                        "text": format!("Error: {}", e)
                    }],
                    "isError": true
                }),
            ),
        }
    }

    async fn handle_prompts_get(&self, id: Option<Value>, params: Value) -> JsonRpcResponse {
        let prompt_name = params
            .get("name")
            .and_then(|v| v.as_str())
            .unwrap_or_default();

        if prompt_name != "fetch" {
            return JsonRpcResponse::error(id, -32602, format!("Unknown prompt: {}", prompt_name));
        }

        let url = match params
            .get("arguments")
            .and_then(|a| a.get("url"))
            .and_then(|v| v.as_str())
        {
            Some(url) => url.to_string(),
            None => {
                return JsonRpcResponse::error(id, -32602, "Missing required argument: url");
            }
        };

        let request = FetchRequest::new(&url);
        let (description, text) = match self.tool.execute(&request, FetchIntent::Manual).await {
            Ok(payload) => (format!("Contents of {}", url), payload),
            Err(e) => (format!("Failed to fetch {}", url), e.to_string()),
        };

        JsonRpcResponse::success(
            id,
            json!({
                "description": description,
                "messages": [{
                    "role": "user",
                    "content": {
                        "type": "text",
                        "text": text
                    }
                }]
            }),
        )
    }
}

/// Run the MCP server over stdio
pub async fn run_server(tool: Tool) {
    let server = McpServer::new(tool);
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                eprintln!("Error reading stdin: {}", e);
                continue;
            }
        };

        if line.is_empty() {
            continue;
        }

        let request: JsonRpcRequest = match serde_json::from_str(&line) {
            Ok(req) => req,
            Err(e) => {
                let response = JsonRpcResponse::error(None, -32700, format!("Parse error: {}", e));
                let json = serde_json::to_string(&response).unwrap_or_default();
                let _ = writeln!(stdout, "{}", json);
                let _ = stdout.flush();
                continue;
            }
        };

        // Notifications carry no id and expect no response
        if request.id.is_none() && request.method.starts_with("notifications/") {
            continue;
        }

        let response = server.handle_request(request).await;
        let json = serde_json::to_string(&response).unwrap_or_default();
        let _ = writeln!(stdout, "{}", json);
        let _ = stdout.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(method: &str, params: Value) -> JsonRpcRequest {
        JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            id: Some(json!(1)),
            method: method.to_string(),
            params,
        }
    }

    #[tokio::test]
    async fn test_tools_list_exposes_fetch() {
        let server = McpServer::new(Tool::default());
        let response = server.handle_request(request("tools/list", json!({}))).await;

        let result = response.result.unwrap();
        assert_eq!(result["tools"][0]["name"], "fetch");
        assert!(result["tools"][0]["inputSchema"]["properties"]["url"].is_object());
    }

    #[tokio::test]
    async fn test_prompts_list_exposes_fetch() {
        let server = McpServer::new(Tool::default());
        let response = server
            .handle_request(request("prompts/list", json!({})))
            .await;

        let result = response.result.unwrap();
        assert_eq!(result["prompts"][0]["name"], "fetch");
        assert_eq!(result["prompts"][0]["arguments"][0]["name"], "url");
    }

    #[tokio::test]
    async fn test_unknown_method_is_an_error() {
        let server = McpServer::new(Tool::default());
        let response = server
            .handle_request(request("bogus/method", json!({})))
            .await;

        assert!(response.result.is_none());
        assert_eq!(response.error.unwrap().code, -32601);
    }

    #[tokio::test]
    async fn test_tools_call_rejects_unknown_tool() {
        let server = McpServer::new(Tool::default());
        let response = server
            .handle_request(request("tools/call", json!({"name": "other"})))
            .await;

        assert_eq!(response.error.unwrap().code, -32602);
    }

    #[tokio::test]
    async fn test_prompts_get_requires_url() {
        let server = McpServer::new(Tool::default());
        let response = server
            .handle_request(request("prompts/get", json!({"name": "fetch"})))
            .await;

        let err = response.error.unwrap();
        assert_eq!(err.code, -32602);
        assert!(err.message.contains("url"));
    }
}
