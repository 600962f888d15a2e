//! Ephemeral MCP session scoped to one JSON-RPC exchange.
//!
//! Every inbound POST constructs a fresh [`McpSession`], binds the tool
//! and resource registries against it, drives exactly one
//! request/response cycle through the transport, and discards it. No
//! session outlives one HTTP request and no state is carried between
//! requests — the shared scene behind the injected adapters is the only
//! thing that persists.
//!
//! # Lifecycle
//!
//! `Created → Bound → Handling → Closed`, enforced at runtime: a session
//! driven out of order raises a [`LifecycleError`], which the front door
//! converts into the fixed internal-error envelope. There is no
//! transition back from `Closed`.
//!
//! Because nothing survives the request, no initialisation gate is
//! enforced either: `tools/call` works without a prior `initialize`,
//! matching a stateless transport with session-id issuance disabled.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::mcp::protocol::{
    JsonRpcError, JsonRpcNotification, JsonRpcRequest, JsonRpcResponse, MCP_PROTOCOL_VERSION,
    SERVER_NAME,
};
use crate::mcp::resources::{ResourceRegistry, ResourceTemplateDef};
use crate::mcp::tools::{ToolDefinition, ToolRegistry};
use crate::scene::{SceneAdapter, TransactionAdapter};

/// Session state in the per-request lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Constructed, registries not yet bound.
    Created,
    /// Registries bound, ready for its one exchange.
    Bound,
    /// Handling its one exchange.
    Handling,
    /// Done; a closed session is discarded.
    Closed,
}

/// A session driven outside its lifecycle order.
#[derive(Debug, thiserror::Error)]
#[error("session lifecycle violation: {0}")]
pub struct LifecycleError(pub &'static str);

/// Server capabilities advertised during initialisation.
#[derive(Debug, Clone, Serialize)]
pub struct ServerCapabilities {
    /// Tool-related capabilities.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Value>,
    /// Resource-related capabilities.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resources: Option<Value>,
}

impl Default for ServerCapabilities {
    fn default() -> Self {
        Self {
            tools: Some(json!({})),
            resources: Some(json!({})),
        }
    }
}

/// Server information for the initialisation response.
#[derive(Debug, Clone, Serialize)]
pub struct ServerInfo {
    /// Server name.
    pub name: String,
    /// Server version.
    pub version: String,
}

impl Default for ServerInfo {
    fn default() -> Self {
        Self {
            name: SERVER_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Parameters for the initialize request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
    /// Protocol version requested by the client.
    pub protocol_version: String,
    /// Client capabilities.
    #[serde(default)]
    pub capabilities: Value,
    /// Client information.
    #[serde(default)]
    pub client_info: Value,
}

/// Parameters for the tools/call request.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolCallParams {
    /// Name of the tool to call.
    pub name: String,
    /// Arguments for the tool.
    #[serde(default)]
    pub arguments: Value,
}

/// Parameters for the resources/read request.
#[derive(Debug, Clone, Deserialize)]
pub struct ReadResourceParams {
    /// URI of the resource instance to read.
    pub uri: String,
}

/// An MCP session scoped to exactly one JSON-RPC exchange.
pub struct McpSession {
    state: SessionState,
    scene: Arc<dyn SceneAdapter>,
    transactions: Arc<dyn TransactionAdapter>,
    tools: Vec<ToolDefinition>,
    templates: Vec<ResourceTemplateDef>,
    tool_registry: Option<ToolRegistry>,
    resource_registry: Option<ResourceRegistry>,
}

impl McpSession {
    /// Creates a session over the injected adapters.
    #[must_use]
    pub fn new(scene: Arc<dyn SceneAdapter>, transactions: Arc<dyn TransactionAdapter>) -> Self {
        Self {
            state: SessionState::Created,
            scene,
            transactions,
            tools: Vec::new(),
            templates: Vec::new(),
            tool_registry: None,
            resource_registry: None,
        }
    }

    /// Returns the current session state.
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Registers the full tool and resource registries.
    ///
    /// # Errors
    ///
    /// Returns a lifecycle error unless the session is freshly created.
    pub fn bind(&mut self) -> Result<(), LifecycleError> {
        if self.state != SessionState::Created {
            return Err(LifecycleError("bind on a non-fresh session"));
        }

        self.tools = ToolRegistry::definitions();
        self.templates = ResourceRegistry::templates();
        self.tool_registry = Some(ToolRegistry::new(
            self.scene.clone(),
            self.transactions.clone(),
        ));
        self.resource_registry = Some(ResourceRegistry::new(self.scene.clone()));

        self.state = SessionState::Bound;
        Ok(())
    }

    /// Marks the session as handling its one exchange.
    ///
    /// # Errors
    ///
    /// Returns a lifecycle error unless the registries are bound.
    pub fn begin_handling(&mut self) -> Result<(), LifecycleError> {
        if self.state != SessionState::Bound {
            return Err(LifecycleError("handling on an unbound or spent session"));
        }
        self.state = SessionState::Handling;
        Ok(())
    }

    /// Closes the session. Terminal; a closed session is discarded.
    pub fn close(&mut self) {
        self.state = SessionState::Closed;
    }

    /// Dispatches one request to the bound registries.
    ///
    /// # Errors
    ///
    /// Returns a JSON-RPC error for unknown methods, invalid parameters
    /// and unresolvable resources.
    pub async fn dispatch(
        &mut self,
        req: &JsonRpcRequest,
    ) -> Result<JsonRpcResponse, JsonRpcError> {
        tracing::debug!(method = %req.method, id = %req.id, "dispatching request");

        if self.state != SessionState::Handling {
            return Err(JsonRpcError::internal_error(
                req.id.clone(),
                "Session is not handling a request",
            ));
        }

        match req.method.as_str() {
            "initialize" => self.handle_initialize(req),
            "ping" => Ok(Self::handle_ping(req)),
            "tools/list" => self.handle_tools_list(req),
            "tools/call" => self.handle_tools_call(req).await,
            "resources/list" => self.handle_resources_list(req),
            "resources/read" => self.handle_resources_read(req),
            "resources/templates/list" => self.handle_templates_list(req),
            _ => Err(JsonRpcError::method_not_found(req.id.clone(), &req.method)),
        }
    }

    /// Acknowledges an incoming notification. Nothing is retained.
    pub fn notify(&self, notif: &JsonRpcNotification) {
        tracing::debug!(method = %notif.method, "notification acknowledged");
    }

    /// Handles the initialize request.
    ///
    /// Stateless: negotiation happens per request and nothing is
    /// remembered afterwards.
    fn handle_initialize(&self, req: &JsonRpcRequest) -> Result<JsonRpcResponse, JsonRpcError> {
        let _params: InitializeParams = parse_request_params(req, "initialize")?;

        let result = json!({
            "protocolVersion": MCP_PROTOCOL_VERSION,
            "capabilities": ServerCapabilities::default(),
            "serverInfo": ServerInfo::default(),
        });

        Ok(JsonRpcResponse::success(req.id.clone(), result))
    }

    /// Handles the ping request.
    fn handle_ping(req: &JsonRpcRequest) -> JsonRpcResponse {
        JsonRpcResponse::success(req.id.clone(), json!({}))
    }

    /// Handles the tools/list request.
    fn handle_tools_list(&self, req: &JsonRpcRequest) -> Result<JsonRpcResponse, JsonRpcError> {
        Ok(JsonRpcResponse::success(
            req.id.clone(),
            json!({ "tools": &self.tools }),
        ))
    }

    /// Handles the tools/call request.
    async fn handle_tools_call(
        &self,
        req: &JsonRpcRequest,
    ) -> Result<JsonRpcResponse, JsonRpcError> {
        let params: ToolCallParams = parse_request_params(req, "tool call")?;

        let registry = self.tool_registry.as_ref().ok_or_else(|| {
            JsonRpcError::internal_error(req.id.clone(), "Tool registry not bound")
        })?;

        let result = registry
            .dispatch(&req.id, &params.name, &params.arguments)
            .await?;

        let result_value = serde_json::to_value(&result).map_err(|e| {
            tracing::error!(error = %e, "failed to serialise tool call result");
            JsonRpcError::internal_error(
                req.id.clone(),
                "Internal error: failed to serialise result",
            )
        })?;

        Ok(JsonRpcResponse::success(req.id.clone(), result_value))
    }

    /// Handles the resources/list request.
    fn handle_resources_list(&self, req: &JsonRpcRequest) -> Result<JsonRpcResponse, JsonRpcError> {
        let registry = self.resource_registry.as_ref().ok_or_else(|| {
            JsonRpcError::internal_error(req.id.clone(), "Resource registry not bound")
        })?;

        Ok(JsonRpcResponse::success(req.id.clone(), registry.list()))
    }

    /// Handles the resources/read request.
    fn handle_resources_read(&self, req: &JsonRpcRequest) -> Result<JsonRpcResponse, JsonRpcError> {
        let params: ReadResourceParams = parse_request_params(req, "resource read")?;

        let registry = self.resource_registry.as_ref().ok_or_else(|| {
            JsonRpcError::internal_error(req.id.clone(), "Resource registry not bound")
        })?;

        let result = registry.read(&req.id, &params.uri)?;
        Ok(JsonRpcResponse::success(req.id.clone(), result))
    }

    /// Handles the resources/templates/list request.
    fn handle_templates_list(&self, req: &JsonRpcRequest) -> Result<JsonRpcResponse, JsonRpcError> {
        Ok(JsonRpcResponse::success(
            req.id.clone(),
            json!({ "resourceTemplates": &self.templates }),
        ))
    }
}

/// Deserialises the request's `params` object, requiring it to exist.
fn parse_request_params<T: serde::de::DeserializeOwned>(
    req: &JsonRpcRequest,
    what: &str,
) -> Result<T, JsonRpcError> {
    req.params
        .as_ref()
        .map(|p| serde_json::from_value(p.clone()))
        .transpose()
        .map_err(|e| {
            JsonRpcError::invalid_params(req.id.clone(), format!("Invalid {what} params: {e}"))
        })?
        .ok_or_else(|| {
            JsonRpcError::invalid_params(req.id.clone(), format!("Missing {what} params"))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::protocol::RequestId;
    use crate::scene::{EditJournal, InMemoryScene};

    fn session() -> McpSession {
        McpSession::new(
            Arc::new(InMemoryScene::new()),
            Arc::new(EditJournal::new()),
        )
    }

    fn bound_session() -> McpSession {
        let mut s = session();
        s.bind().unwrap();
        s.begin_handling().unwrap();
        s
    }

    fn request(method: &str, params: Value) -> JsonRpcRequest {
        JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            id: RequestId::Number(1),
            method: method.to_string(),
            params: Some(params),
        }
    }

    #[test]
    fn lifecycle_runs_forward_only() {
        let mut s = session();
        assert_eq!(s.state(), SessionState::Created);

        s.bind().unwrap();
        assert_eq!(s.state(), SessionState::Bound);
        assert!(s.bind().is_err());

        s.begin_handling().unwrap();
        assert_eq!(s.state(), SessionState::Handling);
        assert!(s.begin_handling().is_err());

        s.close();
        assert_eq!(s.state(), SessionState::Closed);
        assert!(s.begin_handling().is_err());
    }

    #[test]
    fn unbound_session_cannot_begin_handling() {
        let mut s = session();
        assert!(s.begin_handling().is_err());
    }

    #[tokio::test]
    async fn initialize_advertises_tools_and_resources() {
        let mut s = bound_session();
        let req = request(
            "initialize",
            json!({"protocolVersion": "2024-11-05", "capabilities": {}}),
        );

        let resp = s.dispatch(&req).await.unwrap();
        assert_eq!(resp.result["serverInfo"]["name"], SERVER_NAME);
        assert!(resp.result["capabilities"]["tools"].is_object());
        assert!(resp.result["capabilities"]["resources"].is_object());
    }

    #[tokio::test]
    async fn tools_call_works_without_prior_initialize() {
        // Stateless sessions cannot require an init handshake.
        let mut s = bound_session();
        let req = request("tools/call", json!({"name": "list_textures"}));

        let resp = s.dispatch(&req).await.unwrap();
        assert_eq!(resp.result["isError"], Value::Null);
        assert_eq!(resp.result["content"][0]["type"], "text");
    }

    #[tokio::test]
    async fn tools_list_serves_the_bound_registry() {
        let mut s = bound_session();
        let resp = s.dispatch(&request("tools/list", json!({}))).await.unwrap();
        assert_eq!(resp.result["tools"].as_array().unwrap().len(), 7);
    }

    #[tokio::test]
    async fn templates_list_serves_all_schemes() {
        let mut s = bound_session();
        let resp = s
            .dispatch(&request("resources/templates/list", json!({})))
            .await
            .unwrap();
        assert_eq!(
            resp.result["resourceTemplates"].as_array().unwrap().len(),
            5
        );
    }

    #[tokio::test]
    async fn unknown_method_is_method_not_found() {
        let mut s = bound_session();
        let err = s
            .dispatch(&request("scene/teleport", json!({})))
            .await
            .unwrap_err();
        assert_eq!(err.error.code, -32601);
    }

    #[tokio::test]
    async fn ping_returns_empty_object() {
        let mut s = bound_session();
        let resp = s.dispatch(&request("ping", json!({}))).await.unwrap();
        assert_eq!(resp.result, json!({}));
    }

    #[tokio::test]
    async fn tools_call_without_params_is_invalid() {
        let mut s = bound_session();
        let req = JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            id: RequestId::Number(1),
            method: "tools/call".to_string(),
            params: None,
        };
        let err = s.dispatch(&req).await.unwrap_err();
        assert_eq!(err.error.code, -32602);
    }
}
