//! HTTP front door and per-request session manager.
//!
//! One configurable endpoint path on one configurable port. POST drives a
//! fresh ephemeral session through the transport; GET and DELETE always
//! answer the fixed 405 envelope regardless of body. Any failure in the
//! session pipeline before a reply is built becomes the fixed 500
//! internal-error envelope.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::Router;

use crate::config::ServerConfig;
use crate::mcp::protocol::JsonRpcError;
use crate::mcp::server::{LifecycleError, McpSession};
use crate::mcp::transport::{HttpTransport, TransportReply};
use crate::scene::{SceneAdapter, TransactionAdapter};

/// Shared adapters handed to every ephemeral session.
///
/// This is the only state the front door holds; protocol state lives and
/// dies with each request.
#[derive(Clone)]
pub struct BridgeState {
    /// The host's scene model.
    pub scene: Arc<dyn SceneAdapter>,
    /// The host's undo engine.
    pub transactions: Arc<dyn TransactionAdapter>,
}

impl BridgeState {
    /// Creates the shared state over the given adapters.
    #[must_use]
    pub fn new(scene: Arc<dyn SceneAdapter>, transactions: Arc<dyn TransactionAdapter>) -> Self {
        Self {
            scene,
            transactions,
        }
    }
}

/// Builds the router for the configured endpoint path.
#[must_use]
pub fn make_app(state: BridgeState, endpoint: &str) -> Router {
    Router::new()
        .route(
            endpoint,
            post(handle_post)
                .get(method_not_allowed)
                .delete(method_not_allowed),
        )
        .with_state(state)
}

/// Runs the front door until shutdown is signalled.
///
/// # Errors
///
/// Returns an error if the listener cannot bind or serving fails.
pub async fn run_server(state: BridgeState, config: &ServerConfig) -> std::io::Result<()> {
    let app = make_app(state, &config.endpoint);
    let shutdown = shutdown_signal()?;

    let listener = tokio::net::TcpListener::bind(("127.0.0.1", config.port)).await?;
    tracing::info!(
        port = config.port,
        endpoint = %config.endpoint,
        "MCP server running"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
}

/// Drives one ephemeral session for a POST body.
async fn handle_post(State(state): State<BridgeState>, body: String) -> Response {
    match drive_session(&state, &body).await {
        Ok(reply) => reply_to_response(reply),
        Err(error) => {
            tracing::error!(error = %error, "error handling MCP request");
            json_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                &JsonRpcError::internal_server_error(),
            )
        }
    }
}

/// The per-request session lifecycle: create, bind registries, attach the
/// transport for one exchange, close, discard.
async fn drive_session(state: &BridgeState, body: &str) -> Result<TransportReply, LifecycleError> {
    let mut session = McpSession::new(state.scene.clone(), state.transactions.clone());
    session.bind()?;

    let transport = HttpTransport::new();
    let reply = transport.handle_request(&mut session, body).await;

    // Closed whether the exchange succeeded or not; nothing is reused.
    session.close();
    reply
}

/// The fixed 405 reply for GET and DELETE, regardless of request body.
async fn method_not_allowed() -> Response {
    json_response(
        StatusCode::METHOD_NOT_ALLOWED,
        &JsonRpcError::http_method_not_allowed(),
    )
}

fn reply_to_response(reply: TransportReply) -> Response {
    let status = StatusCode::from_u16(reply.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    match reply.body {
        Some(body) => (
            status,
            [(header::CONTENT_TYPE, "application/json")],
            body,
        )
            .into_response(),
        None => status.into_response(),
    }
}

fn json_response(status: StatusCode, envelope: &JsonRpcError) -> Response {
    let body = serde_json::to_string(envelope).unwrap_or_else(|_| {
        r#"{"jsonrpc":"2.0","error":{"code":-32603,"message":"Internal server error"},"id":null}"#
            .to_string()
    });
    (
        status,
        [(header::CONTENT_TYPE, "application/json")],
        body,
    )
        .into_response()
}

/// Builds a future resolving when SIGINT or SIGTERM is received.
#[cfg(unix)]
fn shutdown_signal() -> std::io::Result<impl std::future::Future<Output = ()>> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;

    Ok(async move {
        tokio::select! {
            _ = sigint.recv() => tracing::info!("Received SIGINT, shutting down"),
            _ = sigterm.recv() => tracing::info!("Received SIGTERM, shutting down"),
        }
    })
}

/// Builds a future resolving when Ctrl+C is received.
#[cfg(not(unix))]
fn shutdown_signal() -> std::io::Result<impl std::future::Future<Output = ()>> {
    Ok(async {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Received Ctrl+C, shutting down");
        }
    })
}
