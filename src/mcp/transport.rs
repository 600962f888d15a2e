//! Buffered HTTP transport for the MCP session.
//!
//! Unlike a long-lived stream transport, this one exists for exactly one
//! request/response cycle: it parses the POST body into a JSON-RPC
//! message, drives the session once, and hands back a fully buffered
//! reply. Statelessness is deliberate — no session id is generated and
//! no `Mcp-Session-Id` continuity is offered, so every POST stands
//! alone.
//!
//! Because the reply is assembled in full before any byte reaches the
//! socket, the "headers already sent" failure mode of a streaming
//! transport (where a late error can only be logged while the client
//! receives a truncated response) cannot arise here.

use crate::mcp::protocol::{parse_message, IncomingMessage, JsonRpcError, JsonRpcResponse};
use crate::mcp::server::{LifecycleError, McpSession};

/// A fully buffered transport reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportReply {
    /// HTTP status code.
    pub status: u16,
    /// JSON body, absent for notification acknowledgements.
    pub body: Option<String>,
}

impl TransportReply {
    fn response(body: String) -> Self {
        Self {
            status: 200,
            body: Some(body),
        }
    }

    /// Notifications are acknowledged with 202 and no body.
    const fn accepted() -> Self {
        Self {
            status: 202,
            body: None,
        }
    }
}

/// Stateless single-exchange HTTP transport.
#[derive(Debug, Default)]
pub struct HttpTransport;

impl HttpTransport {
    /// Creates a new transport.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Drives one request/response cycle through the session.
    ///
    /// Protocol-level failures (parse errors, unknown methods, invalid
    /// params, absent resources) become JSON-RPC error bodies with HTTP
    /// 200. Only a session driven out of lifecycle order escapes as an
    /// error, which the front door maps to the fixed 500 envelope.
    ///
    /// # Errors
    ///
    /// Returns a [`LifecycleError`] if the session is not bound.
    pub async fn handle_request(
        &self,
        session: &mut McpSession,
        body: &str,
    ) -> Result<TransportReply, LifecycleError> {
        session.begin_handling()?;

        let reply = match parse_message(body) {
            Ok(IncomingMessage::Request(req)) => match session.dispatch(&req).await {
                Ok(response) => TransportReply::response(serialise_response(&response)),
                Err(error) => TransportReply::response(serialise_error(&error)),
            },
            Ok(IncomingMessage::Notification(notif)) => {
                session.notify(&notif);
                TransportReply::accepted()
            }
            Err(error) => TransportReply::response(serialise_error(&error)),
        };

        Ok(reply)
    }
}

fn serialise_response(response: &JsonRpcResponse) -> String {
    serde_json::to_string(response).unwrap_or_else(|e| {
        tracing::error!(error = %e, "failed to serialise response");
        serialise_error(&JsonRpcError::internal_server_error())
    })
}

fn serialise_error(error: &JsonRpcError) -> String {
    // The envelope types contain nothing unserialisable; the literal is
    // the last-resort fallback.
    serde_json::to_string(error).unwrap_or_else(|_| {
        r#"{"jsonrpc":"2.0","error":{"code":-32603,"message":"Internal server error"},"id":null}"#
            .to_string()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::scene::{EditJournal, InMemoryScene};

    fn bound_session() -> McpSession {
        let mut session = McpSession::new(
            Arc::new(InMemoryScene::new()),
            Arc::new(EditJournal::new()),
        );
        session.bind().unwrap();
        session
    }

    #[tokio::test]
    async fn request_gets_a_buffered_200_reply() {
        let mut session = bound_session();
        let transport = HttpTransport::new();

        let reply = transport
            .handle_request(&mut session, r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#)
            .await
            .unwrap();

        assert_eq!(reply.status, 200);
        let body: serde_json::Value = serde_json::from_str(&reply.body.unwrap()).unwrap();
        assert_eq!(body["id"], 1);
        assert_eq!(body["result"], serde_json::json!({}));
    }

    #[tokio::test]
    async fn notification_is_acknowledged_with_202_and_no_body() {
        let mut session = bound_session();
        let transport = HttpTransport::new();

        let reply = transport
            .handle_request(
                &mut session,
                r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            )
            .await
            .unwrap();

        assert_eq!(reply, TransportReply::accepted());
    }

    #[tokio::test]
    async fn malformed_json_is_a_parse_error_body() {
        let mut session = bound_session();
        let transport = HttpTransport::new();

        let reply = transport
            .handle_request(&mut session, "{not json")
            .await
            .unwrap();

        assert_eq!(reply.status, 200);
        let body: serde_json::Value = serde_json::from_str(&reply.body.unwrap()).unwrap();
        assert_eq!(body["error"]["code"], -32700);
    }

    #[tokio::test]
    async fn unbound_session_is_a_lifecycle_error() {
        let mut session = McpSession::new(
            Arc::new(InMemoryScene::new()),
            Arc::new(EditJournal::new()),
        );
        let transport = HttpTransport::new();

        let result = transport
            .handle_request(&mut session, r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#)
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn a_session_handles_exactly_one_exchange() {
        let mut session = bound_session();
        let transport = HttpTransport::new();

        transport
            .handle_request(&mut session, r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#)
            .await
            .unwrap();

        // The second exchange on the same session is a lifecycle error.
        let result = transport
            .handle_request(&mut session, r#"{"jsonrpc":"2.0","id":2,"method":"ping"}"#)
            .await;
        assert!(result.is_err());
    }
}
