//! MCP protocol implementation.
//!
//! Layering, outermost first:
//!
//! - [`http`] — axum front door and per-request session manager
//! - [`transport`] — buffered single-exchange HTTP transport
//! - [`server`] — ephemeral session with bound registries
//! - [`tools`] / [`resources`] — the registries and their handlers
//! - [`protocol`] — JSON-RPC 2.0 message types

pub mod http;
pub mod protocol;
pub mod resources;
pub mod server;
pub mod tools;
pub mod transport;
