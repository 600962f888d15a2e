//! modelbench-mcp: MCP protocol bridge for the Modelbench editor.
//!
//! Exposes a JSON-RPC tool/resource interface over HTTP, letting a remote
//! agent query and mutate the in-memory scene model of the host editor.
//!
//! # Architecture
//!
//! Each inbound POST gets a fresh, short-lived protocol session: the tool
//! and resource registries are bound to it, one JSON-RPC exchange is
//! processed, and the session is discarded. The scene itself is the only
//! shared state, reached through two injected seams:
//!
//! - `SceneAdapter` — elements, textures, projects, toolbar actions
//! - `TransactionAdapter` — labelled undoable edits, redraw on commit
//!
//! # Modules
//!
//! - [`config`] — Configuration loading and validation
//! - [`error`] — Error types
//! - [`mcp`] — MCP protocol implementation
//! - [`scene`] — Scene model, adapters and identifier resolution

pub mod config;
pub mod error;
pub mod mcp;
pub mod scene;
