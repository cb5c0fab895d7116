//! MCP protocol implementation.
//!
//! This module implements the line-delimited JSON-RPC style protocol for
//! exposing math and visualisation operations as tools. The server
//! communicates over stdio transport.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                        MCP Server                          │
//! │                                                            │
//! │   ┌─────────────┐    ┌─────────────┐    ┌─────────────┐   │
//! │   │  Transport  │───▶│   Engine    │───▶│   Service   │   │
//! │   │   (stdio)   │    │ (lifecycle) │    │ (provider)  │   │
//! │   └─────────────┘    └─────────────┘    └─────────────┘   │
//! │          │                  │                              │
//! │          ▼                  ▼                              │
//! │   ┌─────────────────────────────────────────────────┐     │
//! │   │           Message Codec (protocol.rs)           │     │
//! │   └─────────────────────────────────────────────────┘     │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Protocol Version
//!
//! This implementation targets MCP protocol version 2024-11-05.

pub mod protocol;
pub mod server;
pub mod transport;

pub use protocol::{Request, Response, PROTOCOL_VERSION};
pub use server::McpServer;
pub use transport::StdioTransport;
