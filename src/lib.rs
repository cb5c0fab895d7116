//! mathviz-mcp: MCP gateway server for mathematics and data visualisation
//!
//! This library exposes mathematical problem solving and SVG chart
//! generation as MCP tools over a line-delimited JSON-RPC style protocol
//! on stdio.
//!
//! # Architecture
//!
//! The protocol engine is strictly separated from the tool providers:
//!
//! - **Codec + Transport + Engine** ([`mcp`]) — message framing, the
//!   initialize/ready session state machine, method dispatch, and the error
//!   response contract
//! - **Provider contract** ([`service`]) — the trait the engine consumes;
//!   the gateway provider registers every tool in an immutable startup-time
//!   registry
//! - **Backends** ([`solver`], [`charts`], [`expr`]) — the synchronous
//!   compute routines the gateway delegates to
//!
//! # Modules
//!
//! - [`charts`] — SVG chart rendering
//! - [`config`] — Configuration loading and validation
//! - [`error`] — Error types
//! - [`expr`] — Arithmetic expression parsing and evaluation
//! - [`mcp`] — MCP protocol implementation
//! - [`service`] — Provider contract and the gateway service
//! - [`solver`] — Math operations with step-by-step explanations

pub mod charts;
pub mod config;
pub mod error;
pub mod expr;
pub mod mcp;
pub mod service;
pub mod solver;
