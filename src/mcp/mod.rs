//! Model Context Protocol server interface
//!
//! JSON-RPC 2.0 over stdio: protocol types, the server loop, and the
//! tool handler that dispatches the five memory operations.

pub mod protocol;
pub mod server;
pub mod tools;

pub use server::McpServer;
pub use tools::ToolHandler;
