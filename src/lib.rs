//! Memoria - Persistent Memory Manager over MCP
//!
//! A small persistence service exposing create/read/update/delete
//! operations over memory records (title + content) through the Model
//! Context Protocol.
//!
//! # Architecture
//!
//! The system is organized into a few layers:
//! - **Types**: Core data structures (MemoryRecord, MemoryId, MemoryUpdates)
//! - **Storage**: The libSQL-backed record store behind the `MemoryStore` trait
//! - **Resolver / Validation**: id-or-title lookup and pure request checks
//! - **MCP**: JSON-RPC 2.0 stdio server and the five tool implementations
//!
//! # Example
//!
//! ```ignore
//! use memoria_core::{LibsqlStorage, MemoryStore};
//!
//! #[tokio::main]
//! async fn main() -> memoria_core::Result<()> {
//!     let store = LibsqlStorage::in_memory().await?;
//!
//!     let record = store.create("Meeting Notes", "Discussed timeline").await?;
//!     let fetched = store.get_by_title("Meeting Notes").await?;
//!     assert_eq!(record.id, fetched.id);
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod mcp;
pub mod resolver;
pub mod storage;
pub mod types;
pub mod validation;

// Re-export commonly used types
pub use config::Settings;
pub use error::{MemoriaError, Result};
pub use mcp::{McpServer, ToolHandler};
pub use storage::{
    libsql::{ConnectionMode, LibsqlStorage},
    MemoryStore,
};
pub use types::{MemoryId, MemoryRecord, MemoryUpdates};
