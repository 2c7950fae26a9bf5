//! MCP tool implementations
//!
//! Provides the five memory tools, each mapping 1:1 to a store operation:
//! `remember`, `get_memory`, `list_memories`, `update_memory`,
//! `delete_memory`. All stringly-typed argument handling lives at this
//! seam: incoming argument maps are converted into per-operation typed
//! structs before validation and the store are involved.

use crate::error::{MemoriaError, Result};
use crate::resolver;
use crate::storage::MemoryStore;
use crate::types::{MemoryId, MemoryUpdates};
use crate::validation;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

/// Tool schema definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tool {
    /// Tool name (e.g., "remember")
    pub name: String,

    /// Human-readable description
    pub description: String,

    /// JSON Schema for input parameters
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// Tool handler that dispatches to the record store
pub struct ToolHandler {
    store: Arc<dyn MemoryStore>,
}

/// Deserialize an argument map into a typed parameter struct, reporting
/// mismatches (wrong types, unexpected shapes) as validation errors.
fn parse_params<T: DeserializeOwned>(operation: &str, params: Value) -> Result<T> {
    serde_json::from_value(params).map_err(|e| {
        MemoriaError::Validation(format!("invalid arguments for {}: {}", operation, e))
    })
}

impl ToolHandler {
    /// Create a new tool handler backed by the given store
    pub fn new(store: Arc<dyn MemoryStore>) -> Self {
        Self { store }
    }

    /// Get list of all available tools
    pub fn list_tools(&self) -> Vec<Tool> {
        vec![
            Tool {
                name: "remember".to_string(),
                description: "Store a new memory.".to_string(),
                input_schema: serde_json::json!({
                    "type": "object",
                    "properties": {
                        "title": {
                            "type": "string",
                            "description": "A concise title for the memory"
                        },
                        "content": {
                            "type": "string",
                            "description": "The full content of the memory to store"
                        }
                    },
                    "required": ["title", "content"]
                }),
            },
            Tool {
                name: "get_memory".to_string(),
                description: "Retrieve a specific memory by ID or title (supply exactly one).".to_string(),
                input_schema: serde_json::json!({
                    "type": "object",
                    "properties": {
                        "memory_id": {
                            "type": "integer",
                            "description": "The ID of the memory to retrieve"
                        },
                        "title": {
                            "type": "string",
                            "description": "The title of the memory to retrieve"
                        }
                    }
                }),
            },
            Tool {
                name: "list_memories".to_string(),
                description: "List all stored memories in ascending ID order.".to_string(),
                input_schema: serde_json::json!({
                    "type": "object",
                    "properties": {
                        "limit": {
                            "type": "integer",
                            "description": "Maximum number of memories to return (all if omitted)"
                        },
                        "offset": {
                            "type": "integer",
                            "description": "Number of memories to skip from the front",
                            "default": 0
                        }
                    }
                }),
            },
            Tool {
                name: "update_memory".to_string(),
                description: "Update an existing memory's title and/or content.".to_string(),
                input_schema: serde_json::json!({
                    "type": "object",
                    "properties": {
                        "memory_id": {
                            "type": "integer",
                            "description": "The ID of the memory to update"
                        },
                        "title": {
                            "type": "string",
                            "description": "Optional new title for the memory"
                        },
                        "content": {
                            "type": "string",
                            "description": "Optional new content for the memory"
                        }
                    },
                    "required": ["memory_id"]
                }),
            },
            Tool {
                name: "delete_memory".to_string(),
                description: "Delete a memory permanently.".to_string(),
                input_schema: serde_json::json!({
                    "type": "object",
                    "properties": {
                        "memory_id": {
                            "type": "integer",
                            "description": "The ID of the memory to delete"
                        }
                    },
                    "required": ["memory_id"]
                }),
            },
        ]
    }

    /// Execute a tool call
    pub async fn execute(&self, tool_name: &str, params: Value) -> Result<Value> {
        debug!("Executing tool: {}", tool_name);

        match tool_name {
            "remember" => self.remember(params).await,
            "get_memory" => self.get_memory(params).await,
            "list_memories" => self.list_memories(params).await,
            "update_memory" => self.update_memory(params).await,
            "delete_memory" => self.delete_memory(params).await,
            _ => {
                warn!("Unknown tool: {}", tool_name);
                Err(MemoriaError::InvalidArguments(format!(
                    "unknown tool: {}",
                    tool_name
                )))
            }
        }
    }

    async fn remember(&self, params: Value) -> Result<Value> {
        #[derive(Deserialize)]
        struct RememberParams {
            title: Option<String>,
            content: Option<String>,
        }

        let params: RememberParams = parse_params("remember", params)?;
        let request = validation::validate_remember(params.title, params.content)?;

        let record = self.store.create(&request.title, &request.content).await?;

        Ok(serde_json::json!({
            "memory": record,
            "message": format!("Memory stored successfully with ID: {}.", record.id)
        }))
    }

    async fn get_memory(&self, params: Value) -> Result<Value> {
        #[derive(Deserialize)]
        struct GetParams {
            memory_id: Option<i64>,
            title: Option<String>,
        }

        let params: GetParams = parse_params("get_memory", params)?;

        let record = resolver::resolve(
            self.store.as_ref(),
            params.memory_id.map(MemoryId),
            params.title.as_deref(),
        )
        .await?;

        Ok(serde_json::json!({ "memory": record }))
    }

    async fn list_memories(&self, params: Value) -> Result<Value> {
        #[derive(Deserialize)]
        struct ListParams {
            limit: Option<u32>,
            offset: Option<u32>,
        }

        // list_memories historically takes no arguments; treat null as
        // the empty object.
        let params: ListParams = if params.is_null() {
            ListParams {
                limit: None,
                offset: None,
            }
        } else {
            parse_params("list_memories", params)?
        };

        let records = self
            .store
            .list(params.limit, params.offset.unwrap_or(0))
            .await?;
        let count = records.len();

        Ok(serde_json::json!({
            "memories": records,
            "count": count
        }))
    }

    async fn update_memory(&self, params: Value) -> Result<Value> {
        #[derive(Deserialize)]
        struct UpdateParams {
            memory_id: Option<i64>,
            title: Option<String>,
            content: Option<String>,
        }

        let params: UpdateParams = parse_params("update_memory", params)?;

        let id = params
            .memory_id
            .map(MemoryId)
            .ok_or_else(|| {
                MemoriaError::Validation("missing required field: memory_id".to_string())
            })?;

        let updates = validation::validate_update(MemoryUpdates {
            title: params.title,
            content: params.content,
        })?;

        let record = self.store.update(id, updates).await?;

        Ok(serde_json::json!({
            "memory": record,
            "message": format!("Memory {} updated successfully.", record.id)
        }))
    }

    async fn delete_memory(&self, params: Value) -> Result<Value> {
        #[derive(Deserialize)]
        struct DeleteParams {
            memory_id: Option<i64>,
        }

        let params: DeleteParams = parse_params("delete_memory", params)?;

        let id = params
            .memory_id
            .map(MemoryId)
            .ok_or_else(|| {
                MemoriaError::Validation("missing required field: memory_id".to_string())
            })?;

        self.store.delete(id).await?;

        Ok(serde_json::json!({
            "memory_id": id,
            "message": format!("Memory {} deleted successfully.", id)
        }))
    }
}
