//! Storage layer for the Memoria memory manager
//!
//! Provides the abstraction and libSQL-backed implementation for durable
//! persistence of memory records.

pub mod libsql;

use crate::error::Result;
use crate::types::{MemoryId, MemoryRecord, MemoryUpdates};
use async_trait::async_trait;

/// Storage backend trait defining all required record operations
///
/// The store owns all persisted state: every component reads and writes
/// records exclusively through these operations, on an explicitly
/// constructed instance. Each write commits durably before returning.
#[async_trait]
pub trait MemoryStore: Send + Sync {
    /// Insert a new record, assigning its id and stamping both timestamps
    /// to the same instant. Fails with `DuplicateTitle` if a record with
    /// the same title exists, or `Validation` if the title is blank.
    async fn create(&self, title: &str, content: &str) -> Result<MemoryRecord>;

    /// Retrieve a record by id
    async fn get_by_id(&self, id: MemoryId) -> Result<MemoryRecord>;

    /// Retrieve a record by exact title match
    async fn get_by_title(&self, title: &str) -> Result<MemoryRecord>;

    /// List records in ascending id order. No limit returns all records;
    /// offset skips from the front either way.
    async fn list(&self, limit: Option<u32>, offset: u32) -> Result<Vec<MemoryRecord>>;

    /// Apply a partial update; unset fields are left unchanged.
    /// `updated_at` is refreshed only when the update succeeds. Renaming
    /// onto a different record's title fails with `DuplicateTitle`.
    async fn update(&self, id: MemoryId, updates: MemoryUpdates) -> Result<MemoryRecord>;

    /// Permanently remove a record. Deleting an id that no longer exists
    /// fails with `NotFound` rather than silently succeeding.
    async fn delete(&self, id: MemoryId) -> Result<()>;

    /// Total number of stored records
    async fn count(&self) -> Result<u64>;
}
