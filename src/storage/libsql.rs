//! LibSQL storage backend implementation
//!
//! Provides persistent storage for memory records using libSQL with
//! one short-lived transaction per write, an idempotent migration runner,
//! and engine-error mapping into the application error kinds.

use crate::error::{MemoriaError, Result};
use crate::storage::MemoryStore;
use crate::types::{MemoryId, MemoryRecord, MemoryUpdates};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use libsql::{params, Builder, Connection, Database};
use tracing::{debug, info};

/// Schema migrations, applied in order and tracked in `_migrations_applied`.
/// Embedded at compile time so the binary stays relocatable.
const MIGRATIONS: &[(&str, &str)] = &[(
    "001_initial_schema.sql",
    include_str!("../../migrations/001_initial_schema.sql"),
)];

/// Split a migration file into executable statements, dropping
/// comment-only fragments.
fn parse_sql_statements(sql: &str) -> Vec<String> {
    sql.split(';')
        .map(str::trim)
        .filter(|stmt| {
            stmt.lines()
                .map(str::trim)
                .any(|line| !line.is_empty() && !line.starts_with("--"))
        })
        .map(|stmt| stmt.to_string())
        .collect()
}

/// Database connection mode
#[derive(Debug, Clone)]
pub enum ConnectionMode {
    /// Local file-based database
    Local(String),
    /// In-memory database (for testing)
    InMemory,
}

/// LibSQL storage backend
#[derive(Debug)]
pub struct LibsqlStorage {
    db: Database,
}

impl LibsqlStorage {
    /// Validate a database file before opening
    ///
    /// Checks the file exists (when required) and carries the SQLite
    /// header, so corruption is reported up front with an actionable
    /// message instead of a raw engine error later.
    ///
    /// Returns `Ok(true)` if the file exists and is valid, `Ok(false)` if
    /// it does not exist and `must_exist` is false.
    fn validate_database_file(db_path: &str, must_exist: bool) -> Result<bool> {
        use std::path::Path;

        let path = Path::new(db_path);

        if !path.exists() {
            if must_exist {
                return Err(MemoriaError::Database(format!(
                    "Database file not found at '{}'. Run 'memoria init' first or check your configuration.",
                    db_path
                )));
            }
            return Ok(false);
        }

        // SQLite files start with "SQLite format 3\0" (16 bytes). A
        // zero-length file is also fine: SQLite treats it as a fresh
        // database.
        let bytes = std::fs::read(path).map_err(|e| {
            MemoriaError::Database(format!(
                "Cannot read database file at '{}': {}. The file may be corrupted or inaccessible.",
                db_path, e
            ))
        })?;

        if bytes.is_empty() {
            return Ok(true);
        }

        if bytes.len() < 16 || &bytes[0..16] != b"SQLite format 3\0" {
            return Err(MemoriaError::Database(format!(
                "Database file at '{}' is corrupted or not a valid SQLite database. Delete it and run 'memoria init' to reinitialize.",
                db_path
            )));
        }

        debug!("Database file validation passed: {}", db_path);
        Ok(true)
    }

    /// Create a new libSQL storage backend with validation
    ///
    /// # Arguments
    /// * `mode` - Connection mode (local file or in-memory)
    /// * `create_if_missing` - If true, create the database when absent.
    ///   If false, error on a missing database file.
    pub async fn new_with_validation(mode: ConnectionMode, create_if_missing: bool) -> Result<Self> {
        debug!(
            "Connecting to libSQL database: {:?} (create_if_missing: {})",
            mode, create_if_missing
        );

        let db = match mode {
            ConnectionMode::Local(ref path) => {
                Self::validate_database_file(path, !create_if_missing)?;

                if create_if_missing {
                    if let Some(parent) = std::path::Path::new(path).parent() {
                        std::fs::create_dir_all(parent).map_err(|e| {
                            MemoriaError::Database(format!(
                                "Failed to create database directory {}: {}",
                                parent.display(),
                                e
                            ))
                        })?;
                    }
                }

                Builder::new_local(path).build().await.map_err(|e| {
                    MemoriaError::Database(format!("Failed to open local database: {}", e))
                })?
            }
            ConnectionMode::InMemory => Builder::new_local(":memory:")
                .build()
                .await
                .map_err(|e| {
                    MemoriaError::Database(format!("Failed to create in-memory database: {}", e))
                })?,
        };

        let storage = Self { db };

        storage.verify_database_health().await?;
        storage.run_migrations().await?;

        debug!("LibSQL storage ready");
        Ok(storage)
    }

    /// Create a storage backend that requires the database to exist
    pub async fn new(mode: ConnectionMode) -> Result<Self> {
        Self::new_with_validation(mode, false).await
    }

    /// Create an in-memory storage backend (convenience for tests)
    pub async fn in_memory() -> Result<Self> {
        Self::new_with_validation(ConnectionMode::InMemory, true).await
    }

    /// Verify the database answers a basic query before use
    async fn verify_database_health(&self) -> Result<()> {
        let conn = self.get_conn()?;
        conn.query("SELECT 1", params![]).await.map_err(|e| {
            MemoriaError::Database(format!(
                "Database corruption detected or invalid database file: {}",
                e
            ))
        })?;
        Ok(())
    }

    /// Run pending schema migrations
    ///
    /// Idempotent: applied migrations are recorded in
    /// `_migrations_applied` and skipped on subsequent startups.
    pub async fn run_migrations(&self) -> Result<()> {
        let conn = self.get_conn()?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS _migrations_applied (
                migration_name TEXT PRIMARY KEY,
                applied_at INTEGER NOT NULL
            )",
            params![],
        )
        .await
        .map_err(|e| {
            MemoriaError::Database(format!("Failed to create migrations table: {}", e))
        })?;

        for (name, sql) in MIGRATIONS {
            let mut rows = conn
                .query(
                    "SELECT COUNT(*) FROM _migrations_applied WHERE migration_name = ?",
                    params![*name],
                )
                .await?;

            let already_applied = match rows.next().await? {
                Some(row) => row.get::<i64>(0).unwrap_or(0) > 0,
                None => false,
            };

            if already_applied {
                debug!("Skipping already applied migration: {}", name);
                continue;
            }

            for statement in parse_sql_statements(sql) {
                conn.execute(&statement, params![]).await.map_err(|e| {
                    MemoriaError::Database(format!(
                        "Failed to execute migration {}: {}",
                        name, e
                    ))
                })?;
            }

            conn.execute(
                "INSERT INTO _migrations_applied (migration_name, applied_at) VALUES (?, ?)",
                params![*name, Utc::now().timestamp()],
            )
            .await
            .map_err(|e| MemoriaError::Database(format!("Failed to record migration: {}", e)))?;

            info!("Applied migration: {}", name);
        }

        Ok(())
    }

    /// Get a connection from the database
    fn get_conn(&self) -> Result<Connection> {
        self.db
            .connect()
            .map_err(|e| MemoriaError::Database(format!("Failed to get connection: {}", e)))
    }

    /// Convert a libsql row (id, title, content, created_at, updated_at)
    /// into a MemoryRecord
    fn row_to_record(row: &libsql::Row) -> Result<MemoryRecord> {
        let id: i64 = row.get(0)?;
        let title: String = row.get(1)?;
        let content: String = row.get(2)?;

        let created_at: String = row.get(3)?;
        let created_at = Self::parse_timestamp(&created_at)?;

        let updated_at: String = row.get(4)?;
        let updated_at = Self::parse_timestamp(&updated_at)?;

        Ok(MemoryRecord {
            id: MemoryId(id),
            title,
            content,
            created_at,
            updated_at,
        })
    }

    fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(value)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| MemoriaError::Database(format!("Invalid timestamp in row: {}", e)))
    }

    /// Map a write error, recognizing the title uniqueness constraint
    fn map_write_error(e: libsql::Error, title: &str) -> MemoriaError {
        let msg = e.to_string();
        if msg.contains("UNIQUE constraint failed: memories.title") {
            MemoriaError::DuplicateTitle(title.to_string())
        } else {
            MemoriaError::Database(msg)
        }
    }

    /// Classify a commit failure into an actionable message
    fn classify_commit_error(e: libsql::Error) -> MemoriaError {
        let msg = e.to_string();
        if msg.contains("readonly") || msg.contains("permission") {
            MemoriaError::Database(
                "Transaction failed: database is read-only. Ensure the file and WAL files have write permissions.".to_string(),
            )
        } else if msg.contains("locked") || msg.contains("busy") {
            MemoriaError::Database(
                "Transaction failed: database is locked. Another process may be writing.".to_string(),
            )
        } else {
            MemoriaError::Database(format!("Transaction commit failed: {}", msg))
        }
    }
}

#[async_trait]
impl MemoryStore for LibsqlStorage {
    async fn create(&self, title: &str, content: &str) -> Result<MemoryRecord> {
        if title.trim().is_empty() {
            return Err(MemoriaError::Validation(
                "title must be a non-empty string".to_string(),
            ));
        }

        debug!("Creating memory: {}", title);

        let conn = self.get_conn()?;
        let tx = conn.transaction().await?;

        // Pre-check inside the write transaction so concurrent writers
        // cannot race the uniqueness invariant; the UNIQUE constraint on
        // the column is the engine-level backstop.
        let mut rows = tx
            .query(
                "SELECT id FROM memories WHERE title = ?",
                params![title.to_string()],
            )
            .await?;

        if rows.next().await?.is_some() {
            tx.rollback().await?;
            return Err(MemoriaError::DuplicateTitle(title.to_string()));
        }

        let now = Utc::now();
        tx.execute(
            "INSERT INTO memories (title, content, created_at, updated_at)
             VALUES (?, ?, ?, ?)",
            params![
                title.to_string(),
                content.to_string(),
                now.to_rfc3339(),
                now.to_rfc3339()
            ],
        )
        .await
        .map_err(|e| Self::map_write_error(e, title))?;

        let id = tx.last_insert_rowid();
        tx.commit().await.map_err(Self::classify_commit_error)?;

        debug!("Memory created with id {}", id);

        Ok(MemoryRecord {
            id: MemoryId(id),
            title: title.to_string(),
            content: content.to_string(),
            created_at: now,
            updated_at: now,
        })
    }

    async fn get_by_id(&self, id: MemoryId) -> Result<MemoryRecord> {
        debug!("Fetching memory by id: {}", id);

        let conn = self.get_conn()?;
        let mut rows = conn
            .query(
                "SELECT id, title, content, created_at, updated_at FROM memories WHERE id = ?",
                params![id.as_i64()],
            )
            .await?;

        let row = rows
            .next()
            .await?
            .ok_or_else(|| MemoriaError::NotFound(format!("id {}", id)))?;

        Self::row_to_record(&row)
    }

    async fn get_by_title(&self, title: &str) -> Result<MemoryRecord> {
        debug!("Fetching memory by title: {}", title);

        let conn = self.get_conn()?;
        let mut rows = conn
            .query(
                "SELECT id, title, content, created_at, updated_at FROM memories WHERE title = ?",
                params![title.to_string()],
            )
            .await?;

        let row = rows
            .next()
            .await?
            .ok_or_else(|| MemoriaError::NotFound(format!("title '{}'", title)))?;

        Self::row_to_record(&row)
    }

    async fn list(&self, limit: Option<u32>, offset: u32) -> Result<Vec<MemoryRecord>> {
        debug!("Listing memories (limit: {:?}, offset: {})", limit, offset);

        let conn = self.get_conn()?;

        // SQLite treats LIMIT -1 as unbounded, which keeps one query shape
        // for both the paginated and the list-everything case.
        let limit = limit.map(i64::from).unwrap_or(-1);

        let mut rows = conn
            .query(
                "SELECT id, title, content, created_at, updated_at FROM memories
                 ORDER BY id ASC LIMIT ? OFFSET ?",
                params![limit, i64::from(offset)],
            )
            .await?;

        let mut records = Vec::new();
        while let Some(row) = rows.next().await? {
            records.push(Self::row_to_record(&row)?);
        }

        debug!("Listed {} memories", records.len());
        Ok(records)
    }

    async fn update(&self, id: MemoryId, updates: MemoryUpdates) -> Result<MemoryRecord> {
        if updates.is_empty() {
            return Err(MemoriaError::Validation(
                "provide at least one field to update (title or content)".to_string(),
            ));
        }

        if let Some(title) = &updates.title {
            if title.trim().is_empty() {
                return Err(MemoriaError::Validation(
                    "title must be a non-empty string".to_string(),
                ));
            }
        }

        debug!("Updating memory: {}", id);

        let conn = self.get_conn()?;
        let tx = conn.transaction().await?;

        let mut rows = tx
            .query(
                "SELECT id, title, content, created_at, updated_at FROM memories WHERE id = ?",
                params![id.as_i64()],
            )
            .await?;

        let row = match rows.next().await? {
            Some(row) => row,
            None => {
                tx.rollback().await?;
                return Err(MemoriaError::NotFound(format!("id {}", id)));
            }
        };
        let existing = Self::row_to_record(&row)?;

        // Renaming onto another record's title is a conflict; renaming a
        // record onto its own title is not.
        if let Some(title) = &updates.title {
            let mut rows = tx
                .query(
                    "SELECT id FROM memories WHERE title = ? AND id != ?",
                    params![title.to_string(), id.as_i64()],
                )
                .await?;

            if rows.next().await?.is_some() {
                tx.rollback().await?;
                return Err(MemoriaError::DuplicateTitle(title.to_string()));
            }
        }

        let title = updates.title.unwrap_or(existing.title);
        let content = updates.content.unwrap_or(existing.content);
        let now = Utc::now();

        tx.execute(
            "UPDATE memories SET title = ?, content = ?, updated_at = ? WHERE id = ?",
            params![
                title.clone(),
                content.clone(),
                now.to_rfc3339(),
                id.as_i64()
            ],
        )
        .await
        .map_err(|e| Self::map_write_error(e, &title))?;

        tx.commit().await.map_err(Self::classify_commit_error)?;

        debug!("Memory {} updated", id);

        Ok(MemoryRecord {
            id,
            title,
            content,
            created_at: existing.created_at,
            updated_at: now,
        })
    }

    async fn delete(&self, id: MemoryId) -> Result<()> {
        debug!("Deleting memory: {}", id);

        let conn = self.get_conn()?;
        let affected = conn
            .execute("DELETE FROM memories WHERE id = ?", params![id.as_i64()])
            .await?;

        if affected == 0 {
            return Err(MemoriaError::NotFound(format!("id {}", id)));
        }

        debug!("Memory {} deleted", id);
        Ok(())
    }

    async fn count(&self) -> Result<u64> {
        let conn = self.get_conn()?;
        let mut rows = conn.query("SELECT COUNT(*) FROM memories", params![]).await?;

        match rows.next().await? {
            Some(row) => {
                let count: i64 = row.get(0)?;
                Ok(count as u64)
            }
            None => Ok(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sql_statements_drops_comments() {
        let sql = "-- leading comment\nCREATE TABLE a (x INTEGER);\n\n-- trailing comment\n";
        let statements = parse_sql_statements(sql);
        assert_eq!(statements.len(), 1);
        assert!(statements[0].contains("CREATE TABLE a"));
    }

    #[test]
    fn test_parse_sql_statements_multiple() {
        let sql = "CREATE TABLE a (x INTEGER);\nCREATE INDEX idx_a ON a(x);";
        let statements = parse_sql_statements(sql);
        assert_eq!(statements.len(), 2);
    }

    #[test]
    fn test_validate_rejects_non_sqlite_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bogus.db");
        std::fs::write(&path, b"definitely not a database file, far too long").unwrap();

        let result =
            LibsqlStorage::validate_database_file(path.to_str().unwrap(), true);
        assert!(matches!(result, Err(MemoriaError::Database(_))));
    }

    #[test]
    fn test_validate_missing_file() {
        let result = LibsqlStorage::validate_database_file("/nonexistent/memoria.db", true);
        assert!(matches!(result, Err(MemoriaError::Database(_))));

        let result = LibsqlStorage::validate_database_file("/nonexistent/memoria.db", false);
        assert!(matches!(result, Ok(false)));
    }

    #[tokio::test]
    async fn test_migrations_are_idempotent() {
        let storage = LibsqlStorage::in_memory().await.unwrap();
        // Running migrations again on the same database is a no-op.
        storage.run_migrations().await.unwrap();
        assert_eq!(storage.count().await.unwrap(), 0);
    }
}
