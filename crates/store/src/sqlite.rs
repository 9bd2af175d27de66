//! SQLite turn store.
//!
//! One `turns` table; `iid` (INTEGER PRIMARY KEY AUTOINCREMENT) is the
//! monotonic turn id the ordering invariant relies on, so reconstruction
//! order is never an artifact of storage behavior. Appends are single
//! INSERTs and therefore atomic per record.

use async_trait::async_trait;
use chrono::Utc;
use learnmate_core::error::StoreError;
use learnmate_core::store::TurnStore;
use learnmate_core::turn::{NewTurn, PrincipalId, Role, TurnRecord};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use tracing::{debug, info};

/// A durable SQLite turn store.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Create a new SQLite store from a file path.
    ///
    /// The database and schema are created automatically.
    pub async fn new(path: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(path)
            .map_err(|e| StoreError::Storage(format!("Invalid SQLite path: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .pragma("foreign_keys", "ON");

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(|e| StoreError::Storage(format!("Failed to open SQLite: {e}")))?;

        let store = Self { pool };
        store.run_migrations().await?;
        info!("SQLite turn store initialized at {path}");
        Ok(store)
    }

    /// Create from an existing pool (useful for testing).
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, StoreError> {
        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    async fn run_migrations(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS turns (
                iid          INTEGER PRIMARY KEY AUTOINCREMENT,
                principal_id TEXT NOT NULL,
                role         TEXT NOT NULL CHECK (role IN ('user', 'assistant')),
                raw_content  TEXT NOT NULL,
                created_at   TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::MigrationFailed(format!("turns table: {e}")))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_turns_principal_order
             ON turns(principal_id, created_at, iid)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::MigrationFailed(format!("ordering index: {e}")))?;

        debug!("SQLite migrations complete");
        Ok(())
    }

    fn row_to_record(row: &sqlx::sqlite::SqliteRow) -> Result<TurnRecord, StoreError> {
        let id: i64 = row
            .try_get("iid")
            .map_err(|e| StoreError::QueryFailed(format!("iid column: {e}")))?;
        let principal_id: String = row
            .try_get("principal_id")
            .map_err(|e| StoreError::QueryFailed(format!("principal_id column: {e}")))?;
        let role_str: String = row
            .try_get("role")
            .map_err(|e| StoreError::QueryFailed(format!("role column: {e}")))?;
        let raw_content: String = row
            .try_get("raw_content")
            .map_err(|e| StoreError::QueryFailed(format!("raw_content column: {e}")))?;
        let created_at_str: String = row
            .try_get("created_at")
            .map_err(|e| StoreError::QueryFailed(format!("created_at column: {e}")))?;

        let role = Role::from_str(&role_str)
            .map_err(|e| StoreError::QueryFailed(format!("role column: {e}")))?;

        let created_at = chrono::DateTime::parse_from_rfc3339(&created_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| StoreError::QueryFailed(format!("created_at column: {e}")))?;

        Ok(TurnRecord {
            id,
            principal_id: PrincipalId(principal_id),
            role,
            raw_content,
            created_at,
        })
    }
}

#[async_trait]
impl TurnStore for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn append(&self, turn: NewTurn) -> Result<TurnRecord, StoreError> {
        let result = sqlx::query(
            "INSERT INTO turns (principal_id, role, raw_content, created_at)
             VALUES (?, ?, ?, ?)",
        )
        .bind(turn.principal_id.as_str())
        .bind(turn.role.as_str())
        .bind(&turn.raw_content)
        .bind(turn.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Storage(format!("append failed: {e}")))?;

        Ok(TurnRecord {
            id: result.last_insert_rowid(),
            principal_id: turn.principal_id,
            role: turn.role,
            raw_content: turn.raw_content,
            created_at: turn.created_at,
        })
    }

    async fn list_for_principal(
        &self,
        principal_id: &PrincipalId,
    ) -> Result<Vec<TurnRecord>, StoreError> {
        let rows = sqlx::query(
            "SELECT iid, principal_id, role, raw_content, created_at
             FROM turns
             WHERE principal_id = ?
             ORDER BY created_at ASC, iid ASC",
        )
        .bind(principal_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::QueryFailed(format!("list failed: {e}")))?;

        rows.iter().map(Self::row_to_record).collect()
    }

    async fn count(&self) -> Result<usize, StoreError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM turns")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StoreError::QueryFailed(format!("count failed: {e}")))?;
        let n: i64 = row
            .try_get("n")
            .map_err(|e| StoreError::QueryFailed(format!("count column: {e}")))?;
        Ok(n as usize)
    }
}
