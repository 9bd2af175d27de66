//! In-memory store — useful for testing and ephemeral sessions.

use async_trait::async_trait;
use learnmate_core::error::StoreError;
use learnmate_core::store::TurnStore;
use learnmate_core::turn::{NewTurn, PrincipalId, Role, TurnRecord};
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::RwLock;

/// An in-memory turn store backed by a Vec.
///
/// Ids come from an atomic sequence, so ordering semantics match the SQLite
/// backend: `(created_at, id)` ascending with id as the tie-breaker.
pub struct InMemoryStore {
    turns: Arc<RwLock<Vec<TurnRecord>>>,
    next_id: AtomicI64,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            turns: Arc::new(RwLock::new(Vec::new())),
            next_id: AtomicI64::new(1),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TurnStore for InMemoryStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn append(&self, turn: NewTurn) -> Result<TurnRecord, StoreError> {
        // Same role restriction the SQLite schema enforces with a CHECK.
        if turn.role == Role::System {
            return Err(StoreError::Storage(
                "only user and assistant turns are persisted".into(),
            ));
        }
        let record = TurnRecord {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            principal_id: turn.principal_id,
            role: turn.role,
            raw_content: turn.raw_content,
            created_at: turn.created_at,
        };
        self.turns.write().await.push(record.clone());
        Ok(record)
    }

    async fn list_for_principal(
        &self,
        principal_id: &PrincipalId,
    ) -> Result<Vec<TurnRecord>, StoreError> {
        let turns = self.turns.read().await;
        let mut results: Vec<TurnRecord> = turns
            .iter()
            .filter(|t| &t.principal_id == principal_id)
            .cloned()
            .collect();
        results.sort_by(|a, b| (a.created_at, a.id).cmp(&(b.created_at, b.id)));
        Ok(results)
    }

    async fn count(&self) -> Result<usize, StoreError> {
        Ok(self.turns.read().await.len())
    }
}
