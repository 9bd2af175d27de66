//! TurnStore trait — the append-only ordered record of dialogue turns.
//!
//! The store is the only shared mutable resource in the system. All mutation
//! goes through `append`, which must be atomic per record. Turns are never
//! rewritten or reordered after commit; retention/expiry is an external
//! concern.

use crate::error::StoreError;
use crate::turn::{NewTurn, PrincipalId, TurnRecord};
use async_trait::async_trait;

/// The core TurnStore trait.
///
/// Implementations: SQLite (durable), in-memory (tests and ephemeral
/// sessions). Listing must return turns ordered by `(created_at, id)`
/// ascending regardless of physical insertion order, so reconstruction
/// ordering is a provable invariant rather than a storage artifact.
#[async_trait]
pub trait TurnStore: Send + Sync {
    /// The backend name (e.g., "sqlite", "in_memory").
    fn name(&self) -> &str;

    /// Durably append one turn, assigning its monotonic id.
    async fn append(&self, turn: NewTurn) -> Result<TurnRecord, StoreError>;

    /// All turns for a principal, ordered by `(created_at, id)` ascending.
    async fn list_for_principal(
        &self,
        principal_id: &PrincipalId,
    ) -> Result<Vec<TurnRecord>, StoreError>;

    /// Total turn count across all principals.
    async fn count(&self) -> Result<usize, StoreError>;
}
