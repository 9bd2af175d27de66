//! # Learnmate Core
//!
//! Domain types, traits, and error definitions for the Learnmate learning-plan
//! dialogue engine. This crate has **zero framework dependencies** — it defines
//! the domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every subsystem boundary is a trait here: the turn store and the text
//! generation backend. Implementations live in their respective crates. This
//! enables:
//! - Swapping implementations via configuration
//! - Deterministic fakes in tests instead of live backends
//! - Clean dependency graph (all crates depend inward on core)

pub mod error;
pub mod generator;
pub mod plan;
pub mod store;
pub mod turn;

// Re-export key types at crate root for ergonomics
pub use error::{GeneratorError, StoreError};
pub use generator::{GenerationRequest, Generator, PromptMessage};
pub use plan::StructuredPlan;
pub use store::TurnStore;
pub use turn::{NewTurn, PrincipalId, Role, TurnRecord};
