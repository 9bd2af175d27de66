//! # Learnmate Engine
//!
//! The contract-enforcing dialogue engine. One chat exchange flows through:
//!
//! 1. [`history::reconstruct`] — rebuild the role-tagged dialogue from the
//!    turn store, collapsing past structured replies to their conversational
//!    message.
//! 2. [`prompt::assemble`] — one system instruction, the history in order,
//!    the new user turn last.
//! 3. The injected [`learnmate_core::Generator`] — the only long-latency
//!    step, bounded by a timeout.
//! 4. [`resolver::resolve`] — turn whatever text came back into a
//!    schema-complete [`learnmate_core::StructuredPlan`], never failing.
//! 5. Turn persistence — append the user and assistant turns as one logical
//!    exchange.
//!
//! [`exchange::ChatEngine`] wires these together and serializes exchanges
//! per principal.

pub mod exchange;
pub mod history;
pub mod prompt;
pub mod resolver;

pub use exchange::{ChatEngine, ExchangeError};
pub use prompt::{PROMPT_VERSION, SYSTEM_INSTRUCTION};
pub use resolver::{FALLBACK_MESSAGE, resolve};
