//! The chat exchange pipeline.
//!
//! Read history, generate, resolve, persist — serialized per principal so
//! that two concurrent exchanges for the same identity can never interleave
//! their history read and turn writes (the lost-update race). Exchanges for
//! different principals share no lock and proceed independently.

use crate::{history, prompt, resolver};
use learnmate_core::error::{GeneratorError, StoreError};
use learnmate_core::generator::{GenerationRequest, Generator, default_temperature};
use learnmate_core::plan::StructuredPlan;
use learnmate_core::store::TurnStore;
use learnmate_core::turn::{NewTurn, PrincipalId};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Caller-facing failures of a chat exchange.
///
/// Format errors never appear here: the resolver recovers them internally.
#[derive(Debug, Error)]
pub enum ExchangeError {
    /// The generation capability was never configured. Fatal for this
    /// request, not retryable, does not corrupt stored state.
    #[error("Generation backend not configured: {0}")]
    NotConfigured(String),

    /// The generation call failed or timed out. Retryable; no turn was
    /// committed for the exchange.
    #[error("Generation failed: {0}")]
    Upstream(#[source] GeneratorError),

    /// A turn store append failed. See [`ChatEngine::exchange`] for the
    /// resulting state.
    #[error("Turn store failure: {0}")]
    Persistence(#[from] StoreError),
}

impl From<GeneratorError> for ExchangeError {
    fn from(err: GeneratorError) -> Self {
        match err {
            GeneratorError::NotConfigured(reason) => ExchangeError::NotConfigured(reason),
            other => ExchangeError::Upstream(other),
        }
    }
}

/// The dialogue engine: one instance serves all principals.
///
/// Both collaborators are injected capabilities, so tests substitute
/// deterministic fakes for the generator and an in-memory turn store.
pub struct ChatEngine {
    generator: Arc<dyn Generator>,
    store: Arc<dyn TurnStore>,
    temperature: f32,
    max_output_tokens: Option<u32>,
    timeout: Duration,
    /// Per-principal serialization points, created lazily.
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl ChatEngine {
    pub fn new(generator: Arc<dyn Generator>, store: Arc<dyn TurnStore>) -> Self {
        Self {
            generator,
            store,
            temperature: default_temperature(),
            max_output_tokens: None,
            timeout: DEFAULT_TIMEOUT,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the max tokens per completion.
    pub fn with_max_output_tokens(mut self, max: u32) -> Self {
        self.max_output_tokens = Some(max);
        self
    }

    /// Set the generation deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn principal_lock(&self, principal_id: &PrincipalId) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks
            .entry(principal_id.as_str().to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Drop a principal's lock entry once no other exchange holds a handle
    /// to it, so the map stays bounded by in-flight principals rather than
    /// every principal ever seen.
    async fn prune_principal_lock(&self, principal_id: &PrincipalId, lock: &Arc<Mutex<()>>) {
        let mut locks = self.locks.lock().await;
        // Two strong handles: the map entry and ours. The outer map mutex
        // keeps anyone from cloning a third while we check.
        if Arc::strong_count(lock) == 2 {
            locks.remove(principal_id.as_str());
        }
    }

    /// Run one chat exchange for a principal.
    ///
    /// Pipeline: reconstruct history → assemble prompt → generate under the
    /// configured deadline → resolve → commit the user turn, then the
    /// assistant turn (raw, unparsed) as one logical exchange.
    ///
    /// Orphaned-turn policy: the user turn is appended first. If the
    /// assistant append then fails, the user turn is **retained** and a
    /// persistence error is surfaced; reconstruction tolerates the lone
    /// trailing user turn, so the conversation continues with a gap rather
    /// than silently dropping the user's words. Generation failures and
    /// timeouts commit nothing.
    pub async fn exchange(
        &self,
        principal_id: &PrincipalId,
        new_message: &str,
    ) -> Result<StructuredPlan, ExchangeError> {
        let lock = self.principal_lock(principal_id).await;
        let guard = lock.lock().await;
        let result = self.run_exchange(principal_id, new_message).await;
        drop(guard);
        self.prune_principal_lock(principal_id, &lock).await;
        result
    }

    async fn run_exchange(
        &self,
        principal_id: &PrincipalId,
        new_message: &str,
    ) -> Result<StructuredPlan, ExchangeError> {
        let turns = self.store.list_for_principal(principal_id).await?;
        let dialogue = history::reconstruct(&turns);
        info!(
            principal = %principal_id,
            prior_turns = turns.len(),
            "Processing chat exchange"
        );

        let messages = prompt::assemble(prompt::SYSTEM_INSTRUCTION, &dialogue, new_message);
        let request = GenerationRequest {
            messages,
            temperature: self.temperature,
            max_output_tokens: self.max_output_tokens,
        };

        let raw = match tokio::time::timeout(self.timeout, self.generator.complete(request)).await
        {
            Ok(result) => result?,
            Err(_) => {
                warn!(principal = %principal_id, timeout_secs = self.timeout.as_secs(), "Generation timed out");
                return Err(GeneratorError::Timeout(format!(
                    "no completion within {}s",
                    self.timeout.as_secs()
                ))
                .into());
            }
        };

        let plan = resolver::resolve(&raw);
        debug!(
            principal = %principal_id,
            message_only = plan.is_message_only(),
            "Resolved completion"
        );

        self.store
            .append(NewTurn::user(principal_id.clone(), new_message))
            .await?;
        self.store
            .append(NewTurn::assistant(principal_id.clone(), raw))
            .await?;

        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use learnmate_core::turn::{Role, TurnRecord};
    use learnmate_store::InMemoryStore;

    /// A fake generator with a fixed response, optional latency, and a
    /// captured log of every request it received.
    struct FakeGenerator {
        response: Result<String, GeneratorError>,
        delay: Option<Duration>,
        requests: Mutex<Vec<GenerationRequest>>,
    }

    impl FakeGenerator {
        fn replying(response: &str) -> Self {
            Self {
                response: Ok(response.into()),
                delay: None,
                requests: Mutex::new(Vec::new()),
            }
        }

        fn failing(err: GeneratorError) -> Self {
            Self {
                response: Err(err),
                delay: None,
                requests: Mutex::new(Vec::new()),
            }
        }

        fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }
    }

    #[async_trait::async_trait]
    impl Generator for FakeGenerator {
        fn name(&self) -> &str {
            "fake"
        }

        async fn complete(&self, request: GenerationRequest) -> Result<String, GeneratorError> {
            self.requests.lock().await.push(request);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.response.clone()
        }
    }

    const PLAN_JSON: &str = r#"{"message":"Here is your 7-day Python plan","checklist":["Install Python"],"roadmap":["Syntax","Projects"],"schedule":["Day 1: basics"],"resources":["https://docs.python.org/3"]}"#;

    fn engine(generator: Arc<dyn Generator>, store: Arc<dyn TurnStore>) -> ChatEngine {
        ChatEngine::new(generator, store)
    }

    #[tokio::test]
    async fn well_formed_completion_produces_full_plan() {
        let generator = Arc::new(FakeGenerator::replying(PLAN_JSON));
        let store = Arc::new(InMemoryStore::new());
        let engine = engine(generator, store.clone());

        let plan = engine
            .exchange(&"alice".into(), "I want to learn Python in 7 days")
            .await
            .unwrap();

        assert!(!plan.message.is_empty());
        assert!(!plan.roadmap.is_empty());
        assert!(!plan.schedule.is_empty());

        // Both turns committed, assistant raw stored verbatim.
        let turns = store.list_for_principal(&"alice".into()).await.unwrap();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].role, Role::User);
        assert_eq!(turns[1].role, Role::Assistant);
        assert_eq!(turns[1].raw_content, PLAN_JSON);
    }

    #[tokio::test]
    async fn second_exchange_sees_collapsed_history() {
        let generator = Arc::new(FakeGenerator::replying(PLAN_JSON));
        let store = Arc::new(InMemoryStore::new());
        let engine = engine(generator.clone(), store);

        engine.exchange(&"alice".into(), "teach me Python").await.unwrap();
        engine.exchange(&"alice".into(), "make it shorter").await.unwrap();

        let requests = generator.requests.lock().await;
        assert_eq!(requests.len(), 2);

        // system + user
        assert_eq!(requests[0].messages.len(), 2);
        // system + user + assistant + user
        assert_eq!(requests[1].messages.len(), 4);

        let replayed = &requests[1].messages[2];
        assert_eq!(replayed.role, Role::Assistant);
        // The plan collapsed to its message, not the raw JSON.
        assert_eq!(replayed.text, "Here is your 7-day Python plan");
    }

    #[tokio::test]
    async fn unconfigured_backend_commits_nothing() {
        let generator = Arc::new(FakeGenerator::failing(GeneratorError::NotConfigured(
            "no API key".into(),
        )));
        let store = Arc::new(InMemoryStore::new());
        let engine = engine(generator, store.clone());

        let result = engine.exchange(&"alice".into(), "hello").await;
        assert!(matches!(result, Err(ExchangeError::NotConfigured(_))));
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn upstream_failure_commits_nothing() {
        let generator = Arc::new(FakeGenerator::failing(GeneratorError::Network(
            "connection refused".into(),
        )));
        let store = Arc::new(InMemoryStore::new());
        let engine = engine(generator, store.clone());

        let result = engine.exchange(&"alice".into(), "hello").await;
        assert!(matches!(result, Err(ExchangeError::Upstream(_))));
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn slow_generation_times_out_and_commits_nothing() {
        let generator = Arc::new(
            FakeGenerator::replying(PLAN_JSON).with_delay(Duration::from_millis(200)),
        );
        let store = Arc::new(InMemoryStore::new());
        let engine =
            ChatEngine::new(generator, store.clone()).with_timeout(Duration::from_millis(20));

        let result = engine.exchange(&"alice".into(), "hello").await;
        match result {
            Err(ExchangeError::Upstream(GeneratorError::Timeout(_))) => {}
            other => panic!("expected upstream timeout, got {other:?}"),
        }
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn same_principal_exchanges_serialize() {
        let generator = Arc::new(
            FakeGenerator::replying(PLAN_JSON).with_delay(Duration::from_millis(30)),
        );
        let store = Arc::new(InMemoryStore::new());
        let engine = Arc::new(engine(generator.clone(), store.clone()));

        let a = {
            let engine = engine.clone();
            tokio::spawn(async move { engine.exchange(&"alice".into(), "first").await })
        };
        let b = {
            let engine = engine.clone();
            tokio::spawn(async move { engine.exchange(&"alice".into(), "second").await })
        };
        a.await.unwrap().unwrap();
        b.await.unwrap().unwrap();

        // Exactly 4 turns in a consistent total order, never interleaved.
        let turns = store.list_for_principal(&"alice".into()).await.unwrap();
        let roles: Vec<Role> = turns.iter().map(|t| t.role).collect();
        assert_eq!(
            roles,
            [Role::User, Role::Assistant, Role::User, Role::Assistant]
        );

        // Whichever exchange ran second saw the first one's turns.
        let requests = generator.requests.lock().await;
        let mut lengths: Vec<usize> = requests.iter().map(|r| r.messages.len()).collect();
        lengths.sort_unstable();
        assert_eq!(lengths, [2, 4]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn different_principals_proceed_independently() {
        let generator = Arc::new(
            FakeGenerator::replying(PLAN_JSON).with_delay(Duration::from_millis(30)),
        );
        let store = Arc::new(InMemoryStore::new());
        let engine = Arc::new(engine(generator, store.clone()));

        let a = {
            let engine = engine.clone();
            tokio::spawn(async move { engine.exchange(&"alice".into(), "hi").await })
        };
        let b = {
            let engine = engine.clone();
            tokio::spawn(async move { engine.exchange(&"bob".into(), "hey").await })
        };
        a.await.unwrap().unwrap();
        b.await.unwrap().unwrap();

        assert_eq!(store.list_for_principal(&"alice".into()).await.unwrap().len(), 2);
        assert_eq!(store.list_for_principal(&"bob".into()).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn idle_principal_lock_entries_are_pruned() {
        let generator = Arc::new(FakeGenerator::replying(PLAN_JSON));
        let store = Arc::new(InMemoryStore::new());
        let engine = engine(generator, store);

        engine.exchange(&"alice".into(), "hi").await.unwrap();
        engine.exchange(&"bob".into(), "hey").await.unwrap();

        // No exchange in flight, so no lock entry survives.
        assert!(engine.locks.lock().await.is_empty());
    }

    /// A store that fails every assistant append, for the orphan policy.
    struct AssistantAppendFails {
        inner: InMemoryStore,
    }

    #[async_trait::async_trait]
    impl TurnStore for AssistantAppendFails {
        fn name(&self) -> &str {
            "assistant_append_fails"
        }

        async fn append(&self, turn: NewTurn) -> Result<TurnRecord, StoreError> {
            if turn.role == Role::Assistant {
                return Err(StoreError::Storage("disk full".into()));
            }
            self.inner.append(turn).await
        }

        async fn list_for_principal(
            &self,
            principal_id: &PrincipalId,
        ) -> Result<Vec<TurnRecord>, StoreError> {
            self.inner.list_for_principal(principal_id).await
        }

        async fn count(&self) -> Result<usize, StoreError> {
            self.inner.count().await
        }
    }

    #[tokio::test]
    async fn failed_assistant_append_retains_user_turn() {
        let generator = Arc::new(FakeGenerator::replying(PLAN_JSON));
        let store = Arc::new(AssistantAppendFails {
            inner: InMemoryStore::new(),
        });
        let engine = engine(generator, store.clone());

        let result = engine.exchange(&"alice".into(), "hello").await;
        assert!(matches!(result, Err(ExchangeError::Persistence(_))));

        // The orphaned user turn is retained; the conversation has a gap
        // but reconstruction still works.
        let turns = store.list_for_principal(&"alice".into()).await.unwrap();
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].role, Role::User);
        let history = history::reconstruct(&turns);
        assert_eq!(history.len(), 1);
    }

    #[tokio::test]
    async fn prose_completion_still_yields_schema_complete_plan() {
        let generator = Arc::new(FakeGenerator::replying("I am not sure what you mean."));
        let store = Arc::new(InMemoryStore::new());
        let engine = engine(generator, store.clone());

        let plan = engine.exchange(&"alice".into(), "???").await.unwrap();
        assert_eq!(plan.message, "I am not sure what you mean.");
        assert!(plan.is_message_only());

        // The raw prose, not the resolved form, is what got persisted.
        let turns = store.list_for_principal(&"alice".into()).await.unwrap();
        assert_eq!(turns[1].raw_content, "I am not sure what you mean.");
    }
}
