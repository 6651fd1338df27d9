use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use crate::core::errors::PipelineError;
use crate::llm::LlmProvider;
use crate::rag::{ChunkSearchResult, Retriever, StoredChunk, VectorStore};
use crate::tools::search::{SearchClient, SearchResult};

use super::orchestrator::{is_exit_phrase, Orchestrator, TurnOutcome, FAREWELL};

/// Deterministic LLM: fixed Manager output, fixed answer text, call counter.
/// Routing inspects the composed prompt (the Manager template announces
/// itself), which keeps repeated turns idempotent.
struct StubLlm {
    manager_output: String,
    answer: String,
    generate_calls: AtomicUsize,
    embed_calls: AtomicUsize,
}

impl StubLlm {
    fn new(manager_output: &str, answer: &str) -> Arc<Self> {
        Arc::new(Self {
            manager_output: manager_output.to_string(),
            answer: answer.to_string(),
            generate_calls: AtomicUsize::new(0),
            embed_calls: AtomicUsize::new(0),
        })
    }

    fn generate_count(&self) -> usize {
        self.generate_calls.load(Ordering::SeqCst)
    }

    fn embed_count(&self) -> usize {
        self.embed_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmProvider for StubLlm {
    fn name(&self) -> &str {
        "stub"
    }

    async fn generate(&self, prompt: &str) -> Result<String, PipelineError> {
        self.generate_calls.fetch_add(1, Ordering::SeqCst);
        if prompt.contains("Manager stage") {
            Ok(self.manager_output.clone())
        } else {
            Ok(self.answer.clone())
        }
    }

    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, PipelineError> {
        self.embed_calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![vec![1.0, 0.0, 0.0]; inputs.len()])
    }
}

/// Fixed search-result store with a call counter.
struct StubStore {
    results: Vec<ChunkSearchResult>,
    search_calls: AtomicUsize,
}

impl StubStore {
    fn with_scores(scores: &[f32]) -> Arc<Self> {
        let results = scores
            .iter()
            .enumerate()
            .map(|(i, score)| ChunkSearchResult {
                chunk: StoredChunk {
                    chunk_id: format!("c{}", i),
                    content: format!("chunk {}", i),
                    source: "fixture".to_string(),
                    metadata: None,
                },
                score: *score,
            })
            .collect();
        Arc::new(Self {
            results,
            search_calls: AtomicUsize::new(0),
        })
    }

    fn empty() -> Arc<Self> {
        Self::with_scores(&[])
    }

    fn search_count(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VectorStore for StubStore {
    async fn search(
        &self,
        _query_embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<ChunkSearchResult>, PipelineError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        let mut results = self.results.clone();
        results.truncate(limit);
        Ok(results)
    }

    async fn count(&self) -> Result<usize, PipelineError> {
        Ok(self.results.len())
    }
}

enum StubSearchBehavior {
    Results(Vec<SearchResult>),
    Unavailable,
}

struct StubSearch {
    behavior: StubSearchBehavior,
    calls: AtomicUsize,
}

impl StubSearch {
    fn with_results(results: Vec<SearchResult>) -> Arc<Self> {
        Arc::new(Self {
            behavior: StubSearchBehavior::Results(results),
            calls: AtomicUsize::new(0),
        })
    }

    fn unavailable() -> Arc<Self> {
        Arc::new(Self {
            behavior: StubSearchBehavior::Unavailable,
            calls: AtomicUsize::new(0),
        })
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SearchClient for StubSearch {
    async fn search(
        &self,
        _query: &str,
        _max_results: usize,
    ) -> Result<Vec<SearchResult>, PipelineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            StubSearchBehavior::Results(results) => Ok(results.clone()),
            StubSearchBehavior::Unavailable => Err(PipelineError::SearchUnavailable(
                "SERPAPI_API_KEY is not set".to_string(),
            )),
        }
    }
}

const MANAGER_NO: &str = r#"{"websearch_needed":"no","user_query":"Q","context":"C"}"#;
const MANAGER_YES: &str = r#"{"websearch_needed":"yes","user_query":"Q","context":"C"}"#;

fn orchestrator(
    llm: &Arc<StubLlm>,
    store: &Arc<StubStore>,
    search: &Arc<StubSearch>,
) -> Orchestrator {
    let llm_dyn: Arc<dyn LlmProvider> = llm.clone();
    let store_dyn: Arc<dyn VectorStore> = store.clone();
    let search_dyn: Arc<dyn SearchClient> = search.clone();
    Orchestrator::new(
        Retriever::new(llm_dyn.clone(), store_dyn),
        llm_dyn,
        search_dyn,
    )
}

#[test]
fn exit_phrases_match_case_insensitively() {
    assert!(is_exit_phrase("exit"));
    assert!(is_exit_phrase("  QUIT "));
    assert!(is_exit_phrase("Bye"));
    assert!(!is_exit_phrase("bye bye"));
    assert!(!is_exit_phrase("can I exit my mortgage early?"));
}

#[tokio::test]
async fn exit_phrase_short_circuits_without_retrieval_or_llm() {
    let llm = StubLlm::new(MANAGER_NO, "answer");
    let store = StubStore::with_scores(&[0.9]);
    let search = StubSearch::with_results(vec![]);
    let orch = orchestrator(&llm, &store, &search);

    match orch.handle_turn("QUIT").await {
        TurnOutcome::Farewell(text) => assert_eq!(text, FAREWELL),
        other => panic!("expected farewell, got {:?}", other),
    }

    assert_eq!(llm.generate_count(), 0);
    assert_eq!(llm.embed_count(), 0);
    assert_eq!(store.search_count(), 0);

    assert_eq!(orch.answer("bye").await, FAREWELL);
    assert_eq!(llm.generate_count(), 0);
}

#[tokio::test]
async fn empty_index_still_yields_a_well_formed_turn() {
    let llm = StubLlm::new(MANAGER_NO, "general advice");
    let store = StubStore::empty();
    let search = StubSearch::with_results(vec![]);
    let orch = orchestrator(&llm, &store, &search);

    let outcome = orch.handle_turn("how should I budget?").await;
    match outcome {
        TurnOutcome::TwoStage(response) => {
            assert!(response.manager_response.is_object());
            assert_eq!(response.advisor_response, "general advice");
        }
        other => panic!("expected two-stage outcome, got {:?}", other),
    }

    assert_eq!(orch.answer("how should I budget?").await, "general advice");
}

#[tokio::test]
async fn relevance_gate_blocks_low_scores_without_llm_call() {
    let llm = StubLlm::new(MANAGER_NO, "should not appear");
    let store = StubStore::with_scores(&[0.1, 0.2, 0.25]);
    let search = StubSearch::with_results(vec![]);
    let orch = orchestrator(&llm, &store, &search);

    let reply = orch.answer_gated("what about last winter?").await;
    assert!(reply.starts_with("Unable to fetch a matching result"));
    assert!(reply.contains("0.25"));
    assert_eq!(llm.generate_count(), 0);
}

#[tokio::test]
async fn relevance_gate_passes_scores_at_threshold() {
    let llm = StubLlm::new(MANAGER_NO, "a real answer");
    let store = StubStore::with_scores(&[0.1, 0.45]);
    let search = StubSearch::with_results(vec![]);
    let orch = orchestrator(&llm, &store, &search);

    assert_eq!(orch.answer_gated("spending in april?").await, "a real answer");
    assert_eq!(llm.generate_count(), 1);
}

#[tokio::test]
async fn manager_decision_round_trips_and_skips_search_on_no() {
    let llm = StubLlm::new(MANAGER_NO, "advisor text");
    let store = StubStore::with_scores(&[0.9]);
    let search = StubSearch::with_results(vec![SearchResult {
        title: "unused".to_string(),
        link: "https://unused".to_string(),
    }]);
    let orch = orchestrator(&llm, &store, &search);

    let outcome = orch.handle_turn("what is my balance?").await;
    let response = match outcome {
        TurnOutcome::TwoStage(response) => response,
        other => panic!("expected two-stage outcome, got {:?}", other),
    };

    assert_eq!(response.manager_response["websearch_needed"], "no");
    assert_eq!(response.manager_response["user_query"], "Q");
    assert_eq!(response.manager_response["context"], "C");
    assert_eq!(response.advisor_response, "advisor text");
    assert_eq!(search.call_count(), 0);
    assert!(response.web_links.is_empty());
}

#[tokio::test]
async fn malformed_manager_output_reports_raw_text_and_stops() {
    let raw = "I think a web search would help here.";
    let llm = StubLlm::new(raw, "advisor text");
    let store = StubStore::with_scores(&[0.9]);
    let search = StubSearch::with_results(vec![]);
    let orch = orchestrator(&llm, &store, &search);

    let outcome = orch.handle_turn("what is my balance?").await;
    let response = match outcome {
        TurnOutcome::TwoStage(response) => response,
        other => panic!("expected two-stage outcome, got {:?}", other),
    };

    assert_eq!(
        response.manager_response["error"],
        "malformed manager output"
    );
    assert_eq!(response.manager_response["raw"], raw);
    assert!(response.advisor_response.is_null());
    // Manager call only; the Advisor stage was never reached.
    assert_eq!(llm.generate_count(), 1);
    assert_eq!(search.call_count(), 0);
}

#[tokio::test]
async fn missing_search_credential_degrades_without_failing_the_turn() {
    let llm = StubLlm::new(MANAGER_YES, "advisor text");
    let store = StubStore::with_scores(&[0.9]);
    let search = StubSearch::unavailable();
    let orch = orchestrator(&llm, &store, &search);

    let outcome = orch.handle_turn("current mortgage rates?").await;
    let response = match outcome {
        TurnOutcome::TwoStage(response) => response,
        other => panic!("expected two-stage outcome, got {:?}", other),
    };

    assert!(response.web_links.contains("Web search skipped"));
    assert_eq!(response.advisor_response, "advisor text");
    // Context was not augmented with search results.
    assert_eq!(response.manager_response["context"], "C");
    assert_eq!(search.call_count(), 1);
}

#[tokio::test]
async fn search_results_augment_context_and_links() {
    let llm = StubLlm::new(MANAGER_YES, "advisor text");
    let store = StubStore::with_scores(&[0.9]);
    let search = StubSearch::with_results(vec![SearchResult {
        title: "Rates today".to_string(),
        link: "https://example.com/rates".to_string(),
    }]);
    let orch = orchestrator(&llm, &store, &search);

    let outcome = orch.handle_turn("current mortgage rates?").await;
    let response = match outcome {
        TurnOutcome::TwoStage(response) => response,
        other => panic!("expected two-stage outcome, got {:?}", other),
    };

    assert_eq!(
        response.web_links,
        "- [Rates today](https://example.com/rates)"
    );
    let context = response.manager_response["context"].as_str().unwrap();
    assert!(context.starts_with("C"));
    assert!(context.contains("Web Search Results"));
    assert!(context.contains("https://example.com/rates"));
}

#[tokio::test]
async fn identical_queries_yield_identical_responses() {
    let llm = StubLlm::new(MANAGER_NO, "stable answer");
    let store = StubStore::with_scores(&[0.9, 0.8]);
    let search = StubSearch::with_results(vec![]);
    let orch = orchestrator(&llm, &store, &search);

    let first = orch.answer("what did I save in april?").await;
    let second = orch.answer("what did I save in april?").await;
    assert_eq!(first, second);

    let outcome_a = orch.handle_turn("what did I save in april?").await;
    let outcome_b = orch.handle_turn("what did I save in april?").await;
    match (outcome_a, outcome_b) {
        (TurnOutcome::TwoStage(a), TurnOutcome::TwoStage(b)) => {
            assert_eq!(a.advisor_response, b.advisor_response);
            assert_eq!(a.manager_response, b.manager_response);
        }
        _ => panic!("expected two-stage outcomes"),
    }
}
