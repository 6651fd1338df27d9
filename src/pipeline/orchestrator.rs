//! Turn orchestration.
//!
//! Sequences Retriever -> (Manager -> Web Search)? -> Responder and packages
//! the result for the HTTP handler or terminal loop. Every stage failure is
//! converted into an error-shaped field of the outgoing payload; a turn
//! never propagates a fault to its caller.

use std::sync::Arc;

use serde::Serialize;
use serde_json::{json, Value};

use crate::core::errors::PipelineError;
use crate::llm::LlmProvider;
use crate::rag::{ChunkSearchResult, Retriever, DEFAULT_TOP_K};
use crate::tools::search::{render_links, SearchClient, DEFAULT_MAX_RESULTS};

use super::manager::parse_manager_decision;
use super::prompt;

/// Minimum best-chunk similarity before the gated responder will answer.
pub const RELEVANCE_THRESHOLD: f32 = 0.3;

/// Canned reply for the exit-phrase shortcut.
pub const FAREWELL: &str = "Goodbye!";

const EXIT_PHRASES: [&str; 3] = ["exit", "quit", "bye"];

/// True when the input is a session-ending phrase.
pub fn is_exit_phrase(input: &str) -> bool {
    let lowered = input.trim().to_lowercase();
    EXIT_PHRASES.iter().any(|phrase| lowered == *phrase)
}

/// Payload of a completed two-stage turn.
///
/// `manager_response` holds either the decision object or `{"error": ...}`;
/// `advisor_response` holds the answer text, `{"error": ...}`, or null when
/// the Advisor stage was never reached.
#[derive(Debug, Serialize)]
pub struct TwoStageResponse {
    pub manager_response: Value,
    pub advisor_response: Value,
    pub web_links: String,
}

/// Outcome of one orchestrated turn.
#[derive(Debug)]
pub enum TurnOutcome {
    /// Exit phrase: no retrieval, no LLM call.
    Farewell(String),
    TwoStage(TwoStageResponse),
}

pub struct Orchestrator {
    retriever: Retriever,
    llm: Arc<dyn LlmProvider>,
    search: Arc<dyn SearchClient>,
}

impl Orchestrator {
    pub fn new(
        retriever: Retriever,
        llm: Arc<dyn LlmProvider>,
        search: Arc<dyn SearchClient>,
    ) -> Self {
        Self {
            retriever,
            llm,
            search,
        }
    }

    /// Single-stage QA turn straight over retrieved context.
    pub async fn answer(&self, query: &str) -> String {
        if is_exit_phrase(query) {
            return FAREWELL.to_string();
        }

        let chunks = self.retriever.retrieve(query, DEFAULT_TOP_K).await;
        let context = join_chunks(&chunks);
        self.generate_answer(&prompt::qa_prompt(&context, query)).await
    }

    /// Single-stage turn with relevance gating (terminal loop variant).
    ///
    /// Prefers an honest "no matching result" over a low-confidence answer:
    /// when retrieval is empty or the best score falls below the threshold,
    /// the LLM is not consulted at all.
    pub async fn answer_gated(&self, query: &str) -> String {
        if is_exit_phrase(query) {
            return FAREWELL.to_string();
        }

        let chunks = self.retriever.retrieve(query, DEFAULT_TOP_K).await;
        if chunks.is_empty() {
            return "Unable to fetch a matching result: No relevant documents found."
                .to_string();
        }

        let max_score = chunks.iter().map(|c| c.score).fold(f32::MIN, f32::max);
        if max_score < RELEVANCE_THRESHOLD {
            return format!(
                "Unable to fetch a matching result: Highest relevance score ({:.2}) is below threshold.",
                max_score
            );
        }

        let context = join_chunks(&chunks);
        self.generate_answer(&prompt::qa_prompt(&context, query)).await
    }

    /// Two-stage turn: Manager decision, optional web search, Advisor answer.
    pub async fn handle_turn(&self, query: &str) -> TurnOutcome {
        if is_exit_phrase(query) {
            return TurnOutcome::Farewell(FAREWELL.to_string());
        }

        let chunks = self.retriever.retrieve(query, DEFAULT_TOP_K).await;
        let context = join_chunks(&chunks);

        let raw = match self
            .llm
            .generate(&prompt::manager_prompt(query, &context))
            .await
        {
            Ok(text) => text,
            Err(err) => {
                return TurnOutcome::TwoStage(TwoStageResponse {
                    manager_response: json!({
                        "error": format!("Error generating response with Manager LLM: {}", err),
                    }),
                    advisor_response: Value::Null,
                    web_links: String::new(),
                });
            }
        };

        let mut decision = match parse_manager_decision(&raw) {
            Ok(decision) => decision,
            Err(err) => {
                tracing::warn!("Manager stage produced unparseable output");
                return TurnOutcome::TwoStage(TwoStageResponse {
                    manager_response: json!({
                        "error": "malformed manager output",
                        "raw": err.raw,
                    }),
                    advisor_response: Value::Null,
                    web_links: String::new(),
                });
            }
        };

        let mut web_links = String::new();
        if decision.websearch_needed {
            match self
                .search
                .search(&decision.user_query, DEFAULT_MAX_RESULTS)
                .await
            {
                Ok(results) if !results.is_empty() => {
                    web_links = render_links(&results);
                    decision
                        .context
                        .push_str("\n\n---\n\n**Web Search Results:**\n");
                    decision.context.push_str(&web_links);
                }
                Ok(_) => {
                    web_links = "No search results found.".to_string();
                }
                Err(PipelineError::SearchUnavailable(msg)) => {
                    // Missing credential aborts only this step.
                    tracing::warn!("Web search skipped: {}", msg);
                    web_links = format!("Web search skipped: {}", msg);
                }
                Err(err) => {
                    tracing::warn!("Web search failed: {}", err);
                    web_links = format!("Error during web search: {}", err);
                }
            }
        }

        let decision_value = serde_json::to_value(&decision).unwrap_or(Value::Null);

        let advisor_response = match self
            .llm
            .generate(&prompt::advisor_prompt(&decision_value.to_string()))
            .await
        {
            Ok(text) => Value::String(text),
            Err(err) => json!({
                "error": format!("Error generating response with Advisor LLM: {}", err),
            }),
        };

        TurnOutcome::TwoStage(TwoStageResponse {
            manager_response: decision_value,
            advisor_response,
            web_links,
        })
    }

    async fn generate_answer(&self, prompt: &str) -> String {
        match self.llm.generate(prompt).await {
            Ok(text) => text,
            Err(err) => format!(
                "Error generating response with {}: {}",
                self.llm.name(),
                err
            ),
        }
    }
}

fn join_chunks(chunks: &[ChunkSearchResult]) -> String {
    chunks
        .iter()
        .map(|c| c.chunk.content.as_str())
        .collect::<Vec<_>>()
        .join(prompt::CHUNK_SEPARATOR)
}
