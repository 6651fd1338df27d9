//! Prompt templates for the three LLM calls.
//!
//! Composition is pure string substitution; nothing here validates field
//! content. Downstream stages treat the filled template as untrusted
//! instruction text.

/// Divider between retrieved chunks inside the context block.
pub const CHUNK_SEPARATOR: &str = "\n\n---\n\n";

/// Single-stage QA prompt over retrieved context.
pub fn qa_prompt(context: &str, query: &str) -> String {
    format!(
        "Answer the question based only on the following context:\n\
         {context}\n\
         Answer the question based on the above context: {query}\n\
         If the context does not contain relevant information for the \
         requested time period, state that no data is available.",
        context = context,
        query = query,
    )
}

/// Manager prompt: decide whether a web search is needed and echo the
/// inputs back as a JSON object.
pub fn manager_prompt(query: &str, context: &str) -> String {
    format!(
        "You are the Manager stage of a personal finance advisor. Analyze \
         the user query and the provided context to decide whether a web \
         search is needed, and return a JSON object with these fields:\n\
         - \"websearch_needed\": \"yes\" if the query requires real-time or \
         external data (current stock prices, recent financial news), \
         otherwise \"no\".\n\
         - \"user_query\": the original user query.\n\
         - \"context\": the provided context from the database.\n\n\
         User Query: {query}\n\
         Context: {context}\n\n\
         Instructions:\n\
         - Output only a valid JSON object, no additional text.\n\
         - Set \"websearch_needed\" to \"yes\" for queries about real-time \
         data, recent events, or information likely missing from the \
         context.\n\
         - Include the full user query and context in the JSON.\n\n\
         Output Format:\n\
         {{\"websearch_needed\": \"yes/no\", \"user_query\": \"...\", \
         \"context\": \"...\"}}",
        query = query,
        context = context,
    )
}

/// Advisor prompt: turn the Manager's JSON decision into the user-facing
/// answer.
pub fn advisor_prompt(decision_json: &str) -> String {
    format!(
        "You are the Advisor LLM of a personal finance advisor. Take the \
         JSON decision object below and reply to the user's query \
         conversationally.\n\n\
         Input JSON:\n{decision}\n\n\
         Instructions:\n\
         - Use the \"user_query\" and \"context\" from the JSON to answer \
         the query.\n\
         - If \"websearch_needed\" is \"yes\" and no web results are present \
         in the context, note that real-time data is unavailable and rely on \
         the context or general financial knowledge.\n\
         - If the context lacks data for a requested time period, say so \
         explicitly.\n\
         - Provide a concise, user-friendly response addressing the query.\n\
         - Include a **Suggestion** section with actionable financial advice \
         tailored to the query and context.\n\
         - If the context is empty or irrelevant, use general financial \
         knowledge.\n\
         - If web search results are present in the context, list those \
         links for the user.\n\
         - Output only the conversational response, no JSON.",
        decision = decision_json,
    )
}
