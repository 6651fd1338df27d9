//! Manager-stage output parsing.
//!
//! The Manager LLM is instructed to emit a bare JSON object, but models
//! routinely wrap it in markdown code fences. Fence stripping is isolated
//! here, away from the orchestration logic, and a parse failure returns a
//! tagged error carrying the raw text instead of a fabricated decision.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::errors::PipelineError;

/// The Manager stage's structured decision.
///
/// `websearch_needed` is advisory: the yes/no policy is delegated to the
/// model, not computed locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManagerDecision {
    #[serde(with = "yes_no")]
    pub websearch_needed: bool,
    pub user_query: String,
    pub context: String,
}

/// Manager output that could not be parsed as a decision.
#[derive(Debug, Clone, Error)]
#[error("malformed manager output: {raw}")]
pub struct ManagerParseError {
    /// The offending text, verbatim, for diagnostics.
    pub raw: String,
}

impl From<ManagerParseError> for PipelineError {
    fn from(err: ManagerParseError) -> Self {
        PipelineError::MalformedManagerOutput { raw: err.raw }
    }
}

/// Remove a surrounding markdown code fence, if any.
pub fn strip_code_fences(text: &str) -> &str {
    let mut cleaned = text.trim();
    if let Some(rest) = cleaned.strip_prefix("```json") {
        cleaned = rest.trim_start();
    } else if let Some(rest) = cleaned.strip_prefix("```") {
        cleaned = rest.trim_start();
    }
    if let Some(rest) = cleaned.strip_suffix("```") {
        cleaned = rest.trim_end();
    }
    cleaned
}

/// Parse raw Manager output into a decision.
pub fn parse_manager_decision(raw: &str) -> Result<ManagerDecision, ManagerParseError> {
    let cleaned = strip_code_fences(raw);
    serde_json::from_str(cleaned).map_err(|_| ManagerParseError {
        raw: raw.to_string(),
    })
}

/// The model is told to answer "yes"/"no", and some models emit JSON
/// booleans instead; accept both, serialize back as the strings the
/// downstream prompt expects.
mod yes_no {
    use serde::de::{self, Deserializer};
    use serde::ser::Serializer;
    use serde::Deserialize;
    use serde_json::Value;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<bool, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::Bool(b) => Ok(b),
            Value::String(s) => match s.trim().to_lowercase().as_str() {
                "yes" | "true" => Ok(true),
                "no" | "false" => Ok(false),
                other => Err(de::Error::custom(format!(
                    "expected yes/no, got {:?}",
                    other
                ))),
            },
            other => Err(de::Error::custom(format!(
                "expected yes/no, got {}",
                other
            ))),
        }
    }

    pub fn serialize<S>(value: &bool, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(if *value { "yes" } else { "no" })
    }
}
