//! Repair-fact extraction
//!
//! Sends the prompt to a [`TextGenerator`], pulls the JSON object out of
//! the reply and fills gaps with fixed fallback texts. Extraction itself
//! never fails: errors yield a low-confidence record flagged `[Error]`.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

use lfdb_common::db::models::Confidence;

use super::gemini::{GeminiError, TextGenerator};
use super::prompt::build_prompt;

pub const INFERRED_TROUBLESHOOTING: &str = "[Inferred] Based on the video title, standard troubleshooting for this type of repair includes visual inspection, multimeter testing of power circuits, and component-level diagnosis.";
pub const INFERRED_SOLUTION: &str = "[Inferred] Based on the problem type, the repair likely involved identifying and replacing the faulty component, followed by verification testing.";
pub const ERROR_TROUBLESHOOTING: &str =
    "[Error] Unable to extract troubleshooting steps. Please review the video manually.";
pub const ERROR_SOLUTION: &str =
    "[Error] Unable to extract solution. Please review the video manually.";
pub const NO_REASONING: &str = "No reasoning provided";

static JSON_OBJECT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{[\s\S]*\}").expect("valid regex"));

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error(transparent)]
    Generator(#[from] GeminiError),

    #[error("No JSON found in AI response")]
    NoJson,

    #[error("Invalid JSON in AI response: {0}")]
    Parse(String),
}

/// Structured repair facts for one video
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedRepairData {
    pub brand: Option<String>,
    pub model: Option<String>,
    pub problem_type: Option<String>,
    pub troubleshooting: String,
    pub solution: String,
    pub confidence: Confidence,
    pub reasoning: String,
}

impl ExtractedRepairData {
    /// Record returned when extraction fails
    pub fn failed(message: &str) -> Self {
        Self {
            brand: None,
            model: None,
            problem_type: None,
            troubleshooting: ERROR_TROUBLESHOOTING.to_string(),
            solution: ERROR_SOLUTION.to_string(),
            confidence: Confidence::Low,
            reasoning: format!("Extraction failed: {}", message),
        }
    }
}

/// Reply as the model produced it; any field may be missing or mistyped
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawExtraction {
    #[serde(default)]
    brand: Value,
    #[serde(default)]
    model: Value,
    #[serde(default)]
    problem_type: Value,
    #[serde(default)]
    troubleshooting: Value,
    #[serde(default)]
    solution: Value,
    #[serde(default)]
    confidence: Value,
    #[serde(default)]
    reasoning: Value,
}

/// Non-empty text content of a JSON value
fn text_field(value: Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

impl From<RawExtraction> for ExtractedRepairData {
    fn from(raw: RawExtraction) -> Self {
        Self {
            brand: text_field(raw.brand),
            model: text_field(raw.model),
            problem_type: text_field(raw.problem_type),
            troubleshooting: text_field(raw.troubleshooting)
                .unwrap_or_else(|| INFERRED_TROUBLESHOOTING.to_string()),
            solution: text_field(raw.solution).unwrap_or_else(|| INFERRED_SOLUTION.to_string()),
            confidence: text_field(raw.confidence)
                .map(|c| Confidence::parse_lenient(&c))
                .unwrap_or(Confidence::Low),
            reasoning: text_field(raw.reasoning).unwrap_or_else(|| NO_REASONING.to_string()),
        }
    }
}

/// Strip a surrounding Markdown code fence, if any
fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the info string ("json") on the opening line
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

/// Parse a model reply into cleaned repair data
pub fn parse_response(text: &str) -> Result<ExtractedRepairData, ExtractionError> {
    let trimmed = strip_code_fence(text.trim());

    if let Ok(raw) = serde_json::from_str::<RawExtraction>(trimmed) {
        return Ok(raw.into());
    }

    let candidate = JSON_OBJECT
        .find(text)
        .ok_or(ExtractionError::NoJson)?
        .as_str();

    serde_json::from_str::<RawExtraction>(candidate)
        .map(ExtractedRepairData::from)
        .map_err(|e| ExtractionError::Parse(e.to_string()))
}

/// Runs prompts through a generator and cleans the result
pub struct RepairExtractor {
    generator: Arc<dyn TextGenerator>,
}

impl RepairExtractor {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    pub fn generator(&self) -> &Arc<dyn TextGenerator> {
        &self.generator
    }

    /// Extract without the error fallback
    pub async fn try_extract(
        &self,
        title: &str,
        description: Option<&str>,
        transcript: Option<&str>,
    ) -> Result<ExtractedRepairData, ExtractionError> {
        let prompt = build_prompt(title, description, transcript);
        let reply = self.generator.generate(&prompt).await?;
        debug!(title, reply_chars = reply.len(), "Received extraction reply");
        parse_response(&reply)
    }

    /// Extract repair data; failures produce [`ExtractedRepairData::failed`]
    pub async fn extract_repair_data(
        &self,
        title: &str,
        description: Option<&str>,
        transcript: Option<&str>,
    ) -> ExtractedRepairData {
        match self.try_extract(title, description, transcript).await {
            Ok(data) => data,
            Err(e) => {
                warn!(title, error = %e, "Repair extraction failed");
                ExtractedRepairData::failed(&e.to_string())
            }
        }
    }
}
