//! AI extraction: Gemini client, prompt and response parsing

pub mod extractor;
pub mod gemini;
pub mod prompt;

pub use extractor::{parse_response, ExtractedRepairData, ExtractionError, RepairExtractor};
pub use gemini::{GeminiClient, GeminiError, TextGenerator};
pub use prompt::build_prompt;
