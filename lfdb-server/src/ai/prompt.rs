//! Extraction prompt construction

use lfdb_common::normalize::PROBLEM_CATEGORIES;

/// A transcript shorter than this is treated as missing
pub const MIN_TRANSCRIPT_CHARS: usize = 100;

/// Transcript characters included in the prompt
pub const MAX_TRANSCRIPT_CHARS: usize = 15_000;

const DETAILED_MODE: &str = r#"**TRANSCRIPT AVAILABLE - Detailed Extraction Mode:**
- For troubleshooting: Extract the detailed step-by-step troubleshooting process that was followed. Include initial observations, measurements taken (voltages, resistances), components checked and diagnostic techniques used. Format as numbered steps if clear from the transcript. Aim for 4-6 sentences with technical details.
- For solution: Extract a comprehensive description of the fix applied. Include the faulty component identified, the replacement or repair performed, technical details (part numbers, voltage values if mentioned) and verification steps. Aim for 3-5 sentences with specific technical information."#;

const INFERENCE_MODE: &str = r#"**NO TRANSCRIPT - Inference Mode:**
Since no transcript is available, you MUST still provide troubleshooting and solution fields by:
1. Analyzing the video title carefully - it usually contains the brand, model, and problem type
2. Using the description if available
3. Based on your knowledge of common laptop repair procedures for the identified problem, provide:
   - For troubleshooting: A general step-by-step approach that would likely be followed for this type of repair (e.g., "1. Visual inspection for damage. 2. Check power delivery with multimeter. 3. Test charging circuit components...")
   - For solution: The most common fix for this type of problem based on the title (e.g., "The issue was likely caused by a faulty charging IC/MOSFET. Component was replaced and functionality restored.")
4. Start your troubleshooting/solution with "[Inferred]" to indicate it's based on title analysis rather than transcript."#;

/// Transcript text to include, or `None` when it is too short to use
pub fn usable_transcript(transcript: Option<&str>) -> Option<String> {
    let transcript = transcript?;
    if transcript.chars().count() <= MIN_TRANSCRIPT_CHARS {
        return None;
    }

    let mut chars = transcript.chars();
    let head: String = chars.by_ref().take(MAX_TRANSCRIPT_CHARS).collect();
    if chars.next().is_some() {
        Some(format!("{}...", head))
    } else {
        Some(head)
    }
}

/// Build the extraction prompt for one video
pub fn build_prompt(title: &str, description: Option<&str>, transcript: Option<&str>) -> String {
    let transcript = usable_transcript(transcript);
    let has_transcript = transcript.is_some();

    let categories = PROBLEM_CATEGORIES
        .iter()
        .map(|c| format!("'{}'", c))
        .collect::<Vec<_>>()
        .join(", ");

    let description = description
        .filter(|d| !d.trim().is_empty())
        .unwrap_or("Not available");

    let mode = if has_transcript {
        DETAILED_MODE
    } else {
        INFERENCE_MODE
    };

    let priority = if has_transcript {
        "PRIORITIZE the transcript content - it contains the most detailed technical information"
    } else {
        "Base your inference on common repair patterns for the problem type identified in the title"
    };

    format!(
        r#"You are an expert at analyzing laptop repair video data from an electronics repair YouTube channel.

Analyze this video information and extract structured repair data:

**Video Title:** {title}

**Description:** {description}

**Transcript:** {transcript}

Extract the following information in JSON format:
{{
  "brand": "laptop brand (Dell, HP, Lenovo, MSI, Asus, Apple, etc.) or null if not found",
  "model": "specific laptop model (e.g., 'EliteBook 840 G5', 'ThinkPad X1 Carbon') or null if not found",
  "problemType": "main problem category: choose from [{categories}] or null",
  "troubleshooting": "REQUIRED - troubleshooting process description",
  "solution": "REQUIRED - solution description",
  "confidence": "high/medium/low - how confident you are in the extraction",
  "reasoning": "brief explanation of your confidence level"
}}

{mode}

Important guidelines:
- NEVER return null for troubleshooting or solution - always provide something useful
- {priority}
- Extract specific technical details when available: voltages, component names, part numbers, measurement values
- For troubleshooting: focus on the diagnostic process, what was checked and how
- For solution: focus on what was actually done to fix the problem, not just the diagnosis
- Use step-by-step format when appropriate
- For problemType, standardize to one of the listed categories
- If multiple problems exist, focus on the main one mentioned in the title
- Be detailed but stay factual

Return ONLY valid JSON, no additional text."#,
        title = title,
        description = description,
        transcript = transcript.as_deref().unwrap_or("Not available"),
        categories = categories,
        mode = mode,
        priority = priority,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_transcript_is_ignored() {
        let short = "a".repeat(MIN_TRANSCRIPT_CHARS);
        assert_eq!(usable_transcript(Some(&short)), None);
        assert_eq!(usable_transcript(None), None);

        let long_enough = "a".repeat(MIN_TRANSCRIPT_CHARS + 1);
        assert_eq!(usable_transcript(Some(&long_enough)), Some(long_enough.clone()));
    }

    #[test]
    fn test_long_transcript_is_truncated() {
        let long = "b".repeat(MAX_TRANSCRIPT_CHARS + 10);
        let used = usable_transcript(Some(&long)).unwrap();
        assert!(used.ends_with("..."));
        assert_eq!(used.len(), MAX_TRANSCRIPT_CHARS + 3);

        let exact = "c".repeat(MAX_TRANSCRIPT_CHARS);
        assert_eq!(usable_transcript(Some(&exact)).unwrap(), exact);
    }

    #[test]
    fn test_inference_mode_without_transcript() {
        let prompt = build_prompt("HP 250 G7 no power", None, Some("too short"));
        assert!(prompt.contains("**Video Title:** HP 250 G7 no power"));
        assert!(prompt.contains("**Description:** Not available"));
        assert!(prompt.contains("**Transcript:** Not available"));
        assert!(prompt.contains("Inference Mode"));
        assert!(prompt.contains("[Inferred]"));
        assert!(!prompt.contains("Detailed Extraction Mode"));
        assert!(prompt.ends_with("Return ONLY valid JSON, no additional text."));
    }

    #[test]
    fn test_detailed_mode_with_transcript() {
        let transcript = "We measure the twenty volt rail and find a short. ".repeat(5);
        let prompt = build_prompt("Dell XPS 15", Some("desc"), Some(&transcript));
        assert!(prompt.contains("Detailed Extraction Mode"));
        assert!(prompt.contains("PRIORITIZE the transcript content"));
        assert!(prompt.contains("**Description:** desc"));
    }

    #[test]
    fn test_prompt_lists_categories() {
        let prompt = build_prompt("x", None, None);
        assert!(prompt.contains("'No Power', 'Not Charging'"));
        assert!(prompt.contains("'Other']"));
    }
}
