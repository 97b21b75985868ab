//! Slug generation and problem-type standardization
//!
//! Brands, models and problem types are deduplicated by slug, so every
//! writer must derive slugs through [`create_slug`].

use once_cell::sync::Lazy;
use regex::Regex;

/// Canonical problem categories offered to the extractor
pub const PROBLEM_CATEGORIES: [&str; 9] = [
    "No Power",
    "Not Charging",
    "No Display",
    "No Boot",
    "Liquid Damage",
    "Short Circuit",
    "Overheating",
    "BIOS Issue",
    "Other",
];

static NON_ALPHANUMERIC_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9]+").expect("static regex"));

/// Lowercase, collapse non-alphanumeric runs into `-`, trim edge dashes
///
/// ```
/// use lfdb_common::normalize::create_slug;
///
/// assert_eq!(create_slug("EliteBook 840 G5"), "elitebook-840-g5");
/// assert_eq!(create_slug("  --HP!!  "), "hp");
/// ```
pub fn create_slug(text: &str) -> String {
    let lowered = text.to_lowercase();
    NON_ALPHANUMERIC_RUN
        .replace_all(&lowered, "-")
        .trim_matches('-')
        .to_string()
}

/// Fold text for case-insensitive search
///
/// SQLite only folds ASCII in `LIKE`, so searchable columns store this
/// form and patterns are folded the same way.
///
/// ```
/// use lfdb_common::normalize::search_key;
///
/// assert_eq!(search_key("Médion AKOYA"), "médion akoya");
/// assert_eq!(search_key("MÉDION"), search_key("médion"));
/// ```
pub fn search_key(text: &str) -> String {
    text.to_lowercase()
}

/// Map free-form problem descriptions onto the canonical categories
///
/// `None` stays `None`; unrecognized values become `"Other"`.
pub fn standardize_problem_type(problem_type: Option<&str>) -> Option<String> {
    let raw = problem_type?;
    if raw.is_empty() {
        return None;
    }

    let standardized = match raw.trim().to_lowercase().as_str() {
        "no power" => "No Power",
        "not charging" => "Not Charging",
        "no display" => "No Display",
        "no boot" => "No Boot",
        "liquid damage" | "water damage" => "Liquid Damage",
        "short circuit" | "short" => "Short Circuit",
        "overheating" => "Overheating",
        "bios issue" | "bios" => "BIOS Issue",
        _ => "Other",
    };

    Some(standardized.to_string())
}

/// Slug form of a problem filter typed by a user ("No Power" → "no-power")
pub fn problem_filter_slug(filter: &str) -> String {
    filter
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_key_folds_non_ascii() {
        assert_eq!(search_key("ÜBER Gerät"), "über gerät");
        assert_eq!(search_key("ThinkPad"), "thinkpad");
    }

    #[test]
    fn test_slug_basic() {
        assert_eq!(create_slug("ThinkPad X1 Carbon"), "thinkpad-x1-carbon");
        assert_eq!(create_slug("Dell"), "dell");
    }

    #[test]
    fn test_slug_collapses_punctuation_runs() {
        assert_eq!(create_slug("ROG Strix G15 (G513QM)"), "rog-strix-g15-g513qm");
        assert_eq!(create_slug("a---b___c"), "a-b-c");
    }

    #[test]
    fn test_slug_trims_edges() {
        assert_eq!(create_slug("--Asus--"), "asus");
        assert_eq!(create_slug("!!!"), "");
    }

    #[test]
    fn test_slug_drops_non_ascii_letters() {
        assert_eq!(create_slug("Médion Akoya"), "m-dion-akoya");
    }

    #[test]
    fn test_standardize_known_aliases() {
        assert_eq!(
            standardize_problem_type(Some("Water Damage")).as_deref(),
            Some("Liquid Damage")
        );
        assert_eq!(standardize_problem_type(Some(" short ")).as_deref(), Some("Short Circuit"));
        assert_eq!(standardize_problem_type(Some("BIOS")).as_deref(), Some("BIOS Issue"));
        assert_eq!(standardize_problem_type(Some("no power")).as_deref(), Some("No Power"));
    }

    #[test]
    fn test_standardize_unknown_is_other() {
        assert_eq!(
            standardize_problem_type(Some("Keyboard not working")).as_deref(),
            Some("Other")
        );
    }

    #[test]
    fn test_standardize_absent_is_none() {
        assert_eq!(standardize_problem_type(None), None);
        assert_eq!(standardize_problem_type(Some("")), None);
    }

    #[test]
    fn test_every_category_maps_to_itself() {
        for category in PROBLEM_CATEGORIES {
            assert_eq!(standardize_problem_type(Some(category)).as_deref(), Some(category));
        }
    }

    #[test]
    fn test_problem_filter_slug() {
        assert_eq!(problem_filter_slug("No  Power"), "no-power");
        assert_eq!(problem_filter_slug("liquid-damage"), "liquid-damage");
    }
}
