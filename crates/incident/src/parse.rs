//! Parser for the reasoning service's two-section response.
//!
//! The response carries a narrative section introduced by [`ANALYSIS_MARKER`]
//! and a structured section introduced by [`PLAN_MARKER`]. The parser fails
//! closed: anything it cannot read yields an empty candidate, never an error.

use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Marker introducing the narrative section.
pub const ANALYSIS_MARKER: &str = "Analysis:";

/// Marker introducing the structured plan section.
pub const PLAN_MARKER: &str = "Plan:";

/// Narrative used when the response has no readable analysis section.
pub const UNPARSED_ANALYSIS: &str = "Could not parse reasoning analysis.";

/// Result of parsing a reasoning response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedResponse {
    /// Root-cause narrative
    pub analysis: String,
    /// Structured plan candidate; empty when missing or unparseable
    pub candidate: Map<String, Value>,
}

/// Split a response into its narrative and structured plan candidate.
#[must_use]
pub fn parse_reasoning_response(content: &str) -> ParsedResponse {
    let Some(analysis_start) = content.find(ANALYSIS_MARKER) else {
        debug!("Reasoning response has no analysis marker");
        return unparsed();
    };
    let after_analysis = &content[analysis_start + ANALYSIS_MARKER.len()..];

    let Some(plan_start) = after_analysis.find(PLAN_MARKER) else {
        debug!("Reasoning response has no plan marker after the analysis");
        return unparsed();
    };

    let analysis = after_analysis[..plan_start].trim().to_string();
    let plan_text = strip_code_fence(&after_analysis[plan_start + PLAN_MARKER.len()..]);

    let candidate = match serde_json::from_str::<Value>(plan_text) {
        Ok(Value::Object(map)) => map,
        Ok(other) => {
            warn!(kind = json_kind(&other), "Plan section is not a JSON object");
            Map::new()
        }
        Err(e) => {
            warn!(error = %e, "Failed to parse plan section");
            Map::new()
        }
    };

    ParsedResponse {
        analysis: if analysis.is_empty() {
            UNPARSED_ANALYSIS.to_string()
        } else {
            analysis
        },
        candidate,
    }
}

/// Remove a surrounding markdown code fence (with or without a language tag).
///
/// Text after the closing fence is dropped.
#[must_use]
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    // Skip the info string (e.g. "json") up to the first newline.
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric()),
    };

    match body.find("```") {
        Some(end) => body[..end].trim(),
        None => body.trim(),
    }
}

fn unparsed() -> ParsedResponse {
    ParsedResponse {
        analysis: UNPARSED_ANALYSIS.to_string(),
        candidate: Map::new(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
