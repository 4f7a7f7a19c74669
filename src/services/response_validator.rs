use log::warn;
use regex::Regex;
use serde::Deserialize;
use std::sync::OnceLock;
use thiserror::Error;

use crate::models::itinerary::{ItinerarySpot, Role};

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Generator reply is not valid JSON: {0}")]
    Parse(String),

    #[error("Generator reply has no spots list")]
    MissingSpots,
}

/// Shape the generator is asked to produce.
#[derive(Debug, Default, Deserialize)]
pub struct ItineraryDraft {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub spots: Option<Vec<ItinerarySpot>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedItinerary {
    pub spots: Vec<ItinerarySpot>,
    pub message: Option<String>,
    /// Set when the reply broke the spot-count contract.
    pub warning: Option<String>,
}

fn fenced_block() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)```(?:json|JSON)?\s*(.*?)```").expect("static regex")
    })
}

fn fence_marker() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"```(?:json|JSON)?\s*").expect("static regex"))
}

/// Extracts the JSON payload from a generator reply.
///
/// The body of the first closed code fence is preferred. Without one, stray
/// fence markers are dropped. Either way the text is then cut to its
/// outermost JSON value.
pub fn strip_code_fences(raw: &str) -> String {
    let source = match fenced_block()
        .captures(raw)
        .and_then(|captures| captures.get(1))
        .map(|body| body.as_str().trim())
        .filter(|body| !body.is_empty())
    {
        Some(body) => body.to_string(),
        None => fence_marker().replace_all(raw, "").trim().to_string(),
    };

    let start = source.find(|c| c == '{' || c == '[');
    let end = source.rfind(|c| c == '}' || c == ']');
    match (start, end) {
        (Some(start), Some(end)) if start < end => source[start..=end].to_string(),
        _ => source,
    }
}

/// Parses a generator reply into a draft. A bare array is accepted as the
/// spots list.
pub fn parse_draft(raw: &str) -> Result<ItineraryDraft, ValidationError> {
    let cleaned = strip_code_fences(raw);
    let value: serde_json::Value =
        serde_json::from_str(&cleaned).map_err(|e| ValidationError::Parse(e.to_string()))?;

    if value.is_array() {
        let spots: Vec<ItinerarySpot> =
            serde_json::from_value(value).map_err(|e| ValidationError::Parse(e.to_string()))?;
        return Ok(ItineraryDraft {
            message: None,
            spots: Some(spots),
        });
    }

    serde_json::from_value(value).map_err(|e| ValidationError::Parse(e.to_string()))
}

/// Gate every itinerary reply passes before reaching a client.
///
/// Only the spot count is checked. A wrong count is logged and reported as a
/// warning; the itinerary itself is returned untouched.
pub fn validate_itinerary(
    raw: &str,
    required_count: Option<usize>,
) -> Result<ValidatedItinerary, ValidationError> {
    let draft = parse_draft(raw)?;
    let spots = draft.spots.ok_or(ValidationError::MissingSpots)?;

    let warning = match required_count {
        Some(required) if spots.len() != required => {
            warn!(
                "Itinerary contract violated: expected {} spots, received {}",
                required,
                spots.len()
            );
            Some(format!(
                "Expected {} spots but the generator returned {}",
                required,
                spots.len()
            ))
        }
        _ => None,
    };

    log_sequence_issues(&spots);

    Ok(ValidatedItinerary {
        spots,
        message: draft.message,
        warning,
    })
}

/// Role-tag problems in a returned itinerary: untagged spots and two meals or
/// two cafes in a row. Only reported, never corrected.
pub fn sequence_issues(spots: &[ItinerarySpot]) -> Vec<String> {
    let mut issues = Vec::new();
    for spot in spots.iter().filter(|spot| spot.role().is_none()) {
        issues.push(format!("'{}' has no role tag", spot.name));
    }
    for pair in spots.windows(2) {
        if let (Some(first), Some(second)) = (pair[0].role(), pair[1].role()) {
            let repeated = (first.is_meal() && second.is_meal())
                || (first == Role::Cafe && second == Role::Cafe);
            if repeated {
                issues.push(format!(
                    "'{}' ({}) is followed by '{}' ({})",
                    pair[0].name, first, pair[1].name, second
                ));
            }
        }
    }
    issues
}

fn log_sequence_issues(spots: &[ItinerarySpot]) {
    for issue in sequence_issues(spots) {
        warn!("Itinerary sequence: {}", issue);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIVE_SPOTS: &str = r#"{"spots": [
        {"name": "Gwangjang Market(Lunch)", "lat": 37.57, "lng": 126.99},
        {"name": "Changdeokgung(Tour)", "lat": 37.58, "lng": 126.99},
        {"name": "Onion Anguk(Cafe)", "lat": 37.57, "lng": 126.98},
        {"name": "Bukchon Hanok Village(Tour)", "lat": 37.58, "lng": 126.98},
        {"name": "Tosokchon(Dinner)", "lat": 37.57, "lng": 126.97}
    ]}"#;

    #[test]
    fn test_strips_json_fence() {
        let fenced = format!("```json\n{}\n```", FIVE_SPOTS);
        let result = validate_itinerary(&fenced, Some(5)).unwrap();
        assert_eq!(result.spots.len(), 5);
        assert!(result.warning.is_none());
        assert_eq!(result.spots[0].name, "Gwangjang Market(Lunch)");
    }

    #[test]
    fn test_strips_bare_fence_and_prose() {
        let fenced = format!("Here is your plan:\n```\n{}\n```\nEnjoy!", FIVE_SPOTS);
        let result = validate_itinerary(&fenced, None).unwrap();
        assert_eq!(result.spots.len(), 5);
    }

    #[test]
    fn test_count_mismatch_is_a_warning() {
        let result = validate_itinerary(FIVE_SPOTS, Some(10)).unwrap();
        assert_eq!(result.spots.len(), 5);
        assert!(result.warning.unwrap().contains("Expected 10"));
    }

    #[test]
    fn test_non_json_is_terminal() {
        let result = validate_itinerary("Sorry, I cannot help with that.", Some(5));
        assert!(matches!(result, Err(ValidationError::Parse(_))));
    }

    #[test]
    fn test_object_without_spots_is_rejected() {
        let result = validate_itinerary(r#"{"message": "no data"}"#, Some(5));
        assert!(matches!(result, Err(ValidationError::MissingSpots)));
    }

    #[test]
    fn test_bare_array_is_accepted() {
        let result =
            validate_itinerary(r#"[{"name": "Hongdae(Tour)", "lat": 37.55, "lng": 126.92}]"#, Some(1))
                .unwrap();
        assert_eq!(result.spots[0].name, "Hongdae(Tour)");
    }

    #[test]
    fn test_prose_brackets_before_fence_are_ignored() {
        let reply = format!("Plan [v2]:\n```json\n{}\n```\nHave fun [really]", FIVE_SPOTS);
        let result = validate_itinerary(&reply, Some(5)).unwrap();
        assert_eq!(result.spots.len(), 5);
    }

    #[test]
    fn test_string_coordinates_are_kept() {
        let reply = r#"{"spots": [
            {"name": "Gwangjang Market(Lunch)", "lat": "37.57", "lng": "126.99"},
            {"name": "Changdeokgung(Tour)", "lat": 37.58, "lng": 126.99}
        ]}"#;
        let result = validate_itinerary(reply, Some(2)).unwrap();
        assert_eq!(result.spots[0].lat, 37.57);
        assert_eq!(result.spots[0].lng, 126.99);
        assert!(result.warning.is_none());
    }

    #[test]
    fn test_sequence_issues_flag_untagged_and_adjacent_meals() {
        let spots = parse_draft(
            r#"[
                {"name": "Gwangjang Market(Lunch)"},
                {"name": "Tosokchon(Dinner)"},
                {"name": "Bukchon Hanok Village"},
                {"name": "Onion Anguk(Cafe)"}
            ]"#,
        )
        .unwrap()
        .spots
        .unwrap();

        let issues = sequence_issues(&spots);
        assert_eq!(issues.len(), 2);
        assert!(issues.iter().any(|issue| issue.contains("Bukchon Hanok Village")));
        assert!(issues.iter().any(|issue| issue.contains("(Lunch) is followed by")));
        assert!(sequence_issues(&parse_draft(FIVE_SPOTS).unwrap().spots.unwrap()).is_empty());
    }
}
