use std::fmt::Write as _;

use crate::models::itinerary::{ItinerarySpot, Role};
use crate::models::location::ScoredCandidate;
use crate::models::preferences::UserPreferences;
use crate::services::categorizer::CategorizedPool;
use crate::services::oracle::OracleRequest;

pub const HALF_DAY_SPOTS: usize = 3;
pub const DAY_SPOTS: usize = 5;

/// One full day: lunch, two tour stops around a cafe break, dinner.
pub const DAY_PATTERN: [Role; DAY_SPOTS] =
    [Role::Lunch, Role::Tour, Role::Cafe, Role::Tour, Role::Dinner];
pub const HALF_DAY_PATTERN: [Role; HALF_DAY_SPOTS] = [Role::Meal, Role::Tour, Role::Cafe];

/// Low but non-zero so wording varies while the plan stays on the digest.
pub const GENERATION_TEMPERATURE: f32 = 0.2;

const DESCRIPTION_PREVIEW_CHARS: usize = 80;

/// Exact number of stops for a duration answer. Checks run in order, so
/// "half" wins over anything else in the string.
pub fn required_spot_count(duration: &str) -> usize {
    let duration = duration.to_lowercase();
    if duration.contains("half") {
        HALF_DAY_SPOTS
    } else if duration.contains("2 day") {
        DAY_SPOTS * 2
    } else if duration.contains("3 day") || duration.contains('+') {
        DAY_SPOTS * 3
    } else {
        DAY_SPOTS
    }
}

/// Role of every stop, in order. Multi-day plans repeat [`DAY_PATTERN`].
pub fn role_sequence(duration: &str) -> Vec<Role> {
    let count = required_spot_count(duration);
    if count == HALF_DAY_SPOTS {
        return HALF_DAY_PATTERN.to_vec();
    }
    DAY_PATTERN
        .iter()
        .copied()
        .cycle()
        .take(count)
        .collect()
}

/// `"1. Lunch -> 2. Tour -> ..."`, with a day marker before each day.
pub fn sequence_instruction(roles: &[Role]) -> String {
    let multi_day = roles.len() > DAY_SPOTS;
    let mut out = String::new();
    for (i, role) in roles.iter().enumerate() {
        if multi_day && i % DAY_SPOTS == 0 {
            if i > 0 {
                out.push('\n');
            }
            let _ = write!(out, "Day {}: ", i / DAY_SPOTS + 1);
        } else if i > 0 {
            out.push_str(" -> ");
        }
        let _ = write!(out, "{}. {}", i + 1, role);
    }
    out
}

fn preview(text: &str) -> String {
    let text = text.trim();
    if text.chars().count() <= DESCRIPTION_PREVIEW_CHARS {
        return text.to_string();
    }
    let cut: String = text.chars().take(DESCRIPTION_PREVIEW_CHARS).collect();
    format!("{}...", cut.trim_end())
}

/// One line per candidate: index, name, related media, coordinates and a
/// shortened description.
pub fn render_digest(candidates: &[ScoredCandidate]) -> String {
    if candidates.is_empty() {
        return "(none)\n".to_string();
    }

    let mut out = String::new();
    for (i, candidate) in candidates.iter().enumerate() {
        let location = &candidate.location;
        let media = if location.media_title.is_empty() {
            "-"
        } else {
            location.media_title.as_str()
        };
        let _ = writeln!(
            out,
            "{}. {} | media: {} | lat: {}, lng: {} | {}",
            i + 1,
            location.name,
            media,
            location.lat,
            location.lng,
            preview(&location.description)
        );
    }
    out
}

fn render_pool(pool: &CategorizedPool) -> String {
    format!(
        "[MEAL candidates]\n{}\n[CAFE candidates]\n{}\n[TOUR candidates]\n{}",
        render_digest(&pool.meals),
        render_digest(&pool.cafes),
        render_digest(&pool.tours)
    )
}

const OUTPUT_FORMAT: &str = r#"{
  "message": "One friendly sentence summarising the plan",
  "spots": [
    {
      "name": "Gwangjang Market(Lunch)",
      "description": "Why this stop fits the traveller",
      "lat": 37.5700,
      "lng": 126.9996,
      "media_title": "Related drama, movie or artist",
      "tips": "Try the bindaetteok and mayak gimbap"
    }
  ]
}"#;

const SHARED_RULES: &str = "- Write every field in English, whatever language the user used.
- Suffix every name with its role tag in parentheses: (Lunch), (Dinner), (Meal), (Tour) or (Cafe).
- Never place two meals next to each other and never place two cafes next to each other.
- Never use the same place twice.
- Only use places from the candidate lists below, with their coordinates exactly as given.
- Every spot needs a practical tip: signature menu items for meals, a drink or dessert for cafes, visiting logistics (hours, tickets, best time) for tours.";

fn recommendation_system_prompt(duration: &str, guidance: &str, pool: &CategorizedPool) -> String {
    let roles = role_sequence(duration);
    format!(
        "You are a Korean travel planner specialising in K-culture locations.
Build an itinerary of EXACTLY {count} spots in EXACTLY this order:
{sequence}

Rules:
{rules}
- {guidance}

{digests}
Reply with JSON only, in this format:
{format}",
        count = roles.len(),
        sequence = sequence_instruction(&roles),
        rules = SHARED_RULES,
        guidance = guidance,
        digests = render_pool(pool),
        format = OUTPUT_FORMAT,
    )
}

/// Single generation request for a new itinerary.
pub fn compose_recommendation_prompt(prefs: &UserPreferences, pool: &CategorizedPool) -> OracleRequest {
    let system = recommendation_system_prompt(
        &prefs.duration,
        "Match the traveller's pace, companion, food preference, cafe preference and photo priority.",
        pool,
    );
    let user = format!(
        "Traveller preferences:\n{}",
        serde_json::to_string_pretty(prefs).unwrap_or_else(|_| format!("{:?}", prefs))
    );

    OracleRequest::new(system, user)
        .temperature(GENERATION_TEMPERATURE)
        .json()
}

/// Generation request for a free text message sent instead of a survey. The
/// plan covers a single day.
pub fn compose_chat_recommendation_prompt(message: &str, pool: &CategorizedPool) -> OracleRequest {
    let system = recommendation_system_prompt(
        "",
        "Follow the traveller's request wherever the candidate lists allow it.",
        pool,
    );

    OracleRequest::new(system, format!("Traveller request: {}", message))
        .temperature(GENERATION_TEMPERATURE)
        .json()
}

/// Request for a full, merged itinerary after a follow-up chat message.
pub fn compose_modification_prompt(
    current: &[ItinerarySpot],
    user_request: &str,
    pool: &CategorizedPool,
) -> OracleRequest {
    let current_json =
        serde_json::to_string_pretty(current).unwrap_or_else(|_| "[]".to_string());

    let system = format!(
        "You are a Korean travel planner editing an existing itinerary.
Apply the user's change and return the COMPLETE itinerary: every existing spot that is kept, plus any inserted spots, in visiting order.
Never return only the changed spots.
Keep existing spots exactly as they are unless the user asks to change them.

Rules:
{rules}

[CURRENT itinerary]
{current}

{digests}
Reply with JSON only, in this format:
{format}",
        rules = SHARED_RULES,
        current = current_json,
        digests = render_pool(pool),
        format = OUTPUT_FORMAT,
    );

    OracleRequest::new(system, format!("Change request: {}", user_request))
        .temperature(GENERATION_TEMPERATURE)
        .json()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::location::LocationRecord;

    #[test]
    fn test_required_spot_count() {
        assert_eq!(required_spot_count("Half day"), 3);
        assert_eq!(required_spot_count("1 day"), 5);
        assert_eq!(required_spot_count("2 days"), 10);
        assert_eq!(required_spot_count("3+ days"), 15);
        assert_eq!(required_spot_count("3 days"), 15);
        assert_eq!(required_spot_count(""), 5);
        assert_eq!(required_spot_count("a week, maybe"), 5);
    }

    #[test]
    fn test_one_day_pattern() {
        assert_eq!(
            role_sequence("1 day"),
            vec![Role::Lunch, Role::Tour, Role::Cafe, Role::Tour, Role::Dinner]
        );
        assert_eq!(role_sequence("Half day"), HALF_DAY_PATTERN.to_vec());
    }

    #[test]
    fn test_multi_day_repeats_pattern() {
        let roles = role_sequence("3+ days");
        assert_eq!(roles.len(), 15);
        for day in roles.chunks(DAY_SPOTS) {
            assert_eq!(day, DAY_PATTERN);
        }
    }

    #[test]
    fn test_patterns_never_put_meals_or_cafes_side_by_side() {
        for duration in ["Half day", "1 day", "2 days", "3+ days"] {
            let roles = role_sequence(duration);
            for pair in roles.windows(2) {
                assert!(!(pair[0].is_meal() && pair[1].is_meal()), "{}", duration);
                assert!(!(pair[0] == Role::Cafe && pair[1] == Role::Cafe), "{}", duration);
            }
        }
    }

    #[test]
    fn test_sequence_instruction_marks_days() {
        let single = sequence_instruction(&role_sequence("1 day"));
        assert_eq!(single, "1. Lunch -> 2. Tour -> 3. Cafe -> 4. Tour -> 5. Dinner");

        let multi = sequence_instruction(&role_sequence("2 days"));
        assert!(multi.starts_with("Day 1: 1. Lunch"));
        assert!(multi.contains("\nDay 2: 6. Lunch -> 7. Tour"));
    }

    #[test]
    fn test_digest_truncates_descriptions() {
        let candidates = vec![ScoredCandidate {
            location: LocationRecord {
                name: "Bukchon Hanok Village".to_string(),
                lat: 37.5826,
                lng: 126.985,
                description: "x".repeat(200),
                ..Default::default()
            },
            score: 3,
        }];

        let digest = render_digest(&candidates);
        assert!(digest.starts_with("1. Bukchon Hanok Village | media: - | lat: 37.5826"));
        assert!(digest.trim_end().ends_with("..."));
        assert!(digest.len() < 200);
        assert_eq!(render_digest(&[]), "(none)\n");
    }

    #[test]
    fn test_recommendation_prompt_contract() {
        let prefs = UserPreferences {
            target_area: "Seoul".to_string(),
            duration: "2 days".to_string(),
            ..Default::default()
        };
        let request = compose_recommendation_prompt(&prefs, &CategorizedPool::default());

        assert!(request.json_mode);
        assert_eq!(request.temperature, GENERATION_TEMPERATURE);
        assert!(request.system_prompt().contains("EXACTLY 10 spots"));
        assert!(request.system_prompt().contains("[CAFE candidates]"));
        assert!(request.user_prompt().contains("\"duration\": \"2 days\""));
    }

    #[test]
    fn test_chat_recommendation_prompt_plans_one_day() {
        let request =
            compose_chat_recommendation_prompt("명동 여행 추천해줘", &CategorizedPool::default());

        assert!(request.json_mode);
        assert!(request.system_prompt().contains("EXACTLY 5 spots"));
        assert_eq!(request.user_prompt(), "Traveller request: 명동 여행 추천해줘");
    }

    #[test]
    fn test_modification_prompt_embeds_current_itinerary() {
        let current = vec![ItinerarySpot {
            name: "Deoksugung(Tour)".to_string(),
            ..Default::default()
        }];
        let request = compose_modification_prompt(
            &current,
            "add a cafe near City Hall",
            &CategorizedPool::default(),
        );

        assert!(request.system_prompt().contains("Deoksugung(Tour)"));
        assert!(request.system_prompt().contains("COMPLETE itinerary"));
        assert!(request.user_prompt().ends_with("add a cafe near City Hall"));
    }
}
