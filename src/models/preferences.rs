use serde::de::Error as _;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Survey answers posted to `/api/recommend`.
///
/// Every field is free text chosen from a client-side radio group, except
/// `interests` which is a multi-select. `bias` is an optional extra search
/// hint some clients send alongside the survey.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserPreferences {
    #[serde(default)]
    pub target_area: String,
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub pace: String,
    #[serde(default)]
    pub companion: String,
    #[serde(default)]
    pub interests: Vec<String>,
    #[serde(default)]
    pub k_content_ratio: String,
    #[serde(default)]
    pub food_preference: String,
    #[serde(default)]
    pub need_cafe: String,
    #[serde(default)]
    pub photo_priority: String,
    #[serde(default)]
    pub record_method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bias: Option<String>,
}

/// Area values that mean "no area chosen yet".
const AREA_PLACEHOLDERS: [&str; 2] = ["auto-detect", "choose manually"];

impl UserPreferences {
    /// The target area, unless it is empty or one of the placeholder answers.
    pub fn concrete_area(&self) -> Option<&str> {
        let area = self.target_area.trim();
        if area.is_empty()
            || AREA_PLACEHOLDERS
                .iter()
                .any(|placeholder| area.eq_ignore_ascii_case(placeholder))
        {
            None
        } else {
            Some(area)
        }
    }
}

/// Fields that mark a JSON object as a survey rather than a chat envelope.
const SURVEY_FIELDS: [&str; 3] = ["target_area", "duration", "interests"];

/// What a client posted to `/api/recommend`: a structured survey, or a free
/// text chat message when the body is not one.
#[derive(Debug, Clone, PartialEq)]
pub enum RecommendInput {
    Survey(UserPreferences),
    Chat(String),
}

impl RecommendInput {
    /// A JSON object is a survey unless it only carries a `message`. A JSON
    /// string, or a body that is not JSON and does not look like an object,
    /// is a chat message.
    pub fn from_body(body: &[u8]) -> Result<Self, serde_json::Error> {
        match serde_json::from_slice::<Value>(body) {
            Ok(Value::String(message)) => Self::chat(message),
            Ok(Value::Object(map))
                if !SURVEY_FIELDS.iter().any(|field| map.contains_key(*field)) =>
            {
                match map.get("message").and_then(Value::as_str) {
                    Some(message) => Self::chat(message.to_string()),
                    None => serde_json::from_value(Value::Object(map)).map(RecommendInput::Survey),
                }
            }
            Ok(value) => serde_json::from_value(value).map(RecommendInput::Survey),
            Err(e) => {
                let text = String::from_utf8_lossy(body);
                let text = text.trim();
                if text.starts_with('{') || text.starts_with('[') {
                    Err(e)
                } else {
                    Self::chat(text.to_string())
                }
            }
        }
    }

    fn chat(message: String) -> Result<Self, serde_json::Error> {
        if message.trim().is_empty() {
            Err(serde_json::Error::custom("empty chat message"))
        } else {
            Ok(RecommendInput::Chat(message.trim().to_string()))
        }
    }

    /// Preferences driving the spot count and prompt. Chat messages get the
    /// defaults, which plan a single day.
    pub fn preferences(&self) -> UserPreferences {
        match self {
            RecommendInput::Survey(prefs) => prefs.clone(),
            RecommendInput::Chat(_) => UserPreferences::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_areas_are_not_concrete() {
        let mut prefs = UserPreferences {
            target_area: "Auto-detect".to_string(),
            ..Default::default()
        };
        assert_eq!(prefs.concrete_area(), None);

        prefs.target_area = "choose manually".to_string();
        assert_eq!(prefs.concrete_area(), None);

        prefs.target_area = "  ".to_string();
        assert_eq!(prefs.concrete_area(), None);

        prefs.target_area = " Busan ".to_string();
        assert_eq!(prefs.concrete_area(), Some("Busan"));
    }

    #[test]
    fn test_survey_body_deserializes() {
        let prefs: UserPreferences = serde_json::from_value(serde_json::json!({
            "target_area": "Seoul",
            "duration": "1 day",
            "pace": "Balanced",
            "companion": "Solo",
            "interests": ["K-pop", "K-food"],
            "k_content_ratio": "Mostly",
            "food_preference": "Spicy OK",
            "need_cafe": "Must",
            "photo_priority": "Very Important",
            "record_method": "Insta-story"
        }))
        .unwrap();

        assert_eq!(prefs.interests, vec!["K-pop", "K-food"]);
        assert!(prefs.bias.is_none());
    }

    #[test]
    fn test_survey_without_duration_uses_defaults() {
        let prefs: UserPreferences = serde_json::from_value(serde_json::json!({
            "target_area": "Seoul",
            "interests": ["K-pop"]
        }))
        .unwrap();
        assert_eq!(prefs.duration, "");
    }

    #[test]
    fn test_recommend_input_detects_chat() {
        assert_eq!(
            RecommendInput::from_body("\"명동 여행 추천해줘\"".as_bytes()).unwrap(),
            RecommendInput::Chat("명동 여행 추천해줘".to_string())
        );
        assert_eq!(
            RecommendInput::from_body(b"BTS spots in Seoul please").unwrap(),
            RecommendInput::Chat("BTS spots in Seoul please".to_string())
        );
        assert_eq!(
            RecommendInput::from_body(br#"{"message": "add a cafe"}"#).unwrap(),
            RecommendInput::Chat("add a cafe".to_string())
        );
    }

    #[test]
    fn test_recommend_input_detects_survey() {
        let input = RecommendInput::from_body(br#"{"target_area": "Busan"}"#).unwrap();
        assert!(matches!(input, RecommendInput::Survey(ref prefs) if prefs.target_area == "Busan"));
        assert_eq!(input.preferences().target_area, "Busan");
        assert_eq!(
            RecommendInput::Chat("hi".to_string()).preferences(),
            UserPreferences::default()
        );
    }

    #[test]
    fn test_recommend_input_rejects_broken_json_and_blank_text() {
        assert!(RecommendInput::from_body(b"{not json").is_err());
        assert!(RecommendInput::from_body(b"   ").is_err());
        assert!(RecommendInput::from_body(b"\"\"").is_err());
        assert!(RecommendInput::from_body(br#"{"interests": "K-pop"}"#).is_err());
    }
}
