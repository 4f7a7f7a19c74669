use log::{debug, warn};
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::Arc;

use crate::models::preferences::UserPreferences;
use crate::services::oracle::{Oracle, OracleError, OracleRequest};
use crate::services::response_validator::strip_code_fences;

/// Used when nothing at all could be extracted from a survey.
pub const DEFAULT_KEYWORDS: [&str; 2] = ["Seoul", "tour"];
const CHAT_FALLBACK: &str = "Seoul";
const MAX_CHAT_FALLBACK_CHARS: usize = 20;

/// Terms too generic to narrow a substring search.
const STOP_WORDS: [&str; 16] = [
    "travel",
    "trip",
    "itinerary",
    "recommend",
    "recommendation",
    "course",
    "korea",
    "k-culture",
    "place",
    "places",
    "spot",
    "여행",
    "추천",
    "코스",
    "장소",
    "한국",
];

/// Request phrasing stripped from chat messages before they are used as a
/// search term directly.
const CHAT_FILLERS: [&str; 7] = [
    "추천해줘",
    "만들어줘",
    "추천",
    "여행",
    "코스",
    "please",
    "recommend",
];

const EXTRACTION_PROMPT: &str = r#"You extract search keywords for a Korean travel database.
Read the user's input and return between 1 and 5 keywords: proper nouns (artists, groups, dramas, movies, neighborhoods, landmarks) or concrete topics (street food, hanok, night view).
Prefer the names as they would appear in a place description. Do not return generic words such as "travel", "trip" or "recommend".
Reply with a JSON list of strings only, for example: ["BTS", "Hongdae", "street food"]"#;

/// Search terms for survey interest tags. Unknown tags are searched as-is.
pub fn interest_terms(tag: &str) -> Vec<String> {
    let terms: &[&str] = match tag.trim().to_lowercase().as_str() {
        "k-pop" | "kpop" => &["BTS", "K-pop", "idol", "HYBE"],
        "k-drama" | "kdrama" | "drama" => &["drama", "K-drama"],
        "k-movie" | "movie" | "film" => &["movie", "film"],
        "k-food" | "food" => &["restaurant", "food", "맛집"],
        "landmarks" | "landmark" => &["palace", "tower", "landmark"],
        _ => return vec![tag.trim().to_string()],
    };
    terms.iter().map(|term| term.to_string()).collect()
}

/// Insertion-ordered keyword set with case-insensitive identity. The first
/// spelling seen is kept.
#[derive(Debug, Clone, Default)]
pub struct KeywordSet {
    terms: Vec<String>,
    seen: HashSet<String>,
}

impl KeywordSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, term: &str) -> bool {
        let term = term.trim();
        if term.is_empty() {
            return false;
        }
        if self.seen.insert(term.to_lowercase()) {
            self.terms.push(term.to_string());
            true
        } else {
            false
        }
    }

    pub fn extend<I, S>(&mut self, terms: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for term in terms {
            self.insert(term.as_ref());
        }
    }

    pub fn remove_stop_words(&mut self) {
        self.terms
            .retain(|term| !STOP_WORDS.contains(&term.to_lowercase().as_str()));
        self.seen = self.terms.iter().map(|term| term.to_lowercase()).collect();
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn into_vec(self) -> Vec<String> {
        self.terms
    }
}

/// Keywords derivable from the survey without the generator: mapped interest
/// tags, a concrete target area and the optional bias hint.
pub fn static_keywords(prefs: &UserPreferences) -> KeywordSet {
    let mut set = KeywordSet::new();
    for interest in &prefs.interests {
        set.extend(interest_terms(interest));
    }
    if let Some(area) = prefs.concrete_area() {
        set.insert(area);
    }
    if let Some(bias) = &prefs.bias {
        set.insert(bias);
    }
    set
}

/// Short search term made from a raw chat message.
pub fn chat_fallback_term(message: &str) -> String {
    let mut term = message.to_string();
    for filler in CHAT_FILLERS {
        term = term.replace(filler, " ");
    }
    let term = term.split_whitespace().collect::<Vec<_>>().join(" ");
    let term: String = term.chars().take(MAX_CHAT_FALLBACK_CHARS).collect();
    let term = term.trim().to_string();

    if term.is_empty() {
        CHAT_FALLBACK.to_string()
    } else {
        term
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum KeywordReply {
    List(Vec<String>),
    Wrapped { keywords: Vec<String> },
}

fn parse_keyword_reply(raw: &str) -> Result<Vec<String>, OracleError> {
    let cleaned = strip_code_fences(raw);
    match serde_json::from_str::<KeywordReply>(&cleaned) {
        Ok(KeywordReply::List(keywords)) | Ok(KeywordReply::Wrapped { keywords }) => Ok(keywords),
        Err(e) => Err(OracleError::Parse(format!(
            "Keyword reply is not a JSON list: {}",
            e
        ))),
    }
}

/// Turns a survey or a chat message into the keyword set used for retrieval.
pub struct KeywordExtractor {
    oracle: Arc<dyn Oracle>,
}

impl KeywordExtractor {
    pub fn new(oracle: Arc<dyn Oracle>) -> Self {
        Self { oracle }
    }

    pub async fn from_preferences(&self, prefs: &UserPreferences) -> Vec<String> {
        let static_set = static_keywords(prefs);
        let input = serde_json::to_string(prefs).unwrap_or_else(|_| prefs.target_area.clone());

        match self.ask_oracle(&input).await {
            Ok(mined) => {
                let mut set = static_set.clone();
                set.extend(mined);
                set.remove_stop_words();
                if set.is_empty() {
                    return Self::survey_fallback(static_set);
                }
                debug!("Survey keywords: {:?}", set);
                set.into_vec()
            }
            Err(e) => {
                warn!("Keyword extraction failed, using survey keywords only: {}", e);
                Self::survey_fallback(static_set)
            }
        }
    }

    pub async fn from_chat(&self, message: &str) -> Vec<String> {
        match self.ask_oracle(message).await {
            Ok(mined) => {
                let mut set = KeywordSet::new();
                set.extend(mined);
                set.remove_stop_words();
                if set.is_empty() {
                    return vec![chat_fallback_term(message)];
                }
                debug!("Chat keywords: {:?}", set);
                set.into_vec()
            }
            Err(e) => {
                warn!("Keyword extraction failed for chat message: {}", e);
                vec![chat_fallback_term(message)]
            }
        }
    }

    fn survey_fallback(mut static_set: KeywordSet) -> Vec<String> {
        static_set.remove_stop_words();
        if static_set.is_empty() {
            DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect()
        } else {
            static_set.into_vec()
        }
    }

    async fn ask_oracle(&self, input: &str) -> Result<Vec<String>, OracleError> {
        let request = OracleRequest::new(EXTRACTION_PROMPT, input).temperature(0.0);
        let reply = self.oracle.complete(request).await?;
        parse_keyword_reply(&reply)
    }
}
