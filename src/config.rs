use std::env;

const HOST: &str = "0.0.0.0";
const PORT: u16 = 8080;
const MONGODB_URI: &str = "mongodb://localhost:27017";
const DATABASE: &str = "ktrip";
const DEFAULT_DEPLOYMENT: &str = "gpt-4o-mini";
const DEFAULT_API_VERSION: &str = "2024-02-01";

/// Process-level settings read once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub mongodb_uri: String,
    pub database: String,
    pub oracle: OracleConfig,
    pub azure_maps_key: String,
    pub doc_endpoint: Option<String>,
    pub doc_key: Option<String>,
    pub photo_bucket: Option<String>,
}

/// Credentials for the Azure OpenAI deployment.
#[derive(Debug, Clone, Default)]
pub struct OracleConfig {
    pub api_key: Option<String>,
    pub endpoint: Option<String>,
    pub deployment: String,
    pub api_version: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            host: env::var("HOST").unwrap_or_else(|_| HOST.to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(PORT),
            mongodb_uri: env::var("MONGODB_URI").unwrap_or_else(|_| MONGODB_URI.to_string()),
            database: env::var("KTRIP_DATABASE").unwrap_or_else(|_| DATABASE.to_string()),
            oracle: OracleConfig::from_env(),
            azure_maps_key: env::var("AZURE_MAPS_KEY").unwrap_or_default(),
            doc_endpoint: non_empty_var("AZURE_DOC_ENDPOINT"),
            doc_key: non_empty_var("AZURE_DOC_KEY"),
            photo_bucket: non_empty_var("PHOTO_BUCKET"),
        }
    }
}

impl OracleConfig {
    pub fn from_env() -> Self {
        Self {
            api_key: non_empty_var("AZURE_OPENAI_KEY"),
            endpoint: non_empty_var("AZURE_OPENAI_ENDPOINT"),
            deployment: non_empty_var("AZURE_OPENAI_DEPLOYMENT_NAME")
                .unwrap_or_else(|| DEFAULT_DEPLOYMENT.to_string()),
            api_version: non_empty_var("AZURE_OPENAI_API_VERSION")
                .unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
        }
    }
}

/// Limits applied by the retriever and categorizer.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievalSettings {
    /// Row cap for each per-keyword substring query.
    pub per_keyword_limit: usize,
    /// Below this many unique candidates a random sample is mixed in.
    pub min_candidates: usize,
    /// Size of that random sample.
    pub fallback_sample: usize,
    pub meal_cap: usize,
    pub cafe_cap: usize,
    pub tour_cap: usize,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            per_keyword_limit: 20,
            min_candidates: 30,
            fallback_sample: 50,
            meal_cap: 25,
            cafe_cap: 15,
            tour_cap: 25,
        }
    }
}

impl RetrievalSettings {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            per_keyword_limit: parsed_var("RETRIEVAL_PER_KEYWORD_LIMIT")
                .unwrap_or(defaults.per_keyword_limit),
            min_candidates: parsed_var("RETRIEVAL_MIN_CANDIDATES")
                .unwrap_or(defaults.min_candidates),
            fallback_sample: parsed_var("RETRIEVAL_FALLBACK_SAMPLE")
                .unwrap_or(defaults.fallback_sample),
            meal_cap: parsed_var("DIGEST_MEAL_CAP").unwrap_or(defaults.meal_cap),
            cafe_cap: parsed_var("DIGEST_CAFE_CAP").unwrap_or(defaults.cafe_cap),
            tour_cap: parsed_var("DIGEST_TOUR_CAP").unwrap_or(defaults.tour_cap),
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

pub(crate) fn parsed_var<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|s| s.trim().parse().ok())
}
