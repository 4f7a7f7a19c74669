use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

use crate::config::{parsed_var, RetrievalSettings};
use crate::db::{LocationStore, StoreError};
use crate::models::location::{LocationRecord, ScoredCandidate};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelevanceWeights {
    /// Keyword found in the place name
    pub name_keyword: i32,
    /// Keyword found in the related drama/movie/artist title
    pub media_keyword: i32,
    /// Keyword found in the free-text description
    pub description_keyword: i32,
    /// Survey interest found in the media title
    pub media_interest: i32,
    /// Survey interest found in the description
    pub description_interest: i32,
}

impl Default for RelevanceWeights {
    fn default() -> Self {
        Self {
            name_keyword: 3,
            media_keyword: 5,
            description_keyword: 2,
            media_interest: 4,
            description_interest: 2,
        }
    }
}

impl RelevanceWeights {
    /// Weights from environment variables, defaulting field by field.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            name_keyword: parsed_var("RELEVANCE_NAME_KEYWORD").unwrap_or(defaults.name_keyword),
            media_keyword: parsed_var("RELEVANCE_MEDIA_KEYWORD").unwrap_or(defaults.media_keyword),
            description_keyword: parsed_var("RELEVANCE_DESCRIPTION_KEYWORD")
                .unwrap_or(defaults.description_keyword),
            media_interest: parsed_var("RELEVANCE_MEDIA_INTEREST")
                .unwrap_or(defaults.media_interest),
            description_interest: parsed_var("RELEVANCE_DESCRIPTION_INTEREST")
                .unwrap_or(defaults.description_interest),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RelevanceScorer {
    pub weights: RelevanceWeights,
}

impl RelevanceScorer {
    pub fn with_weights(weights: RelevanceWeights) -> Self {
        Self { weights }
    }

    /// Sum of every matching contribution; a record hit by three keywords
    /// scores three times.
    pub fn score(&self, location: &LocationRecord, keywords: &[String], interests: &[String]) -> i32 {
        let name = location.name.to_lowercase();
        let media = location.media_title.to_lowercase();
        let description = location.description.to_lowercase();
        let mut score = 0;

        for keyword in keywords.iter().map(|k| k.to_lowercase()) {
            if keyword.is_empty() {
                continue;
            }
            if name.contains(&keyword) {
                score += self.weights.name_keyword;
            }
            if media.contains(&keyword) {
                score += self.weights.media_keyword;
            }
            if description.contains(&keyword) {
                score += self.weights.description_keyword;
            }
        }

        for interest in interests.iter().map(|i| i.to_lowercase()) {
            if interest.is_empty() {
                continue;
            }
            if media.contains(&interest) {
                score += self.weights.media_interest;
            }
            if description.contains(&interest) {
                score += self.weights.description_interest;
            }
        }

        score
    }

    /// Scores and sorts by descending score. The sort is stable, so ties keep
    /// the order the rows were merged in.
    pub fn rank(
        &self,
        locations: Vec<LocationRecord>,
        keywords: &[String],
        interests: &[String],
    ) -> Vec<ScoredCandidate> {
        let mut scored: Vec<ScoredCandidate> = locations
            .into_iter()
            .map(|location| {
                let score = self.score(&location, keywords, interests);
                ScoredCandidate { location, score }
            })
            .collect();
        scored.sort_by(|a, b| b.score.cmp(&a.score));
        scored
    }
}

/// Drops later rows whose name was already seen. Idempotent.
pub fn dedupe_by_name(locations: Vec<LocationRecord>) -> Vec<LocationRecord> {
    let mut seen = HashSet::new();
    locations
        .into_iter()
        .filter(|location| seen.insert(location.name.clone()))
        .collect()
}

/// Result of one retrieval pass.
#[derive(Debug, Clone)]
pub struct Retrieval {
    pub candidates: Vec<ScoredCandidate>,
    /// True when keyword hits were too few and a random sample was mixed in.
    pub used_fallback: bool,
}

pub struct RelevanceRetriever {
    store: Arc<dyn LocationStore>,
    scorer: RelevanceScorer,
    settings: RetrievalSettings,
}

impl RelevanceRetriever {
    pub fn new(
        store: Arc<dyn LocationStore>,
        scorer: RelevanceScorer,
        settings: RetrievalSettings,
    ) -> Self {
        Self {
            store,
            scorer,
            settings,
        }
    }

    pub fn settings(&self) -> &RetrievalSettings {
        &self.settings
    }

    /// One capped substring query per keyword, merged and deduplicated by
    /// name. Falls back to a random sample when fewer than
    /// `min_candidates` unique rows matched.
    pub async fn retrieve(
        &self,
        keywords: &[String],
        interests: &[String],
    ) -> Result<Retrieval, StoreError> {
        let mut merged = Vec::new();
        for keyword in keywords {
            let rows = self
                .store
                .search(keyword, self.settings.per_keyword_limit)
                .await?;
            debug!("Keyword '{}' matched {} rows", keyword, rows.len());
            merged.extend(rows);
        }

        let mut unique = dedupe_by_name(merged);
        let used_fallback = unique.len() < self.settings.min_candidates;
        if used_fallback {
            info!(
                "Only {} unique matches for {:?}, adding a random sample of {}",
                unique.len(),
                keywords,
                self.settings.fallback_sample
            );
            unique.extend(self.store.sample(self.settings.fallback_sample).await?);
            unique = dedupe_by_name(unique);
        }

        let candidates = self.scorer.rank(unique, keywords, interests);
        info!(
            "Retrieved {} candidates (fallback: {})",
            candidates.len(),
            used_fallback
        );

        Ok(Retrieval {
            candidates,
            used_fallback,
        })
    }
}
