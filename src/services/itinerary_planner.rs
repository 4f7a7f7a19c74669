use log::{error, info, warn};
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;

use crate::config::RetrievalSettings;
use crate::db::{LocationStore, StoreError};
use crate::models::itinerary::{ItineraryResponse, ItinerarySpot};
use crate::models::preferences::RecommendInput;
use crate::services::categorizer::CategorizedPool;
use crate::services::itinerary_sequencer::{
    compose_chat_recommendation_prompt, compose_modification_prompt, compose_recommendation_prompt,
    required_spot_count,
};
use crate::services::keyword_service::KeywordExtractor;
use crate::services::oracle::{Oracle, OracleError};
use crate::services::response_validator::{validate_itinerary, ValidationError};
use crate::services::retrieval_service::{RelevanceRetriever, RelevanceScorer, RelevanceWeights};

#[derive(Debug, Error)]
pub enum PlanError {
    #[error(transparent)]
    Oracle(#[from] OracleError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Runs the recommend and modify flows: keywords, retrieval, categorization,
/// one generation call, validation.
pub struct ItineraryPlanner {
    oracle: Arc<dyn Oracle>,
    extractor: KeywordExtractor,
    retriever: RelevanceRetriever,
}

impl ItineraryPlanner {
    pub fn new(
        oracle: Arc<dyn Oracle>,
        store: Arc<dyn LocationStore>,
        weights: RelevanceWeights,
        settings: RetrievalSettings,
    ) -> Self {
        Self {
            extractor: KeywordExtractor::new(oracle.clone()),
            retriever: RelevanceRetriever::new(
                store,
                RelevanceScorer::with_weights(weights),
                settings,
            ),
            oracle,
        }
    }

    pub fn oracle_configured(&self) -> bool {
        self.oracle.is_configured()
    }

    /// Never fails: any error becomes an empty itinerary with `error` set.
    pub async fn recommend(&self, input: &RecommendInput) -> ItineraryResponse {
        match self.try_recommend(input).await {
            Ok(response) => response,
            Err(e) => {
                error!("Recommendation failed: {}", e);
                ItineraryResponse::failed(e.to_string())
            }
        }
    }

    pub async fn try_recommend(&self, input: &RecommendInput) -> Result<ItineraryResponse, PlanError> {
        self.ensure_oracle()?;

        let prefs = input.preferences();
        let keywords = match input {
            RecommendInput::Survey(prefs) => self.extractor.from_preferences(prefs).await,
            RecommendInput::Chat(message) => self.extractor.from_chat(message).await,
        };
        info!("Recommendation keywords: {:?}", keywords);

        let retrieval = self.retriever.retrieve(&keywords, &prefs.interests).await?;
        let pool = CategorizedPool::build(retrieval.candidates, self.retriever.settings());
        if pool.is_empty() {
            warn!("No candidates for keywords {:?}, the generator gets empty lists", keywords);
        }
        info!(
            "Prompt pool: {} candidates ({} meals, {} cafes, {} tours)",
            pool.len(),
            pool.meals.len(),
            pool.cafes.len(),
            pool.tours.len()
        );

        let request = match input {
            RecommendInput::Survey(_) => compose_recommendation_prompt(&prefs, &pool),
            RecommendInput::Chat(message) => compose_chat_recommendation_prompt(message, &pool),
        };
        let reply = self.oracle.complete(request).await?;
        let validated = validate_itinerary(&reply, Some(required_spot_count(&prefs.duration)))?;

        Ok(ItineraryResponse {
            spots: validated.spots,
            message: validated.message,
            warning: validated.warning,
            error: None,
        })
    }

    /// Merges a follow-up request into `current`. On any failure the current
    /// itinerary comes back unchanged.
    pub async fn modify(&self, current: Vec<ItinerarySpot>, user_request: &str) -> ItineraryResponse {
        if user_request.trim().is_empty() {
            return ItineraryResponse::with_spots(current);
        }

        match self.try_modify(&current, user_request).await {
            Ok(response) if !response.spots.is_empty() => response,
            Ok(_) => {
                warn!("Modification returned no spots, keeping the current itinerary");
                ItineraryResponse::with_spots(current)
            }
            Err(e) => {
                warn!("Modification failed, keeping the current itinerary: {}", e);
                ItineraryResponse::with_spots(current)
            }
        }
    }

    pub async fn try_modify(
        &self,
        current: &[ItinerarySpot],
        user_request: &str,
    ) -> Result<ItineraryResponse, PlanError> {
        self.ensure_oracle()?;

        let keywords = self.extractor.from_chat(user_request).await;
        info!("Modification keywords: {:?}", keywords);

        let retrieval = self.retriever.retrieve(&keywords, &[]).await?;
        let pool = CategorizedPool::build(retrieval.candidates, self.retriever.settings());

        let request = compose_modification_prompt(current, user_request, &pool);
        let reply = self.oracle.complete(request).await?;
        let validated = validate_itinerary(&reply, None)?;

        Ok(ItineraryResponse {
            spots: dedupe_spots(validated.spots),
            message: validated.message,
            warning: None,
            error: None,
        })
    }

    fn ensure_oracle(&self) -> Result<(), OracleError> {
        if self.oracle.is_configured() {
            Ok(())
        } else {
            Err(OracleError::Config(
                "Azure OpenAI credentials are not configured".to_string(),
            ))
        }
    }
}

/// Keeps the first spot for each name.
fn dedupe_spots(spots: Vec<ItinerarySpot>) -> Vec<ItinerarySpot> {
    let mut seen = HashSet::new();
    spots
        .into_iter()
        .filter(|spot| seen.insert(spot.name.trim().to_string()))
        .collect()
}
