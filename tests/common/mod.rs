#![allow(dead_code)]

use actix_web::{web, App};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use ktrip_api::config::RetrievalSettings;
use ktrip_api::db::{InMemoryLocationStore, InMemoryVisitCounter, LocationStore, VisitCounter};
use ktrip_api::models::location::LocationRecord;
use ktrip_api::routes;
use ktrip_api::services::image_service::{PhotoStore, StorageError};
use ktrip_api::services::itinerary_planner::ItineraryPlanner;
use ktrip_api::services::menu_service::MenuAnalyzer;
use ktrip_api::services::oracle::{Oracle, OracleError, OracleRequest, UnconfiguredOracle};
use ktrip_api::services::retrieval_service::RelevanceWeights;
use ktrip_api::state::AppState;

/// Oracle stub: keyword prompts get `keywords`, everything else gets
/// `itinerary`. Every request is recorded.
pub struct ScriptedOracle {
    pub keywords: String,
    pub itinerary: Result<String, String>,
    pub requests: Mutex<Vec<OracleRequest>>,
}

impl ScriptedOracle {
    pub fn new(keywords: &str, itinerary: &str) -> Self {
        Self {
            keywords: keywords.to_string(),
            itinerary: Ok(itinerary.to_string()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(keywords: &str, error: &str) -> Self {
        Self {
            keywords: keywords.to_string(),
            itinerary: Err(error.to_string()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn generation_requests(&self) -> Vec<OracleRequest> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|request| !is_keyword_prompt(request))
            .cloned()
            .collect()
    }
}

fn is_keyword_prompt(request: &OracleRequest) -> bool {
    request.system_prompt().contains("extract search keywords")
}

#[async_trait]
impl Oracle for ScriptedOracle {
    async fn complete(&self, request: OracleRequest) -> Result<String, OracleError> {
        let keyword_prompt = is_keyword_prompt(&request);
        self.requests.lock().unwrap().push(request);
        if keyword_prompt {
            return Ok(self.keywords.clone());
        }
        self.itinerary
            .clone()
            .map_err(OracleError::Network)
    }
}

pub struct RecordingPhotoStore {
    pub uploads: Mutex<Vec<(String, usize, String)>>,
}

impl RecordingPhotoStore {
    pub fn new() -> Self {
        Self {
            uploads: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl PhotoStore for RecordingPhotoStore {
    async fn upload(
        &self,
        place_name: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StorageError> {
        ktrip_api::services::image_service::file_extension(content_type)?;
        self.uploads
            .lock()
            .unwrap()
            .push((place_name.to_string(), bytes.len(), content_type.to_string()));
        Ok(format!("https://photos.test/{}", place_name))
    }
}

pub fn location(name: &str, media_title: &str, description: &str, place_type: &str) -> LocationRecord {
    LocationRecord {
        name: name.to_string(),
        address: "Seoul".to_string(),
        lat: 37.55,
        lng: 126.98,
        media_title: media_title.to_string(),
        media_type: "drama".to_string(),
        description: description.to_string(),
        place_type: Some(place_type.to_string()),
        ..Default::default()
    }
}

/// A small Seoul table with a handful of each category.
pub fn seoul_locations() -> Vec<LocationRecord> {
    vec![
        location("Gwangjang Market", "Running Man", "Famous street food market", "restaurant"),
        location("Tosokchon Samgyetang", "", "Ginseng chicken soup near the palace", "식당"),
        location("Hybe Insight", "BTS", "Museum of the BTS label", "place"),
        location("Gyeongbokgung Palace", "Kingdom", "Joseon royal palace", "place"),
        location("Bukchon Hanok Village", "Goblin", "Traditional hanok alleys", "place"),
        location("Cafe Onion Anguk", "", "Hanok bakery cafe", "cafe"),
        location("Deoksugung", "Mr. Sunshine", "Palace next to City Hall", "place"),
        location("Cafe Mamas City Hall", "", "Ricotta salad and coffee near City Hall", "cafe"),
    ]
}

pub struct TestApp {
    pub oracle: Arc<dyn Oracle>,
    pub store: Arc<dyn LocationStore>,
    pub visits: Arc<dyn VisitCounter>,
    pub photos: Option<Arc<dyn PhotoStore>>,
    pub settings: RetrievalSettings,
}

impl TestApp {
    pub fn new(oracle: Arc<dyn Oracle>) -> Self {
        Self {
            oracle,
            store: Arc::new(InMemoryLocationStore::new(seoul_locations())),
            visits: Arc::new(InMemoryVisitCounter::new()),
            photos: None,
            settings: RetrievalSettings {
                min_candidates: 3,
                fallback_sample: 5,
                ..Default::default()
            },
        }
    }

    pub fn unconfigured() -> Self {
        Self::new(Arc::new(UnconfiguredOracle::new("AZURE_OPENAI_KEY not set")))
    }

    pub fn with_photos(mut self, photos: Arc<dyn PhotoStore>) -> Self {
        self.photos = Some(photos);
        self
    }

    pub fn state(&self) -> web::Data<AppState> {
        web::Data::new(AppState {
            planner: ItineraryPlanner::new(
                self.oracle.clone(),
                self.store.clone(),
                RelevanceWeights::default(),
                self.settings.clone(),
            ),
            menu: MenuAnalyzer::new(None, self.oracle.clone()),
            store: self.store.clone(),
            visits: self.visits.clone(),
            photos: self.photos.clone(),
            azure_maps_key: "test-maps-key".to_string(),
        })
    }

    pub fn create_app(
        &self,
    ) -> App<
        impl actix_web::dev::ServiceFactory<
            actix_web::dev::ServiceRequest,
            Config = (),
            Response = actix_web::dev::ServiceResponse<actix_web::body::BoxBody>,
            Error = actix_web::Error,
            InitError = (),
        >,
    > {
        App::new()
            .app_data(self.state())
            .configure(routes::configure)
    }
}

pub fn survey(duration: &str) -> serde_json::Value {
    serde_json::json!({
        "target_area": "Seoul",
        "duration": duration,
        "pace": "Balanced",
        "companion": "Solo",
        "interests": ["K-pop", "K-drama"],
        "k_content_ratio": "Mostly",
        "food_preference": "Spicy OK",
        "need_cafe": "Must",
        "photo_priority": "Very Important",
        "record_method": "Insta-story"
    })
}

pub fn one_day_reply() -> String {
    serde_json::json!({
        "message": "A K-culture day in Jongno",
        "spots": [
            {"name": "Gwangjang Market(Lunch)", "description": "Street food", "lat": 37.57, "lng": 126.99, "media_title": "Running Man", "tips": "Try bindaetteok"},
            {"name": "Gyeongbokgung Palace(Tour)", "description": "Royal palace", "lat": 37.57, "lng": 126.97, "media_title": "Kingdom", "tips": "Closed Tuesdays"},
            {"name": "Cafe Onion Anguk(Cafe)", "description": "Hanok cafe", "lat": 37.57, "lng": 126.98, "media_title": "", "tips": "Pandoro with a latte"},
            {"name": "Bukchon Hanok Village(Tour)", "description": "Hanok alleys", "lat": 37.58, "lng": 126.98, "media_title": "Goblin", "tips": "Keep quiet, residents live here"},
            {"name": "Tosokchon Samgyetang(Dinner)", "description": "Ginseng soup", "lat": 37.57, "lng": 126.97, "media_title": "", "tips": "Order the black chicken"}
        ]
    })
    .to_string()
}
