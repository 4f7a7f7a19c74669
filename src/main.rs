use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use env_logger::Env;
use log::{info, warn};

use ktrip_api::config::{AppConfig, RetrievalSettings};
use ktrip_api::db::{self, LocationStore, MongoLocationStore, MongoVisitCounter, VisitCounter};
use ktrip_api::routes;
use ktrip_api::services::image_service::{GcsPhotoStore, PhotoStore};
use ktrip_api::services::itinerary_planner::ItineraryPlanner;
use ktrip_api::services::menu_service::{AzureDocumentReader, MenuAnalyzer, TextRecognizer};
use ktrip_api::services::oracle::{AzureOpenAiOracle, Oracle, UnconfiguredOracle};
use ktrip_api::services::retrieval_service::RelevanceWeights;
use ktrip_api::state::AppState;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if cfg!(debug_assertions) {
        dotenv::dotenv().ok();
    }

    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let config = AppConfig::from_env();
    info!("Attempting to bind to {}:{}", config.host, config.port);

    let oracle: Arc<dyn Oracle> = match AzureOpenAiOracle::from_config(&config.oracle) {
        Ok(oracle) => Arc::new(oracle),
        Err(e) => {
            warn!("Oracle not available: {}. Recommendations will return errors.", e);
            Arc::new(UnconfiguredOracle::new(e.to_string()))
        }
    };

    let client = db::mongo::create_mongo_client(&config.mongodb_uri)
        .await
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
    let store: Arc<dyn LocationStore> =
        Arc::new(MongoLocationStore::new(&client, &config.database));
    let visits: Arc<dyn VisitCounter> =
        Arc::new(MongoVisitCounter::new(&client, &config.database));

    let photos: Option<Arc<dyn PhotoStore>> = match &config.photo_bucket {
        Some(bucket) => match GcsPhotoStore::new(bucket.clone()).await {
            Ok(store) => Some(Arc::new(store)),
            Err(e) => {
                warn!("Photo storage not available: {}", e);
                None
            }
        },
        None => None,
    };

    let recognizer: Option<Arc<dyn TextRecognizer>> = match (&config.doc_endpoint, &config.doc_key) {
        (Some(endpoint), Some(key)) => Some(Arc::new(AzureDocumentReader::new(endpoint, key))),
        _ => None,
    };

    let state = web::Data::new(AppState {
        planner: ItineraryPlanner::new(
            oracle.clone(),
            store.clone(),
            RelevanceWeights::from_env(),
            RetrievalSettings::from_env(),
        ),
        menu: MenuAnalyzer::new(recognizer, oracle),
        store,
        visits,
        photos,
        azure_maps_key: config.azure_maps_key.clone(),
    });

    info!("Starting HTTP server...");

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .app_data(state.clone())
            .configure(routes::configure)
    })
    .bind((config.host.clone(), config.port))?
    .run()
    .await
}
