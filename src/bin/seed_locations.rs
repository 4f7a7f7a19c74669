//! Loads the location table from the place export.
//!
//! Usage: `seed-locations <locations.csv | locations.json>`
//!
//! The CSV export uses Korean headers (장소명, 주소, 위도, 경도, 제목,
//! 미디어타입, 장소설명, 장소타입); blank cells become empty strings. A `.json`
//! file holds an array of objects with the `locations` field names instead.
//! The collection is dropped and rebuilt with sequential ids.

use bson::doc;
use env_logger::Env;
use log::{error, info, warn};
use serde::Deserialize;
use std::path::Path;
use std::process::ExitCode;
use thiserror::Error;

use ktrip_api::config::AppConfig;
use ktrip_api::db::locations::LOCATIONS_COLLECTION;
use ktrip_api::db::{mongo::create_mongo_client, MongoVisitCounter};
use ktrip_api::models::location::LocationRecord;

/// Counters created when the visit table is first set up.
const INITIAL_VISITS: [(&str, i64); 2] = [("Gyeongbokgung", 10), ("N Seoul Tower", 5)];

const NAME_COLUMN: &str = "장소명";

#[derive(Debug, Error)]
enum SeedError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Missing column '{0}' in the CSV header")]
    MissingColumn(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum SourceFormat {
    Csv,
    Json,
}

impl SourceFormat {
    fn from_path(path: &str) -> Self {
        match Path::new(path).extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => SourceFormat::Json,
            _ => SourceFormat::Csv,
        }
    }
}

/// One row of the Korean-header CSV export.
#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(rename = "장소명", default)]
    name: String,
    #[serde(rename = "주소", default)]
    address: String,
    #[serde(rename = "위도", default, deserialize_with = "csv::invalid_option")]
    lat: Option<f64>,
    #[serde(rename = "경도", default, deserialize_with = "csv::invalid_option")]
    lng: Option<f64>,
    #[serde(rename = "제목", default)]
    media_title: String,
    #[serde(rename = "미디어타입", default)]
    media_type: String,
    #[serde(rename = "장소설명", default)]
    description: String,
    #[serde(rename = "장소타입", default)]
    place_type: String,
}

impl From<CsvRow> for LocationRecord {
    fn from(row: CsvRow) -> Self {
        LocationRecord {
            id: None,
            name: row.name,
            address: row.address,
            lat: row.lat.unwrap_or_default(),
            lng: row.lng.unwrap_or_default(),
            media_title: row.media_title,
            media_type: row.media_type,
            description: row.description,
            place_type: Some(row.place_type).filter(|place_type| !place_type.is_empty()),
        }
    }
}

/// Keeps named rows and numbers them from 1.
fn push_named(records: &mut Vec<LocationRecord>, index: usize, mut record: LocationRecord) {
    if record.name.trim().is_empty() {
        warn!("Row {} has no name, skipped", index);
        return;
    }
    record.id = Some(records.len() as i64 + 1);
    records.push(record);
}

fn parse_csv_rows(raw: &str) -> Result<Vec<LocationRecord>, SeedError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(raw.trim_start_matches('\u{feff}').as_bytes());

    if !reader.headers()?.iter().any(|header| header == NAME_COLUMN) {
        return Err(SeedError::MissingColumn(NAME_COLUMN));
    }

    let mut records = Vec::new();
    for (index, row) in reader.deserialize::<CsvRow>().enumerate() {
        match row {
            Ok(row) => push_named(&mut records, index, row.into()),
            Err(e) => warn!("Row {} could not be read: {}", index, e),
        }
    }
    Ok(records)
}

/// Parses each array element on its own so one bad row does not sink the
/// import.
fn parse_json_rows(raw: &str) -> Result<Vec<LocationRecord>, SeedError> {
    let values: Vec<serde_json::Value> = serde_json::from_str(raw)?;
    let mut records = Vec::with_capacity(values.len());
    for (index, value) in values.into_iter().enumerate() {
        match serde_json::from_value::<LocationRecord>(value) {
            Ok(record) => push_named(&mut records, index, record),
            Err(e) => warn!("Row {} could not be read: {}", index, e),
        }
    }
    Ok(records)
}

fn parse_rows(format: SourceFormat, raw: &str) -> Result<Vec<LocationRecord>, SeedError> {
    match format {
        SourceFormat::Csv => parse_csv_rows(raw),
        SourceFormat::Json => parse_json_rows(raw),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let Some(path) = std::env::args().nth(1) else {
        error!("Usage: seed-locations <locations.csv | locations.json>");
        return ExitCode::FAILURE;
    };

    let raw = match std::fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(e) => {
            error!("Cannot read {}: {}", path, e);
            return ExitCode::FAILURE;
        }
    };
    let records = match parse_rows(SourceFormat::from_path(&path), &raw) {
        Ok(records) => records,
        Err(e) => {
            error!("{} could not be loaded: {}", path, e);
            return ExitCode::FAILURE;
        }
    };
    info!("Loaded {} locations from {}", records.len(), path);

    let config = AppConfig::from_env();
    let client = match create_mongo_client(&config.mongodb_uri).await {
        Ok(client) => client,
        Err(e) => {
            error!("MongoDB connection failed: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let collection = client
        .database(&config.database)
        .collection::<LocationRecord>(LOCATIONS_COLLECTION);
    if let Err(e) = collection.drop().await {
        error!("Failed to drop {}: {}", LOCATIONS_COLLECTION, e);
        return ExitCode::FAILURE;
    }
    if !records.is_empty() {
        if let Err(e) = collection.insert_many(&records).await {
            error!("Failed to insert locations: {}", e);
            return ExitCode::FAILURE;
        }
    }
    match collection.count_documents(doc! {}).await {
        Ok(count) => info!("Stored {} locations in {}", count, LOCATIONS_COLLECTION),
        Err(e) => warn!("Stored locations but could not count them: {}", e),
    }

    let visits = MongoVisitCounter::new(&client, &config.database);
    for (place, count) in INITIAL_VISITS {
        if let Err(e) = visits.seed(place, count).await {
            warn!("Could not seed visit counter for {}: {}", place, e);
        }
    }
    info!("Visit counters ready");

    ExitCode::SUCCESS
}
