use async_trait::async_trait;
use bson::doc;
use mongodb::{options::ReturnDocument, Client, Collection};
use std::collections::HashMap;
use tokio::sync::Mutex;

use super::StoreError;
use crate::models::visit::VisitedSpot;

pub const VISITS_COLLECTION: &str = "visited_spots";

/// Per-place check-in counters.
#[async_trait]
pub trait VisitCounter: Send + Sync {
    /// Adds one visit and returns the new total. Unknown places start at zero.
    async fn increment(&self, place_name: &str) -> Result<i64, StoreError>;

    /// Current total, zero for places nobody has checked in at.
    async fn count(&self, place_name: &str) -> Result<i64, StoreError>;
}

pub struct MongoVisitCounter {
    collection: Collection<VisitedSpot>,
}

impl MongoVisitCounter {
    pub fn new(client: &Client, database: &str) -> Self {
        Self {
            collection: client.database(database).collection(VISITS_COLLECTION),
        }
    }

    /// Creates the counter with `count` unless it already exists.
    pub async fn seed(&self, place_name: &str, count: i64) -> Result<(), StoreError> {
        self.collection
            .update_one(
                doc! { "_id": place_name },
                doc! { "$setOnInsert": { "count": count } },
            )
            .upsert(true)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl VisitCounter for MongoVisitCounter {
    async fn increment(&self, place_name: &str) -> Result<i64, StoreError> {
        let updated = self
            .collection
            .find_one_and_update(doc! { "_id": place_name }, doc! { "$inc": { "count": 1 } })
            .upsert(true)
            .return_document(ReturnDocument::After)
            .await?;

        updated.map(|spot| spot.count).ok_or_else(|| {
            StoreError::Unavailable(format!("Counter for '{}' was not written", place_name))
        })
    }

    async fn count(&self, place_name: &str) -> Result<i64, StoreError> {
        let spot = self
            .collection
            .find_one(doc! { "_id": place_name })
            .await?;
        Ok(spot.map(|spot| spot.count).unwrap_or(0))
    }
}

#[derive(Debug, Default)]
pub struct InMemoryVisitCounter {
    counts: Mutex<HashMap<String, i64>>,
}

impl InMemoryVisitCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_counts(counts: impl IntoIterator<Item = (String, i64)>) -> Self {
        Self {
            counts: Mutex::new(counts.into_iter().collect()),
        }
    }
}

#[async_trait]
impl VisitCounter for InMemoryVisitCounter {
    async fn increment(&self, place_name: &str) -> Result<i64, StoreError> {
        let mut counts = self.counts.lock().await;
        let count = counts.entry(place_name.to_string()).or_insert(0);
        *count += 1;
        Ok(*count)
    }

    async fn count(&self, place_name: &str) -> Result<i64, StoreError> {
        let counts = self.counts.lock().await;
        Ok(counts.get(place_name).copied().unwrap_or(0))
    }
}
