use async_trait::async_trait;
use bson::{doc, Document};
use futures::TryStreamExt;
use log::warn;
use mongodb::{Client, Collection};
use rand::seq::SliceRandom;

use super::StoreError;
use crate::models::location::LocationRecord;

pub const LOCATIONS_COLLECTION: &str = "locations";

/// Read-only access to the point-of-interest table.
#[async_trait]
pub trait LocationStore: Send + Sync {
    /// Rows whose name, media title or description contains `keyword`
    /// (case-insensitive), at most `limit` of them.
    async fn search(&self, keyword: &str, limit: usize) -> Result<Vec<LocationRecord>, StoreError>;

    /// Up to `size` rows in no particular order.
    async fn sample(&self, size: usize) -> Result<Vec<LocationRecord>, StoreError>;

    async fn count(&self) -> Result<u64, StoreError>;
}

pub struct MongoLocationStore {
    collection: Collection<LocationRecord>,
}

impl MongoLocationStore {
    pub fn new(client: &Client, database: &str) -> Self {
        Self {
            collection: client.database(database).collection(LOCATIONS_COLLECTION),
        }
    }

    fn substring_filter(keyword: &str) -> Document {
        let pattern = regex::escape(keyword);
        doc! {
            "$or": [
                { "name": { "$regex": &pattern, "$options": "i" } },
                { "media_title": { "$regex": &pattern, "$options": "i" } },
                { "description": { "$regex": &pattern, "$options": "i" } },
            ]
        }
    }
}

#[async_trait]
impl LocationStore for MongoLocationStore {
    async fn search(&self, keyword: &str, limit: usize) -> Result<Vec<LocationRecord>, StoreError> {
        let cursor = self
            .collection
            .find(Self::substring_filter(keyword))
            .limit(limit as i64)
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn sample(&self, size: usize) -> Result<Vec<LocationRecord>, StoreError> {
        let pipeline = vec![doc! { "$sample": { "size": size as i64 } }];
        let cursor = self.collection.aggregate(pipeline).await?;
        let documents: Vec<Document> = cursor.try_collect().await?;

        Ok(documents
            .into_iter()
            .filter_map(|document| match bson::from_document(document) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!("Skipping unreadable location row: {}", e);
                    None
                }
            })
            .collect())
    }

    async fn count(&self) -> Result<u64, StoreError> {
        Ok(self.collection.count_documents(doc! {}).await?)
    }
}

/// Location table held in memory, used for tests and local runs without a
/// database.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLocationStore {
    records: Vec<LocationRecord>,
}

impl InMemoryLocationStore {
    pub fn new(records: Vec<LocationRecord>) -> Self {
        Self { records }
    }
}

#[async_trait]
impl LocationStore for InMemoryLocationStore {
    async fn search(&self, keyword: &str, limit: usize) -> Result<Vec<LocationRecord>, StoreError> {
        Ok(self
            .records
            .iter()
            .filter(|record| record.matches_keyword(keyword))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn sample(&self, size: usize) -> Result<Vec<LocationRecord>, StoreError> {
        let sampled = {
            let mut rng = rand::thread_rng();
            self.records
                .choose_multiple(&mut rng, size)
                .cloned()
                .collect()
        };
        Ok(sampled)
    }

    async fn count(&self) -> Result<u64, StoreError> {
        Ok(self.records.len() as u64)
    }
}
