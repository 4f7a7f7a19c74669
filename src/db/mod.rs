pub mod locations;
pub mod mongo;
pub mod visits;

use thiserror::Error;

pub use locations::{InMemoryLocationStore, LocationStore, MongoLocationStore};
pub use visits::{InMemoryVisitCounter, MongoVisitCounter, VisitCounter};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}
