use serde::{Deserialize, Serialize};

/// Row of the `visited_spots` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisitedSpot {
    #[serde(rename = "_id")]
    pub place_name: String,
    #[serde(default)]
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisitCountResponse {
    pub place_name: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckInResponse {
    pub place_name: String,
    pub count: i64,
    pub photo_url: Option<String>,
}
