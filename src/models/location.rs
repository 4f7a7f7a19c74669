use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DefaultOnNull};

/// A point of interest from the `locations` table.
///
/// `name` is the natural key: two records with the same name are treated as
/// the same place when merging search results. Imported rows often carry nulls
/// in the free-text columns; those read back as empty strings.
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocationRecord {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub address: String,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub lat: f64,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub lng: f64,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub media_title: String,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub media_type: String,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub place_type: Option<String>,
}

impl LocationRecord {
    /// True when `keyword` occurs (case-insensitively) in one of the searchable
    /// text fields: name, media title or description.
    pub fn matches_keyword(&self, keyword: &str) -> bool {
        let needle = keyword.to_lowercase();
        if needle.is_empty() {
            return false;
        }
        self.name.to_lowercase().contains(&needle)
            || self.media_title.to_lowercase().contains(&needle)
            || self.description.to_lowercase().contains(&needle)
    }
}

/// A candidate with its relevance score against the current keyword set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredCandidate {
    pub location: LocationRecord,
    pub score: i32,
}
