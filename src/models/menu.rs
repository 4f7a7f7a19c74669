use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DefaultOnNull};

/// A translated menu entry.
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MenuItem {
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub korean: String,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub english: String,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub description: String,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub spicy_level: u8,
    /// Left untyped: generators return both numbers and strings like "3,500".
    #[serde(default)]
    pub price: serde_json::Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MenuAnalysis {
    #[serde(default)]
    pub foods: Vec<MenuItem>,
}
