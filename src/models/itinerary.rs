use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DefaultOnNull, DisplayFromStr, PickFirst};
use std::fmt;

/// Position a spot occupies in a day plan. The role is carried as a suffix on
/// the spot name, e.g. `"Gwangjang Market(Lunch)"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Lunch,
    Dinner,
    Meal,
    Tour,
    Cafe,
}

impl Role {
    pub fn label(&self) -> &'static str {
        match self {
            Role::Lunch => "Lunch",
            Role::Dinner => "Dinner",
            Role::Meal => "Meal",
            Role::Tour => "Tour",
            Role::Cafe => "Cafe",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "lunch" => Some(Role::Lunch),
            "dinner" => Some(Role::Dinner),
            "meal" => Some(Role::Meal),
            "tour" => Some(Role::Tour),
            "cafe" | "café" => Some(Role::Cafe),
            _ => None,
        }
    }

    pub fn is_meal(&self) -> bool {
        matches!(self, Role::Lunch | Role::Dinner | Role::Meal)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One stop of a generated itinerary, in the wire shape returned to clients.
///
/// Coordinates are whatever the generator produced; they are not checked
/// against the location table. Numeric strings such as `"37.57"` are read as
/// numbers.
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItinerarySpot {
    pub name: String,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub description: String,
    #[serde_as(deserialize_as = "DefaultOnNull<PickFirst<(_, DisplayFromStr)>>")]
    #[serde(default)]
    pub lat: f64,
    #[serde_as(deserialize_as = "DefaultOnNull<PickFirst<(_, DisplayFromStr)>>")]
    #[serde(default)]
    pub lng: f64,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub media_title: String,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default, alias = "tip")]
    pub tips: String,
}

impl ItinerarySpot {
    /// Role parsed from the trailing `(Role)` suffix of the name, if any.
    pub fn role(&self) -> Option<Role> {
        let name = self.name.trim_end();
        let inner = name.strip_suffix(')')?;
        let open = inner.rfind('(')?;
        Role::from_label(&inner[open + 1..])
    }
}

/// Body returned by `/api/recommend` and `/api/modify`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItineraryResponse {
    pub spots: Vec<ItinerarySpot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ItineraryResponse {
    pub fn with_spots(spots: Vec<ItinerarySpot>) -> Self {
        Self {
            spots,
            ..Default::default()
        }
    }

    /// Empty itinerary carrying an error message.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Default::default()
        }
    }
}

/// Body of `/api/modify`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ModifyRequest {
    #[serde(default)]
    pub current_spots: Vec<ItinerarySpot>,
    pub user_request: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_from_name_suffix() {
        let spot = |name: &str| ItinerarySpot {
            name: name.to_string(),
            ..Default::default()
        };

        assert_eq!(spot("Gwangjang Market(Lunch)").role(), Some(Role::Lunch));
        assert_eq!(spot("Cafe Onion (Cafe)").role(), Some(Role::Cafe));
        assert_eq!(spot("Gyeongbokgung(tour) ").role(), Some(Role::Tour));
        assert_eq!(spot("Namsan (Seoul)(Dinner)").role(), Some(Role::Dinner));
        assert_eq!(spot("Namsan (Seoul)").role(), None);
        assert_eq!(spot("Bukchon").role(), None);
    }

    #[test]
    fn test_spot_wire_round_trip() {
        let spots = vec![
            ItinerarySpot {
                name: "Hongdae(Tour)".to_string(),
                description: "Busking street".to_string(),
                lat: 37.5563,
                lng: 126.9236,
                media_title: "Start-Up".to_string(),
                tips: "Go after 7pm for live music".to_string(),
            },
            ItinerarySpot {
                name: "Cafe Layered(Cafe)".to_string(),
                ..Default::default()
            },
        ];

        let wire = serde_json::to_string(&ItineraryResponse::with_spots(spots.clone())).unwrap();
        let parsed: ItineraryResponse = serde_json::from_str(&wire).unwrap();
        assert_eq!(parsed.spots, spots);
        assert!(!wire.contains("error"));
    }

    #[test]
    fn test_spot_accepts_tip_alias_and_nulls() {
        let spot: ItinerarySpot = serde_json::from_value(serde_json::json!({
            "name": "Tosokchon(Dinner)",
            "description": null,
            "lat": 37.578,
            "lng": null,
            "tip": "Order the black chicken samgyetang"
        }))
        .unwrap();

        assert_eq!(spot.tips, "Order the black chicken samgyetang");
        assert_eq!(spot.description, "");
        assert_eq!(spot.lng, 0.0);
    }

    #[test]
    fn test_spot_accepts_string_coordinates() {
        let spot: ItinerarySpot = serde_json::from_value(serde_json::json!({
            "name": "Gwangjang Market(Lunch)",
            "lat": "37.57",
            "lng": 126.99
        }))
        .unwrap();

        assert_eq!(spot.lat, 37.57);
        assert_eq!(spot.lng, 126.99);
    }
}
