use serde::Serialize;

use crate::config::RetrievalSettings;
use crate::models::location::ScoredCandidate;

/// Place-type fragments that mark somewhere to eat. Checked before cafes.
const MEAL_MARKERS: [&str; 10] = [
    "restaurant",
    "food",
    "dining",
    "meal",
    "eatery",
    "식당",
    "음식",
    "맛집",
    "한식",
    "분식",
];

const CAFE_MARKERS: [&str; 8] = [
    "cafe", "café", "coffee", "dessert", "bakery", "카페", "디저트", "베이커리",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Category {
    Meal,
    Cafe,
    Tour,
}

/// Buckets a place by its free-text type. Anything unrecognised, including a
/// missing type, is a tour stop.
pub fn categorize(place_type: Option<&str>) -> Category {
    let place_type = place_type.unwrap_or_default().to_lowercase();
    if MEAL_MARKERS.iter().any(|marker| place_type.contains(marker)) {
        Category::Meal
    } else if CAFE_MARKERS.iter().any(|marker| place_type.contains(marker)) {
        Category::Cafe
    } else {
        Category::Tour
    }
}

/// Ranked candidates split by category and capped.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CategorizedPool {
    pub meals: Vec<ScoredCandidate>,
    pub cafes: Vec<ScoredCandidate>,
    pub tours: Vec<ScoredCandidate>,
}

impl CategorizedPool {
    /// Splits already ranked candidates. Each bucket is re-sorted by score
    /// (stable) before truncation so the caps always keep the best rows.
    pub fn build(candidates: Vec<ScoredCandidate>, settings: &RetrievalSettings) -> Self {
        let mut pool = Self::default();
        for candidate in candidates {
            match categorize(candidate.location.place_type.as_deref()) {
                Category::Meal => pool.meals.push(candidate),
                Category::Cafe => pool.cafes.push(candidate),
                Category::Tour => pool.tours.push(candidate),
            }
        }

        for (bucket, cap) in [
            (&mut pool.meals, settings.meal_cap),
            (&mut pool.cafes, settings.cafe_cap),
            (&mut pool.tours, settings.tour_cap),
        ] {
            bucket.sort_by(|a, b| b.score.cmp(&a.score));
            bucket.truncate(cap);
        }

        pool
    }

    pub fn len(&self) -> usize {
        self.meals.len() + self.cafes.len() + self.tours.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::location::LocationRecord;

    fn candidate(name: &str, place_type: Option<&str>, score: i32) -> ScoredCandidate {
        ScoredCandidate {
            location: LocationRecord {
                name: name.to_string(),
                place_type: place_type.map(str::to_string),
                ..Default::default()
            },
            score,
        }
    }

    #[test]
    fn test_categorize_is_total() {
        assert_eq!(categorize(Some("Restaurant")), Category::Meal);
        assert_eq!(categorize(Some("한식 맛집")), Category::Meal);
        assert_eq!(categorize(Some("Cafe")), Category::Cafe);
        assert_eq!(categorize(Some("디저트 카페")), Category::Cafe);
        assert_eq!(categorize(Some("place")), Category::Tour);
        assert_eq!(categorize(Some("")), Category::Tour);
        assert_eq!(categorize(None), Category::Tour);
    }

    #[test]
    fn test_food_beats_cafe() {
        assert_eq!(categorize(Some("cafe & restaurant")), Category::Meal);
    }

    #[test]
    fn test_pool_caps_keep_highest_scores() {
        let settings = RetrievalSettings {
            meal_cap: 1,
            cafe_cap: 2,
            tour_cap: 2,
            ..Default::default()
        };
        let pool = CategorizedPool::build(
            vec![
                candidate("Low meal", Some("restaurant"), 1),
                candidate("High meal", Some("restaurant"), 9),
                candidate("Cafe", Some("cafe"), 3),
                candidate("Palace", None, 4),
            ],
            &settings,
        );

        assert_eq!(pool.meals.len(), 1);
        assert_eq!(pool.meals[0].location.name, "High meal");
        assert_eq!(pool.cafes.len(), 1);
        assert_eq!(pool.tours[0].location.name, "Palace");
        assert_eq!(pool.len(), 3);
    }

    #[test]
    fn test_every_candidate_lands_in_one_bucket() {
        let candidates = vec![
            candidate("a", Some("bakery"), 0),
            candidate("b", Some("filming site"), 0),
            candidate("c", Some("food court"), 0),
            candidate("d", None, 0),
        ];
        let pool = CategorizedPool::build(candidates.clone(), &RetrievalSettings::default());
        assert_eq!(pool.len(), candidates.len());

        let rebuilt = CategorizedPool::build(
            pool.meals
                .iter()
                .chain(&pool.cafes)
                .chain(&pool.tours)
                .cloned()
                .collect(),
            &RetrievalSettings::default(),
        );
        assert_eq!(rebuilt.len(), pool.len());
    }
}
