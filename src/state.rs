use std::sync::Arc;

use crate::db::{LocationStore, VisitCounter};
use crate::services::image_service::PhotoStore;
use crate::services::itinerary_planner::ItineraryPlanner;
use crate::services::menu_service::MenuAnalyzer;

/// Shared, read-only handles given to every handler. Each request works on
/// its own data; only the visit counter is written to.
pub struct AppState {
    pub planner: ItineraryPlanner,
    pub menu: MenuAnalyzer,
    pub store: Arc<dyn LocationStore>,
    pub visits: Arc<dyn VisitCounter>,
    pub photos: Option<Arc<dyn PhotoStore>>,
    pub azure_maps_key: String,
}
