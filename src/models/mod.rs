pub mod itinerary;
pub mod location;
pub mod menu;
pub mod preferences;
pub mod visit;
