pub mod categorizer;
pub mod image_service;
pub mod itinerary_planner;
pub mod itinerary_sequencer;
pub mod keyword_service;
pub mod menu_service;
pub mod oracle;
pub mod response_validator;
pub mod retrieval_service;
