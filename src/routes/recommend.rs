use actix_web::{web, HttpResponse, Responder};
use log::{info, warn};

use crate::models::itinerary::{ItineraryResponse, ModifyRequest};
use crate::models::preferences::RecommendInput;
use crate::state::AppState;

/*
    /api/recommend
*/
pub async fn recommend(state: web::Data<AppState>, body: web::Bytes) -> impl Responder {
    let input = match RecommendInput::from_body(&body) {
        Ok(input) => input,
        Err(e) => {
            warn!("Rejected survey body: {}", e);
            return HttpResponse::BadRequest()
                .json(ItineraryResponse::failed(format!("Invalid survey: {}", e)));
        }
    };
    info!("Recommendation requested: {:?}", input);

    HttpResponse::Ok().json(state.planner.recommend(&input).await)
}

/*
    /api/modify
*/
pub async fn modify(state: web::Data<AppState>, body: web::Bytes) -> impl Responder {
    let request: ModifyRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            warn!("Rejected modify body: {}", e);
            return HttpResponse::BadRequest()
                .json(ItineraryResponse::failed(format!("Invalid modify request: {}", e)));
        }
    };
    info!(
        "Modification requested for {} spots: {}",
        request.current_spots.len(),
        request.user_request
    );

    HttpResponse::Ok().json(
        state
            .planner
            .modify(request.current_spots, &request.user_request)
            .await,
    )
}
