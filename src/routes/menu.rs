use actix_multipart::Multipart;
use actix_web::{web, HttpResponse, Responder};
use log::{error, info};
use serde_json::json;

use crate::routes::upload::{find_part, read_form};
use crate::state::AppState;

/*
    /api/analyze-menu
*/
pub async fn analyze_menu(state: web::Data<AppState>, payload: Multipart) -> impl Responder {
    let parts = match read_form(payload).await {
        Ok(parts) => parts,
        Err(e) => return HttpResponse::BadRequest().json(json!({ "error": e.to_string() })),
    };

    let image = match find_part(&parts, "file").filter(|part| !part.bytes.is_empty()) {
        Some(part) => part.bytes.clone(),
        None => {
            return HttpResponse::BadRequest().json(json!({ "error": "Missing menu image in 'file'" }))
        }
    };
    info!("Analyzing menu image of {} bytes", image.len());

    match state.menu.analyze(image).await {
        Ok(analysis) => HttpResponse::Ok().json(analysis),
        Err(e) => {
            error!("Menu analysis failed: {}", e);
            HttpResponse::Ok().json(json!({ "error": e.to_string() }))
        }
    }
}
