use actix_multipart::Multipart;
use actix_web::{web, HttpResponse, Responder};
use log::{error, info, warn};
use serde_json::json;

use crate::models::visit::{CheckInResponse, VisitCountResponse};
use crate::routes::upload::{find_part, read_form};
use crate::state::AppState;

/*
    /api/upload-and-count
*/
pub async fn upload_and_count(state: web::Data<AppState>, payload: Multipart) -> impl Responder {
    let parts = match read_form(payload).await {
        Ok(parts) => parts,
        Err(e) => return HttpResponse::BadRequest().json(json!({ "error": e.to_string() })),
    };

    let place_name = match find_part(&parts, "place_name").map(|part| part.text()) {
        Some(name) if !name.is_empty() => name,
        _ => return HttpResponse::BadRequest().json(json!({ "error": "Missing place_name" })),
    };

    let photo_url = match (find_part(&parts, "file"), &state.photos) {
        (Some(file), Some(photos)) => {
            let content_type = file.content_type.as_deref().unwrap_or("application/octet-stream");
            match photos
                .upload(&place_name, file.bytes.clone(), content_type)
                .await
            {
                Ok(url) => Some(url),
                Err(e) => {
                    error!("Photo upload for '{}' failed: {}", place_name, e);
                    return HttpResponse::Ok().json(json!({ "error": e.to_string() }));
                }
            }
        }
        (Some(_), None) => {
            warn!("PHOTO_BUCKET not configured, counting visit without storing the photo");
            None
        }
        (None, _) => None,
    };

    match state.visits.increment(&place_name).await {
        Ok(count) => {
            info!("Check-in at '{}' (total {})", place_name, count);
            HttpResponse::Ok().json(CheckInResponse {
                place_name,
                count,
                photo_url,
            })
        }
        Err(e) => {
            error!("Failed to increment visits for '{}': {}", place_name, e);
            HttpResponse::Ok().json(json!({ "error": e.to_string() }))
        }
    }
}

/*
    /api/get-visit-count/{place_name}
*/
pub async fn get_visit_count(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let place_name = path.into_inner();
    match state.visits.count(&place_name).await {
        Ok(count) => HttpResponse::Ok().json(VisitCountResponse { place_name, count }),
        Err(e) => {
            error!("Failed to read visits for '{}': {}", place_name, e);
            HttpResponse::Ok().json(json!({ "place_name": place_name, "count": 0, "error": e.to_string() }))
        }
    }
}
