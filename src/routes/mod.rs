pub mod health;
pub mod menu;
pub mod recommend;
pub mod upload;
pub mod visits;

use actix_web::web;

/// Route table shared by the server and the integration tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health::health_check))
        .service(
            web::scope("/api")
                .route("/recommend", web::post().to(recommend::recommend))
                .route("/modify", web::post().to(recommend::modify))
                .route("/analyze-menu", web::post().to(menu::analyze_menu))
                .route("/upload-and-count", web::post().to(visits::upload_and_count))
                .route(
                    "/get-visit-count/{place_name}",
                    web::get().to(visits::get_visit_count),
                )
                .route("/config", web::get().to(health::client_config)),
        );
}
