use actix_web::{web, HttpResponse, Responder};
use serde::Serialize;
use std::collections::HashMap;
use std::env;

use crate::state::AppState;

#[derive(Serialize)]
struct HealthStatus {
    status: String,
    services: HashMap<String, ServiceStatus>,
    environment: String,
    version: String,
}

#[derive(Serialize, Clone)]
struct ServiceStatus {
    status: String,
    details: Option<String>,
}

impl ServiceStatus {
    fn ok(details: impl Into<String>) -> Self {
        Self {
            status: "ok".to_string(),
            details: Some(details.into()),
        }
    }

    fn error(details: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            details: Some(details.into()),
        }
    }
}

/*
    /health
*/
pub async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let mut health = HealthStatus {
        status: "ok".to_string(),
        services: HashMap::new(),
        environment: env::var("RUST_ENV").unwrap_or("development".to_string()),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    let store = match state.store.count().await {
        Ok(count) => ServiceStatus::ok(format!("{} locations", count)),
        Err(e) => ServiceStatus::error(e.to_string()),
    };
    health.services.insert("store".to_string(), store.clone());

    let oracle = if state.planner.oracle_configured() {
        ServiceStatus::ok("Azure OpenAI configured")
    } else {
        ServiceStatus::error("Azure OpenAI credentials missing")
    };
    health.services.insert("oracle".to_string(), oracle.clone());

    if store.status != "ok" || oracle.status != "ok" {
        health.status = "degraded".to_string();
    }

    HttpResponse::Ok().json(health)
}

/*
    /api/config
*/
pub async fn client_config(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({ "azure_maps_key": state.azure_maps_key }))
}
