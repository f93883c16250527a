use actix_multipart::Multipart;
use actix_web::{HttpResponse, web};
use chrono::Utc;
use log::warn;
use shared::{
    HealthResponse, LimitValue, MAX_DESCRIPTION_CHARS, MAX_IMAGE_BYTES, MAX_IMAGES, ServiceInfo,
};
use std::collections::BTreeMap;

use crate::analyzer::AnalysisService;
use crate::analyzer::prompt::ACCURACY_SCALE;
use crate::upload::collect_form;
use crate::validation::{ValidationError, validate};

pub const SERVICE_NAME: &str = "fixme-ai";

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/").route(web::get().to(root)))
        .service(web::resource("/health").route(web::get().to(health)))
        .service(web::resource("/analyze").route(web::post().to(analyze)));
}

async fn root() -> HttpResponse {
    let endpoints = BTreeMap::from([
        (
            "analyze".to_string(),
            "POST /analyze - Send user_id, optional description, and optional image files".to_string(),
        ),
        ("health".to_string(), "GET /health".to_string()),
    ]);
    let accuracy_scale = ACCURACY_SCALE
        .iter()
        .map(|(band, meaning)| (band.to_string(), meaning.to_string()))
        .collect();
    let limits = BTreeMap::from([
        ("max_images".to_string(), LimitValue::Count(MAX_IMAGES)),
        (
            "max_file_size".to_string(),
            LimitValue::Text(format!("{}MB", MAX_IMAGE_BYTES / 1024 / 1024)),
        ),
        (
            "description_max_length".to_string(),
            LimitValue::Text(format!("{} characters", MAX_DESCRIPTION_CHARS)),
        ),
    ]);

    HttpResponse::Ok().json(ServiceInfo {
        message: "Welcome to FixMe AI Repair Assistant".to_string(),
        status: "active".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        endpoints,
        input_options: vec![
            format!("Only images (up to {})", MAX_IMAGES),
            "Only text description".to_string(),
            "Both images and text".to_string(),
        ],
        accuracy_scale,
        limits,
    })
}

async fn health(service: web::Data<AnalysisService>) -> HttpResponse {
    let openai_status = if service.is_configured() {
        "configured"
    } else {
        "not_configured"
    };
    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: Utc::now(),
        service: SERVICE_NAME.to_string(),
        openai_status: openai_status.to_string(),
    })
}

async fn analyze(
    service: web::Data<AnalysisService>,
    payload: Multipart,
) -> Result<HttpResponse, ValidationError> {
    let request = collect_form(payload)
        .await
        .map_err(ValidationError::from)
        .and_then(validate)
        .inspect_err(|e| warn!("Rejected analysis request ({:?}): {}", e.field(), e))?;

    let response = service.analyze(&request).await;
    if response.success {
        Ok(HttpResponse::Ok().json(response))
    } else {
        Ok(HttpResponse::InternalServerError().json(response))
    }
}
