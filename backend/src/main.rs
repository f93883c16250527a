mod analyzer;
mod config;
mod error;
mod media;
mod routes;
mod upload;
mod validation;

#[cfg(test)]
mod tests;

use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::{App, HttpServer, web};
use analyzer::AnalysisService;
use analyzer::openai::OpenAiAnalyzer;
use config::AppConfig;
use routes::configure_routes;
use std::sync::Arc;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = AppConfig::load().map_err(|e| {
        log::error!("Failed to load configuration: {}", e);
        std::io::Error::other(format!("Configuration error: {}", e))
    })?;

    let analyzer = OpenAiAnalyzer::new(&config.analyzer).map_err(|e| {
        log::error!("Failed to initialise analyzer client: {}", e);
        std::io::Error::other(format!("Analyzer setup failed: {}", e))
    })?;

    if config.analyzer.is_configured() {
        log::info!(
            "Analyzer configured: model {} at {}",
            config.analyzer.model,
            config.analyzer.base_url
        );
    } else {
        log::warn!("OPENAI_API_KEY is not set. /analyze requests will fail until it is configured.");
    }

    let service = web::Data::new(AnalysisService::new(
        Arc::new(analyzer),
        config.analyzer.timeout(),
    ));

    let bind_address = config.bind_address();
    log::info!("Starting server on {}", bind_address);

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allowed_methods(vec!["GET", "POST", "OPTIONS"])
                    .allowed_headers(vec![
                        actix_web::http::header::ACCEPT,
                        actix_web::http::header::CONTENT_TYPE,
                    ])
                    .max_age(3600),
            )
            .app_data(service.clone())
            .configure(configure_routes)
    })
    .bind(&bind_address)?
    .run()
    .await
}
