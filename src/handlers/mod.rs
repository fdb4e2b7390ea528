//! # Handlers Module
//!
//! This module contains the HTTP request handlers for the mission service.
//! The dispatcher converts handler errors into the `{"error": ...}` response
//! contract and stamps CORS headers on every API response.

use std::sync::Arc;
use uuid::Uuid;
use worker::*;

use crate::config::Config;
use crate::errors::AppResult;
use crate::logging::Logger;
use crate::utils::cors_headers;

pub mod missions;
pub mod upload;

/// Dispatch an `/api/*` request to its handler.
pub async fn handle_api_routes(req: Request, env: Env, config: Arc<Config>) -> Result<Response> {
    let method = req.method();
    let url = req.url()?;
    let path = url.path();

    let logger = Logger::new(Uuid::new_v4().to_string());
    logger.info(
        "API request",
        crate::log_data!("method" => format!("{:?}", method), "path" => path),
    );

    let result: AppResult<Response> = match (method, path) {
        (Method::Get, "/api/missions") => {
            missions::list_missions(req, &env, &config, &logger).await
        }
        (Method::Post, "/api/missions") => {
            missions::create_mission(req, &env, &config, &logger).await
        }
        (Method::Patch, "/api/missions") => {
            missions::update_mission(req, &env, &config, &logger).await
        }
        (Method::Delete, "/api/missions") => {
            missions::delete_mission(req, &env, &config, &logger).await
        }
        (Method::Post, "/api/upload") => upload::upload_media(req, &env, &config, &logger).await,
        _ => Err(crate::errors::AppError::NotFound),
    };

    match result {
        Ok(response) => Ok(response.with_headers(cors_headers())),
        Err(app_error) => {
            logger.error(
                "Request failed",
                crate::log_data!("error" => app_error.to_string()),
            );
            match app_error.to_response() {
                Ok(response) => Ok(response.with_headers(cors_headers())),
                Err(_) => Response::error("Internal Server Error", 500)
                    .map(|r| r.with_headers(cors_headers())),
            }
        }
    }
}

/// Provides a health check endpoint for monitoring and load balancer probes.
pub async fn handle_health_check(_req: Request, _env: Env) -> Result<Response> {
    Response::from_json(&serde_json::json!({
        "status": "healthy",
        "service": "vaulted-ambition-cf-workers",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}
