//! # Request Routing and Dispatch
//!
//! This module handles HTTP request routing for the mission service. It
//! implements a pattern-based router that dispatches requests to appropriate
//! handlers based on HTTP method and URL path.
//!
//! ## Routing Strategy
//!
//! - Handles CORS preflight requests automatically
//! - Routes `/api/*` operations to the mission and upload handlers
//! - Provides a health check endpoint for monitoring
//! - Everything else is handed to the offline cache interceptor, which
//!   serves pages and static assets with the configured cache strategy
//!
//! ## Supported Routes
//!
//! - `GET /health` - Health check endpoint
//! - `GET|POST|PATCH|DELETE /api/missions` - Mission CRUD
//! - `POST /api/upload` - Media upload
//! - `OPTIONS *` - CORS preflight requests
//! - `* *` - Offline cache interception / pass-through

use std::sync::Arc;
use worker::*;

use crate::config::Config;
use crate::handlers::{handle_api_routes, handle_health_check};
use crate::middleware::CorsMiddleware;
use crate::offline;

/// Handles incoming HTTP requests and routes them to appropriate handlers.
pub async fn handle_request(req: Request, env: Env, config: Arc<Config>) -> Result<Response> {
    // Handle CORS preflight requests early to avoid unnecessary processing
    if req.method() == Method::Options {
        return CorsMiddleware::handle_preflight();
    }

    let url = req.url()?;
    let path = url.path();
    let method = req.method();

    match (method, path) {
        // Health check endpoint for monitoring and load balancer probes
        (Method::Get, "/health") => handle_health_check(req, env).await,

        // API surface: mission CRUD and media upload
        (_, path) if path.starts_with("/api/") => handle_api_routes(req, env, config).await,

        // Everything else belongs to the site itself; the offline cache
        // decides between network-first, cache-first, and pass-through
        _ => offline::handle_fetch(req, &config).await,
    }
}
