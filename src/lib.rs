//! # Vaulted Ambition - Cloudflare Workers
//!
//! Backend for the Vaulted Ambition goal tracker, built with Rust and
//! Cloudflare Workers. Missions (tasks, a reward, a time frame) are stored in
//! a D1 database, uploaded motivation media lands in R2, and an offline cache
//! keeps the client usable without connectivity.
//!
//! ## Architecture
//!
//! The service follows a modular architecture with clear separation of concerns:
//! - **Router**: Routes incoming requests to handlers or the offline cache
//! - **Handlers**: Mission CRUD and single-shot media upload
//! - **Database**: Mission persistence on D1, with schema capability probing
//! - **Offline**: Versioned cache bucket with network-first/cache-first strategies
//! - **Middleware**: CORS and payload validation
//! - **Models**: Mission, task, and media data structures
//!
//! ## HTTP Surface
//!
//! ```text
//! GET    /api/missions[?id=]   - List missions, or the one matching id
//! POST   /api/missions         - Create a mission
//! PATCH  /api/missions?id=     - Partially update a mission
//! DELETE /api/missions?id=     - Delete a mission
//! POST   /api/upload           - Upload motivation media (multipart)
//! GET    /health               - Health check
//! ```
//!
//! Anything outside `/api` is treated as site traffic and served through the
//! offline cache interceptor.

use std::sync::{Arc, OnceLock};
use worker::*;

mod config;
mod constants;
mod database;
mod errors;
mod handlers;
mod logging;
mod middleware;
mod models;
mod offline;
mod router;
mod utils;

use config::Config;
use constants::APP_CONFIG_KV_NAME;

static CONFIG_CACHE: OnceLock<Arc<Config>> = OnceLock::new();

/// Main entry point for the Cloudflare Worker.
///
/// Sets up panic handling, loads configuration from KV storage (once per
/// isolate, shared read-only afterwards), and delegates routing to the
/// router module.
#[event(fetch)]
pub async fn main(req: Request, env: Env, _ctx: Context) -> Result<Response> {
    // Set up panic hook for better error reporting in development
    console_error_panic_hook::set_once();

    let config = load_config(&env).await?;

    router::handle_request(req, env, config).await
}

async fn load_config(env: &Env) -> Result<Arc<Config>> {
    if let Some(config) = CONFIG_CACHE.get() {
        return Ok(config.clone());
    }

    let kv = env.kv(APP_CONFIG_KV_NAME)?;
    let config = Arc::new(Config::load(&kv).await?);
    let _ = CONFIG_CACHE.set(config.clone());
    Ok(config)
}
