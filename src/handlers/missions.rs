//! # Mission Handlers
//!
//! HTTP handlers for mission CRUD. These translate request bodies and query
//! parameters into [`MissionStore`] calls; all casing translation between the
//! client shape and the storage row happens in the store and the serde types,
//! so both create and update accept the same camelCase bodies.

use worker::*;

use crate::config::Config;
use crate::database::MissionStore;
use crate::errors::{AppError, AppResult};
use crate::logging::Logger;
use crate::middleware::ValidationMiddleware;
use crate::models::{MissionPatch, NewMission};
use crate::log_data;

/// `GET /api/missions[?id=...]`
///
/// Without an id: every mission, newest first where the schema allows
/// ordering. With an id: the filtered list holding that mission, which is
/// empty when the id is unknown (lookup misses are the client's concern).
pub async fn list_missions(
    req: Request,
    env: &Env,
    config: &Config,
    logger: &Logger,
) -> AppResult<Response> {
    let id = id_param(&req)?;
    let store = MissionStore::from_env(env, config).await?;

    let missions = match id.as_deref() {
        Some(id) => store.get(id).await?,
        None => store.list().await?,
    };

    logger.info("Listed missions", log_data!("count" => missions.len()));
    Ok(Response::from_json(&missions)?)
}

/// `POST /api/missions`
///
/// Accepts a client-cased mission body without an id, validates it, and
/// returns the created row (as a one-element array, like the list forms).
pub async fn create_mission(
    mut req: Request,
    env: &Env,
    config: &Config,
    logger: &Logger,
) -> AppResult<Response> {
    let new: NewMission = req
        .json()
        .await
        .map_err(|_| AppError::BadRequest("Invalid JSON in request body".to_string()))?;
    ValidationMiddleware::validate_new_mission(&new)?;

    let store = MissionStore::from_env(env, config).await?;
    let created = store.insert(new).await?;

    logger.info(
        "Created mission",
        log_data!("id" => created.first().map(|m| m.id.as_str())),
    );
    Ok(Response::from_json(&created)?)
}

/// `PATCH /api/missions?id=...`
///
/// Partial update. The id is required and checked before anything touches
/// storage; an empty patch is rejected rather than issuing an empty UPDATE.
pub async fn update_mission(
    mut req: Request,
    env: &Env,
    config: &Config,
    logger: &Logger,
) -> AppResult<Response> {
    let id = require_id(&req)?;
    let patch: MissionPatch = req
        .json()
        .await
        .map_err(|_| AppError::BadRequest("Invalid JSON in request body".to_string()))?;
    if patch.is_empty() {
        return Err(AppError::BadRequest("no fields to update".to_string()));
    }
    ValidationMiddleware::validate_patch(&patch)?;

    let store = MissionStore::from_env(env, config).await?;
    let updated = store.update(&id, &patch).await?;

    logger.info("Updated mission", log_data!("id" => id));
    Ok(Response::from_json(&updated)?)
}

/// `DELETE /api/missions?id=...`
///
/// Idempotent: deleting an id that never existed still acknowledges success,
/// since delete-by-filter does not report misses.
pub async fn delete_mission(
    req: Request,
    env: &Env,
    config: &Config,
    logger: &Logger,
) -> AppResult<Response> {
    let id = require_id(&req)?;

    let store = MissionStore::from_env(env, config).await?;
    store.delete(&id).await?;

    logger.info("Deleted mission", log_data!("id" => id));
    Ok(Response::from_json(&serde_json::json!({ "success": true }))?)
}

fn id_param(req: &Request) -> AppResult<Option<String>> {
    let url = req.url()?;
    Ok(url
        .query_pairs()
        .find(|(key, _)| key == "id")
        .map(|(_, value)| value.into_owned()))
}

fn require_id(req: &Request) -> AppResult<String> {
    id_param(req)?.ok_or(AppError::MissingParameter("id"))
}
