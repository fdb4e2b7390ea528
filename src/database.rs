//! # D1 Mission Store
//!
//! This module provides mission persistence on Cloudflare D1. It owns the
//! translation between the client-facing camelCase shape and the flattened
//! lowercase column names the table uses, and the normalization of absent
//! optional columns.
//!
//! ## Database Schema
//!
//! ```sql
//! CREATE TABLE missions (
//!     id             TEXT PRIMARY KEY,
//!     title          TEXT NOT NULL,
//!     reward         TEXT NOT NULL,
//!     rewardimage    TEXT,
//!     timeframe      TEXT NOT NULL,
//!     motivation     TEXT,
//!     tasks          TEXT NOT NULL,   -- JSON array of Task
//!     motivationmedia TEXT,           -- JSON array of MediaItem, optional column
//!     created_at     TEXT             -- RFC 3339, optional column
//! );
//! ```
//!
//! `tasks` and `motivationmedia` are opaque JSON text; tasks and media have
//! no lifecycle of their own and are always written as part of their mission.
//!
//! ## Schema Drift
//!
//! Older deployments may lack the `motivationmedia` and `created_at` columns.
//! Instead of pattern-matching storage error messages at call time, the store
//! probes `PRAGMA table_info` once per isolate, caches the resulting
//! capability set, and branches on it: listing drops its `ORDER BY`, writes
//! strip the media column.

use std::sync::OnceLock;

use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;
use worker::wasm_bindgen::JsValue;
use worker::{D1Database, Env};

use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::models::{MediaItem, Mission, MissionPatch, NewMission, Task};

static SCHEMA_CAPS: OnceLock<SchemaCapabilities> = OnceLock::new();

/// Which optional columns the deployed `missions` table actually has.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SchemaCapabilities {
    pub has_created_at: bool,
    pub has_motivation_media: bool,
}

impl Default for SchemaCapabilities {
    fn default() -> Self {
        Self {
            has_created_at: true,
            has_motivation_media: true,
        }
    }
}

/// Row shape as D1 returns it, storage-cased.
#[derive(Deserialize, Clone, Debug)]
struct MissionRow {
    id: String,
    title: String,
    reward: String,
    #[serde(default)]
    rewardimage: Option<String>,
    timeframe: String,
    #[serde(default)]
    motivation: Option<String>,
    #[serde(default)]
    tasks: Option<String>,
    #[serde(default)]
    motivationmedia: Option<String>,
}

#[derive(Deserialize)]
struct ColumnInfo {
    name: String,
}

/// Mission persistence over a D1 binding.
///
/// Holds no per-request mutable state; every operation is a parameterized,
/// stateless call, so one store value can serve concurrent requests.
pub struct MissionStore {
    db: D1Database,
    caps: SchemaCapabilities,
}

impl MissionStore {
    /// Open the store, probing (or reusing the cached) schema capabilities.
    pub async fn from_env(env: &Env, config: &Config) -> AppResult<Self> {
        let db = env.d1(&config.database_name)?;
        let caps = cached_capabilities(&db).await?;
        Ok(Self { db, caps })
    }

    /// All missions, newest first when the table can order by creation time.
    pub async fn list(&self) -> AppResult<Vec<Mission>> {
        let result = self
            .db
            .prepare(list_sql(self.caps))
            .all()
            .await
            .map_err(storage_err)?;
        rows_to_missions(result.results::<MissionRow>().map_err(storage_err)?)
    }

    /// The missions matching `id` (zero or one of them).
    pub async fn get(&self, id: &str) -> AppResult<Vec<Mission>> {
        let statement = self
            .db
            .prepare("SELECT * FROM missions WHERE id = ?1")
            .bind(&[JsValue::from_str(id)])
            .map_err(storage_err)?;
        let result = statement.all().await.map_err(storage_err)?;
        rows_to_missions(result.results::<MissionRow>().map_err(storage_err)?)
    }

    /// Insert a new mission. The store assigns the id and creation time, and
    /// returns the inserted row read back in client casing.
    pub async fn insert(&self, new: NewMission) -> AppResult<Vec<Mission>> {
        let now = Utc::now();
        let mission = new.into_mission(Uuid::new_v4().to_string(), now.timestamp_millis());

        let (sql, binds) = insert_statement(&mission, &now.to_rfc3339(), self.caps)?;
        self.run(&sql, &binds).await?;
        self.get(&mission.id).await
    }

    /// Apply a partial update filtered by id and return the updated row.
    ///
    /// Fields the deployed schema cannot hold are stripped; if nothing
    /// remains to write the stored row is returned unchanged.
    pub async fn update(&self, id: &str, patch: &MissionPatch) -> AppResult<Vec<Mission>> {
        if let Some((sql, binds)) = update_statement(id, patch, self.caps)? {
            self.run(&sql, &binds).await?;
        }
        self.get(id).await
    }

    /// Delete by id. Deleting an id that does not exist is not an error.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        let statement = self
            .db
            .prepare("DELETE FROM missions WHERE id = ?1")
            .bind(&[JsValue::from_str(id)])
            .map_err(storage_err)?;
        statement.run().await.map_err(storage_err)?;
        Ok(())
    }

    async fn run(&self, sql: &str, binds: &[String]) -> AppResult<()> {
        let values: Vec<JsValue> = binds.iter().map(|v| JsValue::from_str(v)).collect();
        let statement = self.db.prepare(sql).bind(&values).map_err(storage_err)?;
        statement.run().await.map_err(storage_err)?;
        Ok(())
    }
}

/// Probe the deployed column set once per isolate.
async fn cached_capabilities(db: &D1Database) -> AppResult<SchemaCapabilities> {
    if let Some(caps) = SCHEMA_CAPS.get() {
        return Ok(*caps);
    }

    let result = db
        .prepare("PRAGMA table_info(missions)")
        .all()
        .await
        .map_err(storage_err)?;
    let columns = result.results::<ColumnInfo>().map_err(storage_err)?;

    let caps = SchemaCapabilities {
        has_created_at: columns.iter().any(|c| c.name == "created_at"),
        has_motivation_media: columns.iter().any(|c| c.name == "motivationmedia"),
    };
    // A concurrent probe may have won; both computed the same answer.
    let _ = SCHEMA_CAPS.set(caps);
    Ok(caps)
}

fn storage_err(err: worker::Error) -> AppError {
    AppError::Storage(err.to_string())
}

fn json_err(err: serde_json::Error) -> AppError {
    AppError::Storage(err.to_string())
}

fn list_sql(caps: SchemaCapabilities) -> &'static str {
    if caps.has_created_at {
        "SELECT * FROM missions ORDER BY created_at DESC"
    } else {
        "SELECT * FROM missions"
    }
}

/// Build the INSERT for the deployed column set. Bind values are all text;
/// task and media sequences are serialized to JSON columns.
fn insert_statement(
    mission: &Mission,
    created_at: &str,
    caps: SchemaCapabilities,
) -> AppResult<(String, Vec<String>)> {
    let mut columns = vec![
        "id",
        "title",
        "reward",
        "rewardimage",
        "timeframe",
        "motivation",
        "tasks",
    ];
    let mut binds = vec![
        mission.id.clone(),
        mission.title.clone(),
        mission.reward.clone(),
        mission.reward_image.clone(),
        mission.time_frame.as_str().to_string(),
        mission.motivation.clone(),
        serde_json::to_string(&mission.tasks).map_err(json_err)?,
    ];

    if caps.has_motivation_media {
        columns.push("motivationmedia");
        binds.push(serde_json::to_string(&mission.motivation_media).map_err(json_err)?);
    }
    if caps.has_created_at {
        columns.push("created_at");
        binds.push(created_at.to_string());
    }

    let placeholders: Vec<String> = (1..=binds.len()).map(|n| format!("?{}", n)).collect();
    let sql = format!(
        "INSERT INTO missions ({}) VALUES ({})",
        columns.join(", "),
        placeholders.join(", ")
    );
    Ok((sql, binds))
}

/// Build the UPDATE for the supplied fields, or `None` when every supplied
/// field was stripped by the capability set.
fn update_statement(
    id: &str,
    patch: &MissionPatch,
    caps: SchemaCapabilities,
) -> AppResult<Option<(String, Vec<String>)>> {
    let mut sets: Vec<String> = Vec::new();
    let mut binds: Vec<String> = Vec::new();

    let push = |sets: &mut Vec<String>, binds: &mut Vec<String>, column: &str, value: String| {
        binds.push(value);
        sets.push(format!("{} = ?{}", column, binds.len()));
    };

    if let Some(title) = &patch.title {
        push(&mut sets, &mut binds, "title", title.clone());
    }
    if let Some(reward) = &patch.reward {
        push(&mut sets, &mut binds, "reward", reward.clone());
    }
    if let Some(reward_image) = &patch.reward_image {
        push(&mut sets, &mut binds, "rewardimage", reward_image.clone());
    }
    if let Some(time_frame) = &patch.time_frame {
        push(
            &mut sets,
            &mut binds,
            "timeframe",
            time_frame.as_str().to_string(),
        );
    }
    if let Some(motivation) = &patch.motivation {
        push(&mut sets, &mut binds, "motivation", motivation.clone());
    }
    if let Some(tasks) = &patch.tasks {
        push(
            &mut sets,
            &mut binds,
            "tasks",
            serde_json::to_string(tasks).map_err(json_err)?,
        );
    }
    if let Some(media) = &patch.motivation_media {
        if caps.has_motivation_media {
            push(
                &mut sets,
                &mut binds,
                "motivationmedia",
                serde_json::to_string(media).map_err(json_err)?,
            );
        }
    }

    if sets.is_empty() {
        return Ok(None);
    }

    binds.push(id.to_string());
    let sql = format!(
        "UPDATE missions SET {} WHERE id = ?{}",
        sets.join(", "),
        binds.len()
    );
    Ok(Some((sql, binds)))
}

fn rows_to_missions(rows: Vec<MissionRow>) -> AppResult<Vec<Mission>> {
    rows.into_iter().map(row_to_mission).collect()
}

/// Map a storage row to the client shape, normalizing absent optional fields
/// to empty values.
fn row_to_mission(row: MissionRow) -> AppResult<Mission> {
    let tasks: Vec<Task> = match row.tasks.as_deref() {
        Some(json) => serde_json::from_str(json).map_err(json_err)?,
        None => Vec::new(),
    };
    let motivation_media: Vec<MediaItem> = match row.motivationmedia.as_deref() {
        Some(json) => serde_json::from_str(json).map_err(json_err)?,
        None => Vec::new(),
    };

    Ok(Mission {
        id: row.id,
        title: row.title,
        reward: row.reward,
        reward_image: row.rewardimage.unwrap_or_default(),
        time_frame: row.timeframe.parse().map_err(AppError::Storage)?,
        motivation: row.motivation.unwrap_or_default(),
        tasks,
        motivation_media,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{IconName, MediaKind, TimeFrame};

    const FULL: SchemaCapabilities = SchemaCapabilities {
        has_created_at: true,
        has_motivation_media: true,
    };
    const BARE: SchemaCapabilities = SchemaCapabilities {
        has_created_at: false,
        has_motivation_media: false,
    };

    fn sample_mission() -> Mission {
        Mission {
            id: "m1".to_string(),
            title: "Weekly Fitness".to_string(),
            reward: "Protein Powder".to_string(),
            reward_image: String::new(),
            time_frame: TimeFrame::Weekly,
            motivation: "Fuel my body".to_string(),
            tasks: vec![Task {
                id: "1-0".to_string(),
                text: "Gym session".to_string(),
                completions: 1,
                target: 3,
                icon: IconName::Dumbbell,
            }],
            motivation_media: vec![MediaItem {
                kind: MediaKind::Image,
                url: "https://media.example.com/motivation/1-a.png".to_string(),
                name: Some("a.png".to_string()),
                mime_type: Some("image/png".to_string()),
            }],
        }
    }

    #[test]
    fn listing_orders_by_creation_time_only_when_the_column_exists() {
        assert_eq!(list_sql(FULL), "SELECT * FROM missions ORDER BY created_at DESC");
        assert_eq!(list_sql(BARE), "SELECT * FROM missions");
    }

    #[test]
    fn insert_includes_optional_columns_when_present() {
        let (sql, binds) = insert_statement(&sample_mission(), "2026-01-01T00:00:00Z", FULL).unwrap();
        assert!(sql.contains("motivationmedia"));
        assert!(sql.contains("created_at"));
        assert_eq!(binds.len(), 9);
        assert_eq!(binds[8], "2026-01-01T00:00:00Z");
    }

    #[test]
    fn insert_strips_optional_columns_when_absent() {
        let (sql, binds) = insert_statement(&sample_mission(), "2026-01-01T00:00:00Z", BARE).unwrap();
        assert!(!sql.contains("motivationmedia"));
        assert!(!sql.contains("created_at"));
        assert_eq!(binds.len(), 7);
        assert!(sql.ends_with("VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"));
    }

    #[test]
    fn update_numbers_placeholders_and_filters_by_id() {
        let patch = MissionPatch {
            title: Some("New title".to_string()),
            motivation: Some("Because".to_string()),
            ..Default::default()
        };
        let (sql, binds) = update_statement("m1", &patch, FULL).unwrap().unwrap();
        assert_eq!(sql, "UPDATE missions SET title = ?1, motivation = ?2 WHERE id = ?3");
        assert_eq!(binds, vec!["New title", "Because", "m1"]);
    }

    #[test]
    fn update_of_only_stripped_fields_writes_nothing() {
        let patch = MissionPatch {
            motivation_media: Some(Vec::new()),
            ..Default::default()
        };
        assert!(update_statement("m1", &patch, BARE).unwrap().is_none());
        // the same patch writes on a full schema
        assert!(update_statement("m1", &patch, FULL).unwrap().is_some());
    }

    #[test]
    fn row_normalizes_absent_optional_fields() {
        let row = MissionRow {
            id: "m1".to_string(),
            title: "X".to_string(),
            reward: "Y".to_string(),
            rewardimage: None,
            timeframe: "daily".to_string(),
            motivation: None,
            tasks: None,
            motivationmedia: None,
        };
        let mission = row_to_mission(row).unwrap();
        assert_eq!(mission.reward_image, "");
        assert_eq!(mission.motivation, "");
        assert!(mission.tasks.is_empty());
        assert!(mission.motivation_media.is_empty());
    }

    #[test]
    fn mission_survives_the_row_round_trip() {
        let mission = sample_mission();
        let row = MissionRow {
            id: mission.id.clone(),
            title: mission.title.clone(),
            reward: mission.reward.clone(),
            rewardimage: Some(mission.reward_image.clone()),
            timeframe: mission.time_frame.as_str().to_string(),
            motivation: Some(mission.motivation.clone()),
            tasks: Some(serde_json::to_string(&mission.tasks).unwrap()),
            motivationmedia: Some(serde_json::to_string(&mission.motivation_media).unwrap()),
        };
        assert_eq!(row_to_mission(row).unwrap(), mission);
    }

    #[test]
    fn unknown_timeframe_surfaces_as_a_storage_error() {
        let row = MissionRow {
            id: "m1".to_string(),
            title: "X".to_string(),
            reward: "Y".to_string(),
            rewardimage: None,
            timeframe: "fortnightly".to_string(),
            motivation: None,
            tasks: None,
            motivationmedia: None,
        };
        assert!(matches!(row_to_mission(row), Err(AppError::Storage(_))));
    }
}
