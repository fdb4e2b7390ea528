//! # Application Constants
//!
//! This module defines application-wide constants used throughout the mission
//! service. Centralizing constants improves maintainability and reduces the
//! risk of inconsistencies across the codebase.
//!
//! ## Binding Names
//!
//! Constants for Cloudflare Worker bindings that must match wrangler.toml
//! configuration.
//!
//! ## Cache
//!
//! The offline cache bucket is versioned by name; bumping the version retires
//! the previous bucket (see `offline`).

/// Standard KV configuration binding name
pub const APP_CONFIG_KV_NAME: &str = "APP_CONFIG";

/// Standard R2 bucket binding name for uploaded media
pub const MEDIA_BUCKET_NAME: &str = "MEDIA_BUCKET";

/// Standard D1 database binding name for mission records
pub const MISSIONS_DB_NAME: &str = "MISSIONS_DB";

/// Default maximum upload size (50MB)
pub const DEFAULT_MAX_UPLOAD_SIZE: u64 = 52_428_800;

/// Default public base URL for uploaded media objects
pub const DEFAULT_MEDIA_BASE_URL: &str = "https://media.vaulted-ambition.app";

/// Upload folder used when the form does not name one
pub const DEFAULT_UPLOAD_FOLDER: &str = "motivation";

/// Current offline cache bucket name
pub const CACHE_NAME: &str = "va-cache-v1";

/// Bucket names superseded by [`CACHE_NAME`]. The platform cannot drop a
/// whole named cache, so activation evicts their seed entries instead.
pub const RETIRED_CACHE_NAMES: &[&str] = &["va-cache-v0"];

/// Routes pre-populated into the cache bucket during install
pub const CACHE_SEED_ROUTES: &[&str] = &["/", "/offline", "/favicon.ico"];

/// Offline fallback page served when a navigation cannot be satisfied
pub const OFFLINE_ROUTE: &str = "/offline";

/// CORS header for allowed origins
pub const CORS_ALLOW_ORIGIN: &str = "*";

/// CORS header for allowed methods
pub const CORS_ALLOW_METHODS: &str = "GET, POST, PATCH, DELETE, OPTIONS";

/// CORS header for allowed headers
pub const CORS_ALLOW_HEADERS: &str = "Content-Type";
