//! # Offline Cache
//!
//! Makes the hosted client minimally usable without network connectivity,
//! using a single versioned cache bucket and the same lifecycle the browser
//! service worker model defines:
//!
//! - **install**: pre-populate the bucket with the seed routes (home page,
//!   offline fallback, favicon). All-or-nothing; a failed seed leaves the
//!   worker uninstalled and the next request retries.
//! - **activate**: evict the seed entries of retired bucket names. The
//!   platform cannot drop a whole named cache, so superseded buckets are
//!   purged entry-by-entry.
//! - **fetch**: navigations go network-first with cache fallback and the
//!   offline page as last resort; static sub-resources go cache-first with
//!   write-through. Everything else rides the network untouched.
//!
//! The platform has no install event, so install/activate run lazily before
//! the first intercepted request, guarded by an isolate-wide flag. Cache
//! writes are last-write-wins; concurrent requests never coordinate.

use std::sync::atomic::{AtomicBool, Ordering};

use futures::future::join_all;
use worker::*;

use crate::config::Config;
use crate::constants::{CACHE_NAME, CACHE_SEED_ROUTES, OFFLINE_ROUTE, RETIRED_CACHE_NAMES};

static INSTALLED: AtomicBool = AtomicBool::new(false);

/// How the interceptor treats one request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequestClass {
    /// Full-page load: network first, cached copy, then the offline page.
    Navigation,
    /// Style/script/image/font: cached copy first, write-through on miss.
    StaticAsset,
    /// Different origin, non-GET, API call, or anything else: plain fetch.
    PassThrough,
}

/// Decide the caching strategy for a request.
///
/// Navigations are recognized by `Sec-Fetch-Mode: navigate` with an
/// `Accept: text/html` fallback for older clients; static sub-resources by
/// `Sec-Fetch-Dest` with a file-extension fallback.
pub fn classify(
    method: &Method,
    path: &str,
    same_origin: bool,
    sec_fetch_mode: Option<&str>,
    sec_fetch_dest: Option<&str>,
    accept: Option<&str>,
) -> RequestClass {
    if !same_origin || *method != Method::Get || path.starts_with("/api/") {
        return RequestClass::PassThrough;
    }

    if sec_fetch_mode == Some("navigate")
        || accept.map_or(false, |a| a.starts_with("text/html"))
    {
        return RequestClass::Navigation;
    }

    if matches!(
        sec_fetch_dest,
        Some("style") | Some("script") | Some("image") | Some("font")
    ) || has_static_extension(path)
    {
        return RequestClass::StaticAsset;
    }

    RequestClass::PassThrough
}

fn has_static_extension(path: &str) -> bool {
    const STATIC_EXTENSIONS: &[&str] = &[
        "css", "js", "mjs", "png", "jpg", "jpeg", "gif", "webp", "svg", "ico", "woff", "woff2",
        "ttf",
    ];

    let file_name = path.rsplit('/').next().unwrap_or("");
    match file_name.rsplit_once('.') {
        Some((_, ext)) => STATIC_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()),
        None => false,
    }
}

/// Intercept a non-API request.
pub async fn handle_fetch(req: Request, config: &Config) -> Result<Response> {
    let url = req.url()?;
    let same_origin = config
        .site_host
        .as_deref()
        .map_or(true, |host| url.host_str() == Some(host));

    let headers = req.headers();
    let class = classify(
        &req.method(),
        url.path(),
        same_origin,
        headers.get("Sec-Fetch-Mode")?.as_deref(),
        headers.get("Sec-Fetch-Dest")?.as_deref(),
        headers.get("Accept")?.as_deref(),
    );

    match class {
        RequestClass::PassThrough => Fetch::Request(req).send().await,
        RequestClass::Navigation => {
            ensure_ready(&url).await;
            network_first(req, &url).await
        }
        RequestClass::StaticAsset => {
            ensure_ready(&url).await;
            cache_first(req, &url).await
        }
    }
}

/// Run install + activate once per isolate. A failed install leaves the flag
/// unset so the next intercepted request retries.
async fn ensure_ready(origin: &Url) {
    if INSTALLED.load(Ordering::Acquire) {
        return;
    }

    match install(origin).await {
        Ok(()) => {
            activate(origin).await;
            INSTALLED.store(true, Ordering::Release);
        }
        Err(err) => console_warn!("offline cache install failed: {}", err),
    }
}

/// Pre-populate the current bucket with the seed routes.
async fn install(origin: &Url) -> Result<()> {
    let cache = Cache::open(CACHE_NAME.to_string()).await;
    let seeds = CACHE_SEED_ROUTES
        .iter()
        .map(|route| seed_route(&cache, origin, route));

    // all-or-nothing, like the batch-fetch primitive in the browser model
    for outcome in join_all(seeds).await {
        outcome?;
    }
    Ok(())
}

async fn seed_route(cache: &Cache, origin: &Url, route: &str) -> Result<()> {
    let url = absolute(origin, route);
    let mut response = Fetch::Url(url.clone()).send().await?;
    if response.status_code() >= 400 {
        return Err(Error::RustError(format!(
            "seed fetch for {} returned {}",
            route,
            response.status_code()
        )));
    }
    cache.put(url.as_str(), response.cloned()?).await
}

/// Purge the seed entries of superseded bucket names.
async fn activate(origin: &Url) {
    for name in RETIRED_CACHE_NAMES {
        let cache = Cache::open((*name).to_string()).await;
        for route in CACHE_SEED_ROUTES {
            let url = absolute(origin, route);
            // best effort; the bucket may never have existed
            let _ = cache.delete(url.as_str(), true).await;
        }
    }
}

/// Navigation strategy: live fetch, falling back to the cached entry, then
/// the cached offline page, then a generic network-error response.
async fn network_first(req: Request, url: &Url) -> Result<Response> {
    let cache = Cache::open(CACHE_NAME.to_string()).await;

    match Fetch::Request(req).send().await {
        Ok(mut fresh) => {
            // copy into the bucket; uncacheable responses are not fatal
            if let Ok(copy) = fresh.cloned() {
                let _ = cache.put(url.as_str(), copy).await;
            }
            Ok(fresh)
        }
        Err(_) => {
            if let Some(cached) = cache.get(url.as_str(), false).await? {
                return Ok(cached);
            }
            let offline = absolute(url, OFFLINE_ROUTE);
            if let Some(page) = cache.get(offline.as_str(), false).await? {
                return Ok(page);
            }
            Response::error("Network error", 503)
        }
    }
}

/// Static asset strategy: cached copy if present, otherwise fetch live and
/// write through for next time.
async fn cache_first(req: Request, url: &Url) -> Result<Response> {
    let cache = Cache::open(CACHE_NAME.to_string()).await;

    if let Some(cached) = cache.get(url.as_str(), false).await? {
        return Ok(cached);
    }

    match Fetch::Request(req).send().await {
        Ok(mut fresh) => {
            if let Ok(copy) = fresh.cloned() {
                let _ = cache.put(url.as_str(), copy).await;
            }
            Ok(fresh)
        }
        Err(_) => Response::error("Network error", 503),
    }
}

/// Same-origin absolute URL for a route, with any query stripped.
fn absolute(origin: &Url, route: &str) -> Url {
    let mut url = origin.clone();
    url.set_path(route);
    url.set_query(None);
    url.set_fragment(None);
    url
}
