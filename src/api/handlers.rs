//! API Handlers
//!
//! HTTP request handlers for the cache admin endpoints.

use axum::{
    extract::{Path, State},
    Json,
};
use tracing::info;

use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::models::{
    ClearResponse, GuaranteeRequest, GuaranteeResponse, HealthResponse, ObjectResponse,
    PutObjectRequest, PutObjectResponse, RemovedResponse, StatsResponse, TextAgeResponse,
    TextResponse, TextTypeStats,
};
use crate::registry::CacheRegistry;
use crate::text::TextCache;

/// Application state shared across all handlers.
///
/// The registry's caches synchronize internally, so the state is a plain
/// clone of the registry.
#[derive(Clone)]
pub struct AppState {
    pub registry: CacheRegistry,
}

impl AppState {
    pub fn new(registry: CacheRegistry) -> Self {
        Self { registry }
    }

    /// Creates a new AppState from configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(CacheRegistry::from_config(config)?))
    }
}

// == Expiring objects ==

/// Handler for PUT /objects
pub async fn put_object_handler(
    State(state): State<AppState>,
    Json(req): Json<PutObjectRequest>,
) -> Result<Json<PutObjectResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let objects = state.registry.objects();
    match req.lifetime {
        Some(lifetime) => objects.put_with_lifetime(req.key.clone(), req.value, lifetime),
        None => objects.put(req.key.clone(), req.value),
    }

    Ok(Json(PutObjectResponse::new(req.key)))
}

/// Handler for GET /objects/:key
pub async fn get_object_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<ObjectResponse>> {
    let objects = state.registry.objects();
    let value = objects.get(&key).ok_or_else(|| not_found(&key, "objects"))?;
    let ttl = objects.time_to_live(&key).map(|ttl| ttl.as_secs());

    Ok(Json(ObjectResponse { key, value, ttl }))
}

/// Handler for DELETE /objects/:key
pub async fn delete_object_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<RemovedResponse>> {
    state
        .registry
        .objects()
        .remove(&key)
        .ok_or_else(|| not_found(&key, "objects"))?;

    Ok(Json(RemovedResponse { removed: 1 }))
}

/// Handler for POST /objects/:key/guarantee
pub async fn guarantee_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(req): Json<GuaranteeRequest>,
) -> Json<GuaranteeResponse> {
    let guaranteed = state.registry.objects().guarantee(&key, req.min_lifetime);
    Json(GuaranteeResponse { key, guaranteed })
}

/// Handler for POST /sweep
pub async fn sweep_handler(State(state): State<AppState>) -> Json<RemovedResponse> {
    let removed = state.registry.objects().clean();
    Json(RemovedResponse { removed })
}

/// Handler for DELETE /objects
pub async fn reset_objects_handler(State(state): State<AppState>) -> Json<RemovedResponse> {
    let objects = state.registry.objects();
    let removed = objects.len();
    objects.reset();
    info!("Expiring object cache reset, {} entries dropped", removed);
    Json(RemovedResponse { removed })
}

// == Text ==

/// Runs blocking cache work (file I/O, gzip, memory probing) off the runtime.
async fn blocking<T, F>(work: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work).await?
}

/// Handler for GET /text/:text_type/:id
pub async fn get_text_handler(
    State(state): State<AppState>,
    Path((text_type, id)): Path<(String, String)>,
) -> Result<Json<TextResponse>> {
    let texts = state.registry.texts().clone();
    let (t, i) = (text_type.clone(), id.clone());
    let contents = blocking(move || texts.get(&t, &i))
        .await?
        .ok_or_else(|| not_found(&format!("{}/{}", text_type, id), "texts"))?;

    Ok(Json(TextResponse {
        text_type,
        id,
        contents,
    }))
}

/// Handler for PUT /text/:text_type/:id
///
/// The request body is stored verbatim.
pub async fn put_text_handler(
    State(state): State<AppState>,
    Path((text_type, id)): Path<(String, String)>,
    body: String,
) -> Result<Json<TextResponse>> {
    let texts = state.registry.texts().clone();
    let (t, i) = (text_type.clone(), id.clone());
    let contents = blocking(move || texts.put(&t, &i, &body).map(|_| body)).await?;

    Ok(Json(TextResponse {
        text_type,
        id,
        contents,
    }))
}

/// Handler for GET /text/:text_type/:id/age
pub async fn text_age_handler(
    State(state): State<AppState>,
    Path((text_type, id)): Path<(String, String)>,
) -> Result<Json<TextAgeResponse>> {
    let texts = state.registry.texts().clone();
    let (t, i) = (text_type.clone(), id.clone());
    let (age, last_modified) = blocking(move || {
        let age = texts.age(&t, &i)?;
        let last_modified = texts.disk().last_modified(&t, &i)?;
        Ok((age, last_modified))
    })
    .await?;
    let age = age.ok_or_else(|| not_found(&format!("{}/{}", text_type, id), "texts"))?;

    Ok(Json(TextAgeResponse {
        text_type,
        id,
        age_seconds: age.as_secs(),
        last_modified,
    }))
}

/// Handler for DELETE /text/:text_type
pub async fn clear_text_handler(
    State(state): State<AppState>,
    Path(text_type): Path<String>,
) -> Result<Json<ClearResponse>> {
    let texts = state.registry.texts().clone();
    let t = text_type.clone();
    let removed = blocking(move || texts.clear(&t)).await?;
    Ok(Json(ClearResponse { text_type, removed }))
}

// == Service ==

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let texts = state.registry.texts();

    Json(StatsResponse {
        objects: state.registry.objects().len(),
        text_memory_entries: texts.memory_len(),
        text_total: TextTypeStats::from(texts.stats().total()),
        text_types: texts
            .stats_snapshot()
            .into_iter()
            .map(|(text_type, counts)| (text_type, TextTypeStats::from(counts)))
            .collect(),
    })
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

fn not_found(key: &str, lookup: &str) -> CacheError {
    CacheError::KeyNotFound {
        key: key.to_string(),
        lookup: lookup.to_string(),
    }
}
