use axum::{
    extract::{DefaultBodyLimit, Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use galleria_core::config::ImageDisposition;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, warn};

use crate::{
    error::ServerResult,
    files::{serve_image, upload_file},
    flash::{Flash, FlashStore},
    gallery::GalleryService,
    pages,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub gallery: Arc<GalleryService>,
    pub flash: Arc<FlashStore>,
    pub image_disposition: ImageDisposition,
}

impl AppState {
    pub fn new(
        gallery: GalleryService,
        flash: FlashStore,
        image_disposition: ImageDisposition,
    ) -> Self {
        Self {
            gallery: Arc::new(gallery),
            flash: Arc::new(flash),
            image_disposition,
        }
    }
}

/// Create the application router
pub fn create_router(state: AppState, max_upload_size: usize) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/healthz", get(health_check))
        .route("/readyz", get(readiness_check))
        .route("/description/:name", get(get_description));

    Router::new()
        .route("/", get(gallery_page))
        .route(
            "/upload",
            post(upload_file).layer(DefaultBodyLimit::max(max_upload_size)),
        )
        .route("/image/:name", get(serve_image))
        .route("/view/:name", get(detail_page))
        .route("/file/:name", get(detail_page))
        .route("/description/:name", get(get_description))
        .nest("/api", api_routes)
        .with_state(state)
}

/// Gallery page with any flash messages left by the previous request
async fn gallery_page(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let carried = state.flash.take(&headers);
    let mut messages = carried.clone().unwrap_or_default();

    let entries = match state.gallery.list_entries().await {
        Ok(entries) => entries,
        Err(e) => {
            error!("Error listing images: {}", e);
            messages.push(Flash::error(format!("Error listing images: {}", e)));
            Vec::new()
        }
    };

    let mut response = Html(pages::render_gallery(&entries, &messages)).into_response();

    if carried.is_some() {
        match HeaderValue::from_str(&state.flash.clear_cookie()) {
            Ok(value) => {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
            Err(e) => warn!("Could not clear flash cookie: {}", e),
        }
    }

    response
}

async fn detail_page(State(state): State<AppState>, Path(name): Path<String>) -> Html<String> {
    let detail = state.gallery.image_detail(&name).await;
    Html(pages::render_detail(&detail))
}

/// Stored description JSON for one image
async fn get_description(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ServerResult<Json<Value>> {
    Ok(Json(state.gallery.description_json(&name).await?))
}

/// Liveness check endpoint
async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now(),
        "service": "galleria",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Readiness check endpoint
async fn readiness_check(State(state): State<AppState>) -> Response {
    let storage_ok = match state.gallery.storage().list().await {
        Ok(_) => true,
        Err(e) => {
            warn!("Storage readiness check failed: {}", e);
            false
        }
    };

    let status = if storage_ok {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };

    let body = json!({
        "status": if storage_ok { "ready" } else { "not_ready" },
        "timestamp": chrono::Utc::now(),
        "service": "galleria",
        "version": env!("CARGO_PKG_VERSION"),
        "checks": {
            "storage": if storage_ok { "healthy" } else { "unhealthy" }
        }
    });

    (status, Json(body)).into_response()
}
