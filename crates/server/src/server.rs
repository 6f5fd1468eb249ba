use axum::{middleware, Router};
use galleria_core::config::{self, CoreConfig, ServerConfig, VisionConfig};
use galleria_storage::{StorageConfig, StorageType};
use galleria_vision::{GeminiClient, GeminiOptions};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::{
    timeout::TimeoutLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{error, info, warn, Level};

use crate::{
    flash::FlashStore,
    gallery::GalleryService,
    middleware::request_id_middleware,
    routes::{create_router, AppState},
    ServerError, ServerResult,
};

/// Main server struct that owns the router and bind address
pub struct Server {
    router: Router,
    addr: SocketAddr,
}

impl Server {
    /// Build every service from `config` and wire the router
    pub async fn new(config: CoreConfig) -> ServerResult<Self> {
        info!("Initializing Galleria server...");

        config.validate()?;
        if config.session.uses_default_secret() {
            warn!("Using the default session secret; set session.secret before deploying");
        }

        let storage_backend = storage_config(&config.storage)?
            .create_backend()
            .await
            .map_err(|e| ServerError::Internal(format!("Storage initialization failed: {}", e)))?;

        let vision = GeminiClient::new(gemini_options(&config.vision)).map_err(|e| {
            ServerError::Internal(format!("Vision client initialization failed: {}", e))
        })?;

        let state = AppState::new(
            GalleryService::new(storage_backend, Arc::new(vision))
                .with_vision_timeout(Duration::from_secs(config.vision.timeout)),
            FlashStore::new(&config.session.secret, config.session.flash_cookie.clone()),
            config.server.image_disposition,
        );

        let router = create_app_router(state, &config.server);

        let addr = format!("{}:{}", config.server.host, config.server.port)
            .parse()
            .map_err(|e| ServerError::Internal(format!("Invalid server address: {}", e)))?;

        Ok(Self { router, addr })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Start the server and listen for incoming connections
    pub async fn serve(self) -> ServerResult<()> {
        info!("Starting server on {}", self.addr);

        let listener = tokio::net::TcpListener::bind(self.addr)
            .await
            .map_err(|e| ServerError::Internal(format!("Failed to bind to address: {}", e)))?;

        info!("Server listening on http://{}", self.addr);
        info!("Health check available at http://{}/api/health", self.addr);

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| ServerError::Internal(format!("Server error: {}", e)))?;

        info!("Server shutdown complete");
        Ok(())
    }
}

/// Convert the core storage section into a backend description
fn storage_config(storage: &config::StorageConfig) -> ServerResult<StorageConfig> {
    let storage_type = match storage.backend {
        config::StorageBackend::Local => StorageType::Local {
            path: storage.local.base_path.clone(),
        },
        config::StorageBackend::Memory => {
            warn!("Using in-memory storage; uploads are lost on restart");
            StorageType::Memory
        }
        #[cfg(feature = "s3")]
        config::StorageBackend::S3 => StorageType::S3 {
            bucket: storage.s3.bucket.clone(),
            region: storage.s3.region.clone(),
            access_key_id: storage.s3.access_key_id.clone(),
            secret_access_key: storage.s3.secret_access_key.clone(),
            endpoint: storage.s3.endpoint.clone(),
        },
        #[cfg(not(feature = "s3"))]
        config::StorageBackend::S3 => {
            return Err(ServerError::Internal(
                "S3 storage requested but this build lacks the `s3` feature".to_string(),
            ))
        }
    };

    Ok(StorageConfig::new(storage_type))
}

/// Gemini client settings for the `vision` config section
pub fn gemini_options(vision: &VisionConfig) -> GeminiOptions {
    GeminiOptions {
        api_key: vision.api_key.clone(),
        model: vision.model.clone(),
        endpoint: vision.endpoint.clone(),
        temperature: vision.temperature,
        top_p: vision.top_p,
        top_k: vision.top_k,
        max_output_tokens: vision.max_output_tokens,
        timeout: Duration::from_secs(vision.timeout),
    }
}

/// Create the main application router with full middleware stack
pub fn create_app_router(state: AppState, config: &ServerConfig) -> Router {
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_request(DefaultOnRequest::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    let timeout_layer = TimeoutLayer::new(Duration::from_secs(config.request_timeout));

    let middleware_stack = ServiceBuilder::new()
        .layer(middleware::from_fn(request_id_middleware))
        .layer(trace_layer)
        .layer(timeout_layer);

    create_router(state, config.max_upload_size).layer(middleware_stack)
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown...");
        },
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown...");
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request, http::StatusCode};
    use tower::ServiceExt;

    fn memory_config() -> CoreConfig {
        let mut config = CoreConfig::default();
        config.storage.backend = config::StorageBackend::Memory;
        config.server.host = "127.0.0.1".to_string();
        config
    }

    #[tokio::test]
    async fn test_server_builds_from_memory_config() {
        let server = Server::new(memory_config()).await.unwrap();
        assert_eq!(server.addr().to_string(), "127.0.0.1:8080");

        let response = server
            .router()
            .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn test_invalid_config_is_rejected() {
        let mut config = memory_config();
        config.server.request_timeout = 0;

        let err = Server::new(config).await.err().unwrap();
        assert!(matches!(err, ServerError::Core(_)));
    }

    #[tokio::test]
    async fn test_local_storage_directory_is_created() {
        let temp_dir = tempfile::tempdir().unwrap();
        let base_path = temp_dir.path().join("photos");

        let mut config = memory_config();
        config.storage.backend = config::StorageBackend::Local;
        config.storage.local.base_path = base_path.clone();

        Server::new(config).await.unwrap();
        assert!(base_path.is_dir());
    }

    #[test]
    fn test_gemini_options_follow_config() {
        let mut vision = VisionConfig::default();
        vision.api_key = Some("key".to_string());
        vision.timeout = 5;

        let options = gemini_options(&vision);
        assert_eq!(options.api_key.as_deref(), Some("key"));
        assert_eq!(options.timeout, Duration::from_secs(5));
        assert_eq!(options.model, vision.model);
    }
}
