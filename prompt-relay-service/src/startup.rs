//! Application startup and lifecycle management.

use crate::config::RelayConfig;
use crate::handlers;
use crate::services::providers::gemini::{GeminiConfig, GeminiTextProvider};
use crate::services::providers::imagen::{ImagenConfig, ImagenProvider};
use crate::services::providers::{GoogleClient, ImageParams, ImageProvider, TextProvider};
use crate::services::PromptRelay;
use axum::{
    http::{header, HeaderName, HeaderValue, Method},
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{
    metrics::metrics_middleware, security_headers::security_headers_middleware,
    tracing::{request_id_middleware, REQUEST_ID_HEADER},
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<RelayConfig>,
    pub relay: PromptRelay,
}

impl AppState {
    /// Wire the Google-backed providers from configuration. Both share one
    /// HTTP client.
    pub fn from_config(config: RelayConfig) -> Result<Self, AppError> {
        let client = GoogleClient::new(
            config.google.api_base.clone(),
            config.google.api_key.clone(),
            config.google.timeout,
        )
        .map_err(|e| AppError::ConfigError(anyhow::Error::new(e)))?;

        let text_provider: Arc<dyn TextProvider> = Arc::new(GeminiTextProvider::new(
            client.clone(),
            GeminiConfig {
                model: config.models.text_model.clone(),
            },
        ));
        let image_provider: Arc<dyn ImageProvider> = Arc::new(ImagenProvider::new(
            client,
            ImagenConfig {
                model: config.models.image_model.clone(),
            },
        ));

        tracing::info!(
            text_model = %config.models.text_model,
            image_model = %config.models.image_model,
            api_base = %config.google.api_base,
            "Initialized Google providers"
        );

        Ok(Self::with_providers(config, text_provider, image_provider))
    }

    pub fn with_providers(
        config: RelayConfig,
        text_provider: Arc<dyn TextProvider>,
        image_provider: Arc<dyn ImageProvider>,
    ) -> Self {
        let image_params = ImageParams {
            aspect_ratio: config.models.aspect_ratio.clone(),
            ..ImageParams::default()
        };

        Self {
            config: Arc::new(config),
            relay: PromptRelay::new(text_provider, image_provider, image_params),
        }
    }
}

/// Build the HTTP router with the full middleware stack.
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config);

    Router::new()
        .route("/generate-image", post(handlers::generate_image))
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/metrics", get(handlers::metrics_endpoint))
        .with_state(state)
        .layer(from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(
            |request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            },
        ))
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(cors)
}

fn cors_layer(config: &RelayConfig) -> CorsLayer {
    let origins = if config.cors.allows_any() {
        AllowOrigin::from(Any)
    } else {
        let parsed = config
            .cors
            .allowed_origins
            .iter()
            .filter_map(|o| match o.parse::<HeaderValue>() {
                Ok(value) => Some(value),
                Err(e) => {
                    tracing::error!("Invalid CORS origin '{}': {}. Skipping.", o, e);
                    None
                }
            })
            .collect::<Vec<HeaderValue>>();
        AllowOrigin::list(parsed)
    };

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static(REQUEST_ID_HEADER),
        ])
        .expose_headers([HeaderName::from_static(REQUEST_ID_HEADER)])
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Build the application with the given configuration.
    pub async fn build(config: RelayConfig) -> Result<Self, AppError> {
        let port = config.common.port;
        let state = AppState::from_config(config)?;
        Self::bind(port, state).await
    }

    /// Build the application around already-constructed state.
    pub async fn with_state(state: AppState) -> Result<Self, AppError> {
        let port = state.config.common.port;
        Self::bind(port, state).await
    }

    async fn bind(port: u16, state: AppState) -> Result<Self, AppError> {
        // Port 0 = random port for testing
        let addr = SocketAddr::from(([0, 0, 0, 0], port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind HTTP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Prompt relay service: HTTP on port {}", port);

        Ok(Self {
            port,
            listener,
            state,
        })
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Run the application until a shutdown signal arrives.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        let router = build_router(self.state);

        axum::serve(self.listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| {
                tracing::error!("HTTP server error: {}", e);
                std::io::Error::other(format!("HTTP server error: {}", e))
            })
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
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
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
