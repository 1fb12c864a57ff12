//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with a single fallback handler
//! - Wire up middleware (tracing, timeouts, body limits, backpressure)
//! - Convert axum requests into dispatch contexts and back
//! - Run the synchronous pipeline off the async workers
//! - Bind server to listener and stop on shutdown
//!
//! # Design Decisions
//! - Every method and path goes to the fallback; matching happens in our registry
//! - Handlers are plain closures that may block, so dispatch runs on the blocking pool
//! - The router is frozen behind an `Arc` before the first request

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Request as AxumRequest, State},
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response as AxumResponse},
};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, Semaphore};
use tower_http::{limit::RequestBodyLimitLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::ServerConfig;
use crate::dispatch::INTERNAL_ERROR_BODY;
use crate::http::request::{Request, X_REQUEST_ID};
use crate::lifecycle::signals::wait_for_shutdown;
use crate::router::Router;

/// Error type for running the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Application state injected into the fallback handler.
#[derive(Clone)]
pub struct AppState {
    pub router: Arc<Router>,
    pub max_body_size: usize,
    /// Bounds how many dispatches occupy the blocking pool at once.
    pub dispatch_limit: Arc<Semaphore>,
}

/// HTTP server exposing a [`Router`] over Axum.
pub struct HttpServer {
    app: axum::Router,
    config: ServerConfig,
}

impl HttpServer {
    /// Create a new HTTP server, registering configured static locations on `router`.
    pub fn new(config: ServerConfig, mut router: Router) -> Self {
        for location in config.static_files.locations() {
            tracing::info!(location = %location, "Serving static files");
            router.static_files(location);
        }

        tracing::info!(
            routes = router.registry().routes().len(),
            exception_handlers = router.exceptions().len(),
            "Router frozen"
        );

        let state = AppState {
            router: Arc::new(router),
            max_body_size: config.limits.max_body_size,
            dispatch_limit: Arc::new(Semaphore::new(config.listener.max_concurrent_requests)),
        };
        let app = Self::build_router(&config, state);
        Self { app, config }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ServerConfig, state: AppState) -> axum::Router {
        axum::Router::new()
            .fallback(dispatch_handler)
            .with_state(state)
            .layer(RequestBodyLimitLayer::new(config.limits.max_body_size))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server until `shutdown` fires or the process is interrupted.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ServerError> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.app)
            .with_graceful_shutdown(wait_for_shutdown(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// The assembled Axum router, for embedding or driving with `oneshot`.
    pub fn into_router(self) -> axum::Router {
        self.app
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

/// Fallback handler: every request goes through the dispatch pipeline.
async fn dispatch_handler(State(state): State<AppState>, request: AxumRequest) -> AxumResponse {
    let (parts, body) = request.into_parts();
    let bytes = match axum::body::to_bytes(body, state.max_body_size).await {
        Ok(bytes) => bytes,
        Err(error) => {
            tracing::warn!(error = %error, path = %parts.uri.path(), "Rejecting request body");
            return StatusCode::PAYLOAD_TOO_LARGE.into_response();
        }
    };

    let ctx = Request::from_parts(&parts, bytes);
    let request_id = ctx.id().to_string();
    let span = tracing::info_span!(
        "request",
        request_id = %request_id,
        method = %ctx.method(),
        path = %ctx.path(),
    );

    // Waits when the limit is reached, providing backpressure.
    let _permit = match state.dispatch_limit.clone().acquire_owned().await {
        Ok(permit) => permit,
        Err(_) => return StatusCode::SERVICE_UNAVAILABLE.into_response(),
    };

    let router = state.router.clone();
    let joined = tokio::task::spawn_blocking(move || span.in_scope(|| router.pipeline().run(ctx))).await;

    let mut response = match joined {
        Ok(dispatched) => {
            tracing::debug!(
                request_id = %request_id,
                status = dispatched.response.status().as_u16(),
                outcome = ?dispatched.outcome,
                "Request dispatched"
            );
            dispatched.response.into_response()
        }
        Err(error) => {
            tracing::error!(request_id = %request_id, error = %error, "Dispatch task failed");
            (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_BODY).into_response()
        }
    };

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(X_REQUEST_ID, value);
    }
    response
}
