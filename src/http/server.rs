//! HTTP server setup and lifecycle.
//!
//! # Responsibilities
//! - Create the Axum Router serving the agent endpoint
//! - Wire up middleware (tracing, request ID, decompression, body limit,
//!   concurrency limit)
//! - Validate the config, bind the listener and serve in a background task
//! - Drain in-flight requests on shutdown

use axum::extract::DefaultBodyLimit;
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::any;
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tower::ServiceBuilder;
use tower_http::decompression::RequestDecompressionLayer;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::config::{validate_config, InvalidSetting, ReceiverConfig};
use crate::consumer::TraceConsumer;
use crate::http::handler::invoke_raw_method;
use crate::http::middleware::{limit_concurrency, reject_undecoded_body};
use crate::http::request::MakeRequestUuidV4;
use crate::lifecycle::Shutdown;
use crate::net::{self, TransportError};
use crate::registry::ConnectionRegistry;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub registry: ConnectionRegistry,
    pub consumer: Arc<dyn TraceConsumer>,
    /// Host returned from `preconnect`.
    pub redirect_host: Arc<str>,
}

/// Errors from starting or stopping the receiver.
#[derive(Debug, Error)]
pub enum ReceiverError {
    /// The config handed to `new` failed validation.
    #[error("invalid configuration: {}", join_settings(.0))]
    Config(Vec<InvalidSetting>),

    /// The socket could not be bound.
    #[error("failed to start listener: {0}")]
    Transport(#[from] TransportError),

    #[error("receiver is already running on {0}")]
    AlreadyRunning(SocketAddr),

    /// The server task ended with an I/O error.
    #[error("server failed: {0}")]
    Serve(#[source] std::io::Error),

    /// The server task panicked or was cancelled.
    #[error("server task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("in-flight requests did not finish within {0:?}")]
    ShutdownTimeout(Duration),
}

fn join_settings(settings: &[InvalidSetting]) -> String {
    settings
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

struct Running {
    local_addr: SocketAddr,
    handle: JoinHandle<std::io::Result<()>>,
}

/// HTTP receiver for New Relic agents.
///
/// Owns its connection registry; the host supplies the config and the
/// consumer that receives translated traces.
pub struct NewRelicReceiver {
    config: ReceiverConfig,
    registry: ConnectionRegistry,
    consumer: Arc<dyn TraceConsumer>,
    shutdown: Shutdown,
    running: Option<Running>,
}

impl NewRelicReceiver {
    /// Create a receiver with an empty registry. Nothing is bound until `start`.
    pub fn new(config: ReceiverConfig, consumer: Arc<dyn TraceConsumer>) -> Self {
        Self {
            config,
            registry: ConnectionRegistry::new(),
            consumer,
            shutdown: Shutdown::new(),
            running: None,
        }
    }

    /// Use `registry` instead of a fresh one.
    pub fn with_registry(mut self, registry: ConnectionRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    pub fn config(&self) -> &ReceiverConfig {
        &self.config
    }

    /// Address the receiver is listening on, once started.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.running.as_ref().map(|r| r.local_addr)
    }

    /// Build the router, advertising `redirect_host` from `preconnect`.
    ///
    /// Fails if the config does not validate.
    pub fn router(&self, redirect_host: impl Into<String>) -> Result<Router, ReceiverError> {
        validate_config(&self.config).map_err(ReceiverError::Config)?;

        let state = AppState {
            registry: self.registry.clone(),
            consumer: Arc::clone(&self.consumer),
            redirect_host: Arc::from(redirect_host.into()),
        };
        Ok(Self::build_router(&self.config, state))
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// Route layers run after decompression and before the handler extracts
    /// the body, so the concurrency permit covers body buffering.
    fn build_router(config: &ReceiverConfig, state: AppState) -> Router {
        let request_limit = Arc::new(Semaphore::new(config.listener.max_concurrent_requests));

        Router::new()
            .route(&config.protocol.path, any(invoke_raw_method))
            .route_layer(from_fn_with_state(request_limit, limit_concurrency))
            .route_layer(from_fn(reject_undecoded_body))
            .with_state(state)
            .layer(DefaultBodyLimit::max(config.limits.max_body_size))
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV4))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(RequestDecompressionLayer::new().pass_through_unaccepted(true)),
            )
    }

    /// Bind the listener and start serving in the background.
    ///
    /// Returns the bound address. Invalid config and bind failures are
    /// returned, not logged.
    pub async fn start(&mut self) -> Result<SocketAddr, ReceiverError> {
        if let Some(running) = &self.running {
            return Err(ReceiverError::AlreadyRunning(running.local_addr));
        }
        validate_config(&self.config).map_err(ReceiverError::Config)?;

        let (listener, local_addr) = net::bind(&self.config.listener).await?;
        let redirect_host = self
            .config
            .protocol
            .redirect_host
            .clone()
            .unwrap_or_else(|| local_addr.to_string());
        let router = self.router(redirect_host)?;
        let signal = self.shutdown.notified();

        let handle = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(signal)
                .await
        });

        tracing::info!(
            address = %local_addr,
            path = %self.config.protocol.path,
            "New Relic receiver started"
        );
        self.running = Some(Running { local_addr, handle });
        Ok(local_addr)
    }

    /// Stop accepting connections and wait for in-flight requests.
    ///
    /// A receiver that was never started shuts down trivially.
    pub async fn shutdown(&mut self) -> Result<(), ReceiverError> {
        let Some(Running { local_addr, mut handle }) = self.running.take() else {
            return Ok(());
        };

        tracing::info!(address = %local_addr, "New Relic receiver draining");
        self.shutdown.trigger();

        let deadline = Duration::from_secs(self.config.timeouts.shutdown_secs);
        match tokio::time::timeout(deadline, &mut handle).await {
            Ok(joined) => joined?.map_err(ReceiverError::Serve)?,
            Err(_) => {
                handle.abort();
                tracing::warn!(timeout = ?deadline, "Shutdown deadline passed, aborting server");
                return Err(ReceiverError::ShutdownTimeout(deadline));
            }
        }

        tracing::info!(address = %local_addr, "New Relic receiver stopped");
        Ok(())
    }
}

impl Drop for NewRelicReceiver {
    fn drop(&mut self) {
        if self.running.is_some() {
            self.shutdown.trigger();
        }
    }
}
