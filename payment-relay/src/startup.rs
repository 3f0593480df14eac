//! Application startup and lifecycle management.

use axum::{
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{
    security_headers::security_headers_middleware,
    tracing::{request_id_middleware, REQUEST_ID_HEADER},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::Config;
use crate::handlers;
use crate::services::{CallbackVerifier, CheckoutGateway, SslCommerzClient, TransactionIdGenerator};

/// Shared application state. Everything in here is read-only after startup
/// apart from the transaction id sequence.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub gateway: Arc<dyn CheckoutGateway>,
    pub callback_verifier: CallbackVerifier,
    pub transaction_ids: Arc<TransactionIdGenerator>,
}

impl AppState {
    pub fn new(config: Config, gateway: Arc<dyn CheckoutGateway>) -> Self {
        Self {
            callback_verifier: CallbackVerifier::new(&config.store),
            config,
            gateway,
            transaction_ids: Arc::new(TransactionIdGenerator::new()),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health_check))
        .route("/order", post(handlers::order::create_order))
        .merge(handlers::callback::router())
        .layer(from_fn(security_headers_middleware))
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
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
            }),
        )
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Build the application against the real SSLCommerz API.
    pub async fn build(config: Config) -> Result<Self, AppError> {
        let client = SslCommerzClient::new(config.store.clone()).map_err(|e| {
            tracing::error!("Failed to create SSLCommerz client: {}", e);
            AppError::InternalError(e.into())
        })?;

        if client.is_configured() {
            tracing::info!(
                live = config.store.is_live,
                api = %config.store.api_base_url,
                "SSLCommerz client initialized"
            );
        } else {
            tracing::warn!("SSLCommerz credentials not configured - checkout sessions will fail");
        }

        Self::build_with_gateway(config, Arc::new(client)).await
    }

    /// Build the application with any gateway implementation.
    pub async fn build_with_gateway(
        config: Config,
        gateway: Arc<dyn CheckoutGateway>,
    ) -> Result<Self, AppError> {
        if config.callback.require_signature {
            tracing::info!("Callback signature enforcement enabled");
        }

        let state = AppState::new(config.clone(), gateway);

        // Port 0 picks a random port (tests)
        let addr = format!("{}:{}", config.server.host, config.server.port);
        let listener = TcpListener::bind(addr.as_str()).await.map_err(|e| {
            tracing::error!("Failed to bind HTTP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!(
            port,
            base_url = %config.callback.base_url,
            "Payment relay ready"
        );

        Ok(Self {
            port,
            listener,
            router: router(state),
        })
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Serve until Ctrl-C.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        tracing::info!("Listening on port {}", self.port);

        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(async {
                let _ = tokio::signal::ctrl_c().await;
            })
            .await
    }
}
