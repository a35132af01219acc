//! HTTP Server configuration and startup.

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use payments_types::{LedgerRepository, PaymentGateway};

use super::handlers::{self, AppState};
use crate::PaymentService;

/// HTTP Server for the Payments API.
pub struct HttpServer<R: LedgerRepository, G: PaymentGateway> {
    state: Arc<AppState<R, G>>,
}

impl<R: LedgerRepository, G: PaymentGateway> HttpServer<R, G> {
    /// Creates a new HTTP server with the given service. Webhooks are
    /// refused until a secret is configured.
    pub fn new(service: PaymentService<R, G>) -> Self {
        Self {
            state: Arc::new(AppState {
                service,
                webhook_secret: None,
            }),
        }
    }

    /// Creates a new HTTP server that accepts webhooks signed with `secret`.
    pub fn with_webhook_secret(service: PaymentService<R, G>, secret: impl Into<String>) -> Self {
        Self {
            state: Arc::new(AppState {
                service,
                webhook_secret: Some(secret.into()),
            }),
        }
    }

    /// Builds the Axum router with all routes.
    pub fn router(&self) -> Router {
        let payments = Router::new()
            .route(
                "/deposit/initialize",
                post(handlers::initialize_deposit::<R, G>),
            )
            .route("/verify/{reference}", get(handlers::verify_deposit::<R, G>))
            .route("/withdrawal", post(handlers::initiate_withdrawal::<R, G>))
            .route("/user/{email}", get(handlers::list_transactions::<R, G>))
            .route("/balance/{email}", get(handlers::get_balance::<R, G>))
            .route(
                "/transactions/{reference}",
                get(handlers::get_transaction::<R, G>),
            )
            .route("/recipients", post(handlers::create_recipient::<R, G>))
            .route("/banks", get(handlers::list_banks::<R, G>))
            .route("/webhook", post(handlers::webhook::<R, G>));

        Router::new()
            .route("/health", get(handlers::health))
            .nest("/api/v1/payments", payments)
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Runs the server on the given address with graceful shutdown.
    pub async fn run(self, addr: &str) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!("Server listening on {}", listener.local_addr()?);

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
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

    tracing::info!("Shutdown signal received, starting graceful shutdown...");
}
