//! HTTP request handlers.

use std::sync::Arc;

use axum::{
    Json,
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use payments_types::{
    AppError, BalanceResponse, CreateRecipientRequest, InitializeDepositRequest,
    LedgerRepository, PaymentGateway, VerificationResponse, WithdrawalRequest,
};

use super::signature::{self, SIGNATURE_HEADER};
use crate::PaymentService;

/// Application state shared across handlers.
pub struct AppState<R: LedgerRepository, G: PaymentGateway> {
    pub service: PaymentService<R, G>,
    /// Key used to authenticate gateway webhooks; webhooks are refused without one
    pub webhook_secret: Option<String>,
}

/// Wrapper to implement IntoResponse for AppError (orphan rule workaround).
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::InsufficientFunds {
                available,
                requested,
            } => (
                StatusCode::BAD_REQUEST,
                format!(
                    "Insufficient funds. Available balance: {}, requested: {}",
                    available, requested
                ),
            ),
            AppError::PaymentFailed(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An unexpected error occurred".to_string(),
                )
            }
        };

        let body = serde_json::json!({
            "error": message,
            "code": status.as_u16()
        });

        (status, Json(body)).into_response()
    }
}

/// Health check endpoint.
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "healthy" }))
}

// ─────────────────────────────────────────────────────────────────────────────
// Deposits
// ─────────────────────────────────────────────────────────────────────────────

#[tracing::instrument(skip_all, fields(email = %req.email))]
pub async fn initialize_deposit<R: LedgerRepository, G: PaymentGateway>(
    State(state): State<Arc<AppState<R, G>>>,
    Json(req): Json<InitializeDepositRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let authorization = state.service.initialize_deposit(req).await?;
    Ok((StatusCode::CREATED, Json(authorization)))
}

#[tracing::instrument(skip(state))]
pub async fn verify_deposit<R: LedgerRepository, G: PaymentGateway>(
    State(state): State<Arc<AppState<R, G>>>,
    Path(reference): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = state.service.verify_deposit(&reference).await?;
    let tx = outcome.transaction;
    Ok(Json(VerificationResponse {
        reference: tx.reference.into(),
        status: tx.status,
        amount: tx.amount.amount(),
        email: tx.identity.map(String::from),
        credited: outcome.credited,
    }))
}

// ─────────────────────────────────────────────────────────────────────────────
// Withdrawals
// ─────────────────────────────────────────────────────────────────────────────

#[tracing::instrument(skip_all, fields(email = %req.email))]
pub async fn initiate_withdrawal<R: LedgerRepository, G: PaymentGateway>(
    State(state): State<Arc<AppState<R, G>>>,
    Json(req): Json<WithdrawalRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let withdrawal = state.service.initiate_withdrawal(req).await?;
    Ok(Json(withdrawal))
}

// ─────────────────────────────────────────────────────────────────────────────
// Queries
// ─────────────────────────────────────────────────────────────────────────────

/// List transactions for a customer, newest first.
#[tracing::instrument(skip(state))]
pub async fn list_transactions<R: LedgerRepository, G: PaymentGateway>(
    State(state): State<Arc<AppState<R, G>>>,
    Path(email): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let transactions = state.service.list_transactions(&email).await?;
    Ok(Json(transactions))
}

#[tracing::instrument(skip(state))]
pub async fn get_balance<R: LedgerRepository, G: PaymentGateway>(
    State(state): State<Arc<AppState<R, G>>>,
    Path(email): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let balance = state.service.get_balance(&email).await?;
    Ok(Json(BalanceResponse {
        email: email.trim().to_string(),
        balance: balance.amount(),
    }))
}

#[tracing::instrument(skip(state))]
pub async fn get_transaction<R: LedgerRepository, G: PaymentGateway>(
    State(state): State<Arc<AppState<R, G>>>,
    Path(reference): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let tx = state.service.get_transaction(&reference).await?;
    Ok(Json(tx))
}

// ─────────────────────────────────────────────────────────────────────────────
// Gateway pass-through
// ─────────────────────────────────────────────────────────────────────────────

#[tracing::instrument(skip_all, fields(bank_code = %req.bank_code))]
pub async fn create_recipient<R: LedgerRepository, G: PaymentGateway>(
    State(state): State<Arc<AppState<R, G>>>,
    Json(req): Json<CreateRecipientRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let recipient = state.service.create_recipient(req).await?;
    Ok((StatusCode::CREATED, Json(recipient)))
}

#[tracing::instrument(skip(state))]
pub async fn list_banks<R: LedgerRepository, G: PaymentGateway>(
    State(state): State<Arc<AppState<R, G>>>,
) -> Result<impl IntoResponse, ApiError> {
    let banks = state.service.list_banks().await?;
    Ok(Json(banks))
}

// ─────────────────────────────────────────────────────────────────────────────
// Webhooks
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct WebhookEvent {
    event: String,
    #[serde(default)]
    data: serde_json::Value,
}

/// Gateway event callback.
///
/// Only `charge.success` is acted on; it runs the same verification as
/// `GET /verify/{reference}`. Other events are acknowledged and ignored.
/// An internal failure answers 500 and the gateway redelivers the event;
/// payment failures and bad references are acknowledged.
#[tracing::instrument(skip_all)]
pub async fn webhook<R: LedgerRepository, G: PaymentGateway>(
    State(state): State<Arc<AppState<R, G>>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let Some(secret) = state.webhook_secret.as_deref() else {
        tracing::warn!("Webhook received but no secret is configured");
        return StatusCode::UNAUTHORIZED.into_response();
    };
    let provided = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if !signature::verify(secret.as_bytes(), &body, provided) {
        tracing::warn!("Webhook signature mismatch");
        return StatusCode::UNAUTHORIZED.into_response();
    }

    let event: WebhookEvent = match serde_json::from_slice(&body) {
        Ok(event) => event,
        Err(e) => {
            return ApiError(AppError::BadRequest(format!("Invalid webhook payload: {}", e)))
                .into_response();
        }
    };

    if event.event == "charge.success" {
        match event.data.get("reference").and_then(|r| r.as_str()) {
            Some(reference) => match state.service.verify_deposit(reference).await {
                Ok(outcome) => {
                    tracing::info!(reference, credited = outcome.credited, "Webhook verification done")
                }
                Err(AppError::Internal(msg)) => {
                    tracing::error!(reference, error = %msg, "Webhook verification failed");
                    return ApiError(AppError::Internal(msg)).into_response();
                }
                Err(e) => tracing::warn!(reference, error = %e, "Webhook verification rejected"),
            },
            None => tracing::warn!("charge.success event without reference"),
        }
    } else {
        tracing::debug!(event = %event.event, "Ignoring webhook event");
    }

    Json(serde_json::json!({ "received": true })).into_response()
}
