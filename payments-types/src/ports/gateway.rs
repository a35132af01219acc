//! Payment gateway port.
//!
//! Implementations can be HTTP clients or deterministic in-memory stand-ins.
//! All amounts crossing this port are in minor units (kobo).

use serde::{Deserialize, Serialize};

use crate::domain::{Identity, Reference};

/// Error type for gateway operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum GatewayError {
    /// The gateway answered but refused the request
    #[error("Gateway rejected request: {0}")]
    Rejected(String),

    #[error("Gateway resource not found: {0}")]
    NotFound(String),

    #[error("Gateway unreachable: {0}")]
    Transport(String),

    #[error("Invalid gateway response: {0}")]
    InvalidResponse(String),
}

impl GatewayError {
    /// The gateway-provided message without the variant prefix.
    pub fn message(&self) -> &str {
        match self {
            GatewayError::Rejected(msg)
            | GatewayError::NotFound(msg)
            | GatewayError::Transport(msg)
            | GatewayError::InvalidResponse(msg) => msg,
        }
    }
}

/// A checkout to open on the gateway.
#[derive(Debug, Clone)]
pub struct DepositCharge {
    pub email: Identity,
    pub amount_minor: i64,
    pub reference: Reference,
    pub callback_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositAuthorization {
    pub authorization_url: String,
    pub access_code: String,
    pub reference: String,
}

/// What the gateway reports about a reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedPayment {
    /// False when the gateway reports the payment as failed
    pub success: bool,
    /// Raw gateway status, e.g. `success`, `failed`, `abandoned`
    pub status: String,
    pub reference: String,
    pub amount_minor: i64,
    /// Customer e-mail as reported by the gateway
    pub identity: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TransferInstruction {
    pub amount_minor: i64,
    pub recipient_code: String,
    pub reason: String,
    pub reference: Reference,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferReceipt {
    pub success: bool,
    pub reference: String,
    pub transfer_code: String,
    pub status: String,
}

#[derive(Debug, Clone)]
pub struct NewRecipient {
    pub recipient_type: String,
    pub name: String,
    pub account_number: String,
    pub bank_code: String,
    pub currency: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipient {
    pub recipient_code: String,
    /// Full gateway payload
    pub details: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bank {
    pub name: String,
    pub code: String,
    pub active: bool,
}

/// Port trait for payment gateways.
#[async_trait::async_trait]
pub trait PaymentGateway: Send + Sync + 'static {
    async fn initialize_deposit(
        &self,
        charge: &DepositCharge,
    ) -> Result<DepositAuthorization, GatewayError>;

    async fn verify_transaction(
        &self,
        reference: &Reference,
    ) -> Result<VerifiedPayment, GatewayError>;

    async fn initiate_transfer(
        &self,
        transfer: &TransferInstruction,
    ) -> Result<TransferReceipt, GatewayError>;

    async fn create_recipient(&self, recipient: &NewRecipient) -> Result<Recipient, GatewayError>;

    async fn list_banks(&self) -> Result<Vec<Bank>, GatewayError>;
}
