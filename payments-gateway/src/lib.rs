//! # Payments Gateway
//!
//! Adapters for the [`PaymentGateway`] port: the Paystack HTTP client and a
//! deterministic in-memory mock. Which one runs is decided once, at start-up,
//! from [`GatewayConfig`].

pub mod config;
pub mod mock;
pub mod paystack;

pub use config::GatewayConfig;
pub use mock::MockGateway;
pub use paystack::PaystackGateway;

use payments_types::{
    Bank, DepositAuthorization, DepositCharge, GatewayError, NewRecipient, PaymentGateway,
    Recipient, Reference, TransferInstruction, TransferReceipt, VerifiedPayment,
};

/// Gateway selected from configuration.
pub enum Gateway {
    Paystack(PaystackGateway),
    Mock(MockGateway),
}

/// Builds the gateway described by `config`.
pub fn build_gateway(config: &GatewayConfig) -> Result<Gateway, GatewayError> {
    if config.use_mock {
        tracing::warn!("Using mock payment gateway, no money will move");
        return Ok(Gateway::Mock(MockGateway::new()));
    }
    tracing::info!(base_url = %config.base_url, "Using Paystack payment gateway");
    Ok(Gateway::Paystack(PaystackGateway::new(config)?))
}

#[async_trait::async_trait]
impl PaymentGateway for Gateway {
    async fn initialize_deposit(
        &self,
        charge: &DepositCharge,
    ) -> Result<DepositAuthorization, GatewayError> {
        match self {
            Gateway::Paystack(g) => g.initialize_deposit(charge).await,
            Gateway::Mock(g) => g.initialize_deposit(charge).await,
        }
    }

    async fn verify_transaction(
        &self,
        reference: &Reference,
    ) -> Result<VerifiedPayment, GatewayError> {
        match self {
            Gateway::Paystack(g) => g.verify_transaction(reference).await,
            Gateway::Mock(g) => g.verify_transaction(reference).await,
        }
    }

    async fn initiate_transfer(
        &self,
        transfer: &TransferInstruction,
    ) -> Result<TransferReceipt, GatewayError> {
        match self {
            Gateway::Paystack(g) => g.initiate_transfer(transfer).await,
            Gateway::Mock(g) => g.initiate_transfer(transfer).await,
        }
    }

    async fn create_recipient(&self, recipient: &NewRecipient) -> Result<Recipient, GatewayError> {
        match self {
            Gateway::Paystack(g) => g.create_recipient(recipient).await,
            Gateway::Mock(g) => g.create_recipient(recipient).await,
        }
    }

    async fn list_banks(&self) -> Result<Vec<Bank>, GatewayError> {
        match self {
            Gateway::Paystack(g) => g.list_banks().await,
            Gateway::Mock(g) => g.list_banks().await,
        }
    }
}
