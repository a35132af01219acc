//! Deterministic in-memory gateway for development and tests.

use std::sync::atomic::{AtomicBool, Ordering};

use dashmap::DashMap;
use payments_types::{
    Bank, DepositAuthorization, DepositCharge, GatewayError, NewRecipient, PaymentGateway,
    Recipient, Reference, TransferInstruction, TransferReceipt, VerifiedPayment,
};
use uuid::Uuid;

/// Amount reported for references the mock never initialized.
pub const UNKNOWN_REFERENCE_AMOUNT: i64 = 50_000;
pub const UNKNOWN_REFERENCE_EMAIL: &str = "customer@example.com";

/// Gateway that never leaves the process.
///
/// Initialized charges are remembered and verify as successful with their own
/// amount and e-mail. Transfers succeed unless [`MockGateway::fail_transfers`]
/// is switched on.
#[derive(Default)]
pub struct MockGateway {
    charges: DashMap<String, (String, i64)>,
    fail_transfers: AtomicBool,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes subsequent transfers fail (or succeed again).
    pub fn fail_transfers(&self, fail: bool) {
        self.fail_transfers.store(fail, Ordering::SeqCst);
    }

    fn short_code() -> String {
        Uuid::new_v4().simple().to_string()[..8].to_uppercase()
    }
}

#[async_trait::async_trait]
impl PaymentGateway for MockGateway {
    async fn initialize_deposit(
        &self,
        charge: &DepositCharge,
    ) -> Result<DepositAuthorization, GatewayError> {
        let reference = charge.reference.to_string();
        self.charges.insert(
            reference.clone(),
            (charge.email.to_string(), charge.amount_minor),
        );
        tracing::debug!(reference = %reference, "Mock deposit initialized");

        Ok(DepositAuthorization {
            authorization_url: format!("https://checkout.paystack.com/mock_{}", reference),
            access_code: "mock_access_code".to_string(),
            reference,
        })
    }

    async fn verify_transaction(
        &self,
        reference: &Reference,
    ) -> Result<VerifiedPayment, GatewayError> {
        let (email, amount_minor) = self
            .charges
            .get(reference.as_str())
            .map(|entry| entry.value().clone())
            .unwrap_or_else(|| (UNKNOWN_REFERENCE_EMAIL.to_string(), UNKNOWN_REFERENCE_AMOUNT));

        Ok(VerifiedPayment {
            success: true,
            status: "success".to_string(),
            reference: reference.to_string(),
            amount_minor,
            identity: Some(email),
        })
    }

    async fn initiate_transfer(
        &self,
        transfer: &TransferInstruction,
    ) -> Result<TransferReceipt, GatewayError> {
        if self.fail_transfers.load(Ordering::SeqCst) {
            return Err(GatewayError::Rejected(
                "Transfer initiation failed".to_string(),
            ));
        }

        Ok(TransferReceipt {
            success: true,
            reference: transfer.reference.to_string(),
            transfer_code: format!("MOCK_TRF_{}", Self::short_code()),
            status: "success".to_string(),
        })
    }

    async fn create_recipient(&self, recipient: &NewRecipient) -> Result<Recipient, GatewayError> {
        let recipient_code = format!("MOCK_RCP_{}", Self::short_code());
        let details = serde_json::json!({
            "type": recipient.recipient_type,
            "name": recipient.name,
            "account_number": recipient.account_number,
            "bank_code": recipient.bank_code,
            "currency": recipient.currency,
            "recipient_code": recipient_code,
        });

        Ok(Recipient {
            recipient_code,
            details,
        })
    }

    async fn list_banks(&self) -> Result<Vec<Bank>, GatewayError> {
        Ok(vec![
            Bank {
                name: "Guaranty Trust Bank".to_string(),
                code: "058".to_string(),
                active: true,
            },
            Bank {
                name: "First Bank of Nigeria".to_string(),
                code: "011".to_string(),
                active: true,
            },
        ])
    }
}
