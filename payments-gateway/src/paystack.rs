//! Paystack HTTP client.

use payments_types::{
    Bank, DepositAuthorization, DepositCharge, GatewayError, NewRecipient, PaymentGateway,
    Recipient, Reference, TransferInstruction, TransferReceipt, VerifiedPayment,
};
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::GatewayConfig;

/// Charge statuses that mean the customer's payment did not go through.
const FAILED_PAYMENT_STATUSES: [&str; 3] = ["failed", "abandoned", "reversed"];

/// Transfer statuses Paystack uses for transfers that will not go through.
const FAILED_TRANSFER_STATUSES: [&str; 3] = ["failed", "reversed", "rejected"];

/// Every Paystack response is wrapped in this envelope.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    status: bool,
    #[serde(default)]
    message: String,
    data: Option<T>,
}

#[derive(Serialize)]
struct InitializeBody<'a> {
    email: &'a str,
    amount: i64,
    reference: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    callback_url: Option<&'a str>,
}

#[derive(Deserialize)]
struct VerifyData {
    status: String,
    reference: String,
    amount: i64,
    customer: Option<Customer>,
}

#[derive(Deserialize)]
struct Customer {
    email: Option<String>,
}

#[derive(Serialize)]
struct TransferBody<'a> {
    source: &'static str,
    amount: i64,
    recipient: &'a str,
    reason: &'a str,
    reference: &'a str,
}

#[derive(Deserialize)]
struct TransferData {
    reference: Option<String>,
    transfer_code: String,
    status: String,
}

#[derive(Serialize)]
struct RecipientBody<'a> {
    #[serde(rename = "type")]
    recipient_type: &'a str,
    name: &'a str,
    account_number: &'a str,
    bank_code: &'a str,
    currency: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
}

/// Gateway backed by the Paystack REST API.
pub struct PaystackGateway {
    base_url: Url,
    secret_key: String,
    http: Client,
}

impl PaystackGateway {
    pub fn new(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let base_url = Url::parse(&config.base_url)
            .map_err(|e| GatewayError::Transport(format!("Invalid base URL: {}", e)))?;
        if base_url.cannot_be_a_base() {
            return Err(GatewayError::Transport(format!(
                "Invalid base URL: {}",
                config.base_url
            )));
        }

        Ok(Self {
            base_url,
            secret_key: config.secret_key.clone(),
            http,
        })
    }

    /// Builds an endpoint URL; each segment is percent-encoded on its own.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, GatewayError> {
        let resp = self
            .http
            .get(self.endpoint(segments))
            .bearer_auth(&self.secret_key)
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        self.handle_response(resp).await
    }

    async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> Result<T, GatewayError> {
        let resp = self
            .http
            .post(self.endpoint(segments))
            .bearer_auth(&self.secret_key)
            .json(body)
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        self.handle_response(resp).await
    }

    async fn handle_response<T: DeserializeOwned>(
        &self,
        resp: reqwest::Response,
    ) -> Result<T, GatewayError> {
        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        if !status.is_success() {
            let message = serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(String::from));
            tracing::warn!(status = %status, "Paystack returned an error status");
            return Err(match status {
                StatusCode::NOT_FOUND => GatewayError::NotFound(message.unwrap_or_else(|| {
                    "Transaction not found or invalid reference".to_string()
                })),
                _ => GatewayError::Rejected(message.unwrap_or_else(|| format!("HTTP {}", status))),
            });
        }

        let envelope: Envelope<T> = serde_json::from_str(&body)
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;
        if !envelope.status {
            return Err(GatewayError::Rejected(envelope.message));
        }
        envelope
            .data
            .ok_or_else(|| GatewayError::InvalidResponse("Response has no data".to_string()))
    }
}

#[async_trait::async_trait]
impl PaymentGateway for PaystackGateway {
    #[tracing::instrument(skip(self, charge), fields(reference = %charge.reference))]
    async fn initialize_deposit(
        &self,
        charge: &DepositCharge,
    ) -> Result<DepositAuthorization, GatewayError> {
        let body = InitializeBody {
            email: charge.email.as_str(),
            amount: charge.amount_minor,
            reference: charge.reference.as_str(),
            callback_url: charge.callback_url.as_deref(),
        };
        self.post(&["transaction", "initialize"], &body).await
    }

    #[tracing::instrument(skip(self))]
    async fn verify_transaction(
        &self,
        reference: &Reference,
    ) -> Result<VerifiedPayment, GatewayError> {
        let data: VerifyData = self
            .get(&["transaction", "verify", reference.as_str()])
            .await?;

        Ok(VerifiedPayment {
            success: !FAILED_PAYMENT_STATUSES.contains(&data.status.as_str()),
            status: data.status,
            reference: data.reference,
            amount_minor: data.amount,
            identity: data.customer.and_then(|c| c.email),
        })
    }

    #[tracing::instrument(skip(self, transfer), fields(reference = %transfer.reference))]
    async fn initiate_transfer(
        &self,
        transfer: &TransferInstruction,
    ) -> Result<TransferReceipt, GatewayError> {
        let body = TransferBody {
            source: "balance",
            amount: transfer.amount_minor,
            recipient: &transfer.recipient_code,
            reason: &transfer.reason,
            reference: transfer.reference.as_str(),
        };
        let data: TransferData = self.post(&["transfer"], &body).await?;

        Ok(TransferReceipt {
            success: !FAILED_TRANSFER_STATUSES.contains(&data.status.as_str()),
            reference: data
                .reference
                .unwrap_or_else(|| transfer.reference.to_string()),
            transfer_code: data.transfer_code,
            status: data.status,
        })
    }

    #[tracing::instrument(skip(self, recipient), fields(bank_code = %recipient.bank_code))]
    async fn create_recipient(&self, recipient: &NewRecipient) -> Result<Recipient, GatewayError> {
        let body = RecipientBody {
            recipient_type: &recipient.recipient_type,
            name: &recipient.name,
            account_number: &recipient.account_number,
            bank_code: &recipient.bank_code,
            currency: &recipient.currency,
            description: recipient.description.as_deref(),
        };
        let details: serde_json::Value = self.post(&["transferrecipient"], &body).await?;

        let recipient_code = details
            .get("recipient_code")
            .and_then(|c| c.as_str())
            .ok_or_else(|| GatewayError::InvalidResponse("Missing recipient_code".to_string()))?
            .to_string();

        Ok(Recipient {
            recipient_code,
            details,
        })
    }

    #[tracing::instrument(skip(self))]
    async fn list_banks(&self) -> Result<Vec<Bank>, GatewayError> {
        self.get(&["bank"]).await
    }
}
