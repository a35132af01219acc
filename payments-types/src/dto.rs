//! Data Transfer Objects (DTOs) for requests and responses.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::{Transaction, TransactionStatus, TransactionType};

// ─────────────────────────────────────────────────────────────────────────────
// Deposit DTOs
// ─────────────────────────────────────────────────────────────────────────────

/// Request to start a deposit through the gateway checkout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitializeDepositRequest {
    /// E-mail of the paying customer
    pub email: String,
    /// Amount in naira
    pub amount: Decimal,
    /// Optional caller-supplied reference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    /// Where the gateway redirects after checkout
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback_url: Option<String>,
}

/// Result of verifying a deposit reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationResponse {
    pub reference: String,
    pub status: TransactionStatus,
    pub amount: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Whether this verification credited the wallet
    pub credited: bool,
}

// ─────────────────────────────────────────────────────────────────────────────
// Withdrawal DTOs
// ─────────────────────────────────────────────────────────────────────────────

/// Request to move money from a wallet to a bank recipient.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WithdrawalRequest {
    pub email: String,
    /// Amount in naira
    pub amount: Decimal,
    /// Gateway recipient code, see `POST /recipients`
    pub recipient_code: String,
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

/// Outcome of a successful withdrawal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WithdrawalResponse {
    pub reference: String,
    pub status: TransactionStatus,
    pub amount: Decimal,
    pub transfer_code: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Wallet & history DTOs
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceResponse {
    pub email: String,
    pub balance: Decimal,
}

/// External-facing projection of a transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionSummary {
    pub reference: String,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    pub status: TransactionStatus,
    pub amount: Decimal,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Transaction> for TransactionSummary {
    fn from(tx: Transaction) -> Self {
        Self {
            reference: tx.reference.into(),
            transaction_type: tx.transaction_type,
            status: tx.status,
            amount: tx.amount.amount(),
            email: tx.identity.map(String::from),
            created_at: tx.created_at,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Gateway pass-through DTOs
// ─────────────────────────────────────────────────────────────────────────────

/// Request to register a transfer recipient with the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRecipientRequest {
    /// Recipient type, e.g. `nuban`
    #[serde(rename = "type")]
    pub recipient_type: String,
    pub name: String,
    pub account_number: String,
    pub bank_code: String,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

fn default_currency() -> String {
    "NGN".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Identity, Money, Reference};

    #[test]
    fn test_summary_projection() {
        let tx = Transaction::deposit(
            Reference::parse("DEP_1").unwrap(),
            Money::new(Decimal::from(500)).unwrap(),
            Some(Identity::parse("ada@example.com").unwrap()),
        );
        let created_at = tx.created_at;

        let summary = TransactionSummary::from(tx);
        assert_eq!(summary.reference, "DEP_1");
        assert_eq!(summary.transaction_type, TransactionType::Deposit);
        assert_eq!(summary.status, TransactionStatus::Pending);
        assert_eq!(summary.amount, Decimal::new(50000, 2));
        assert_eq!(summary.email.as_deref(), Some("ada@example.com"));
        assert_eq!(summary.created_at, created_at);
    }

    #[test]
    fn test_recipient_currency_defaults_to_naira() {
        let req: CreateRecipientRequest = serde_json::from_str(
            r#"{"type":"nuban","name":"Ada","account_number":"0123456789","bank_code":"058"}"#,
        )
        .unwrap();
        assert_eq!(req.currency, "NGN");
        assert!(req.description.is_none());
    }
}
