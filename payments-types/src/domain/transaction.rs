//! Transaction domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::identity::{Identity, Reference};
use super::money::Money;
use crate::error::DomainError;

/// The type/direction of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    /// Money coming into a wallet through the gateway
    Deposit,
    /// Money leaving a wallet to a bank recipient
    Withdrawal,
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionType::Deposit => write!(f, "DEPOSIT"),
            TransactionType::Withdrawal => write!(f, "WITHDRAWAL"),
        }
    }
}

impl std::str::FromStr for TransactionType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DEPOSIT" => Ok(TransactionType::Deposit),
            "WITHDRAWAL" => Ok(TransactionType::Withdrawal),
            other => Err(DomainError::ValidationError(format!(
                "Unknown transaction type: {}",
                other
            ))),
        }
    }
}

/// Lifecycle status of a transaction.
///
/// `Pending` is the only non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    Pending,
    Success,
    Failed,
}

impl TransactionStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TransactionStatus::Pending)
    }
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionStatus::Pending => write!(f, "PENDING"),
            TransactionStatus::Success => write!(f, "SUCCESS"),
            TransactionStatus::Failed => write!(f, "FAILED"),
        }
    }
}

impl std::str::FromStr for TransactionStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(TransactionStatus::Pending),
            "SUCCESS" => Ok(TransactionStatus::Success),
            "FAILED" => Ok(TransactionStatus::Failed),
            other => Err(DomainError::ValidationError(format!(
                "Unknown transaction status: {}",
                other
            ))),
        }
    }
}

/// A payment attempt recorded in the transaction log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique reference shared with the gateway
    pub reference: Reference,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    pub status: TransactionStatus,
    /// Amount in major units
    pub amount: Money,
    /// Owner of the transaction, if known
    #[serde(rename = "email")]
    pub identity: Option<Identity>,
    /// Gateway recipient code (withdrawals only)
    pub recipient_code: Option<String>,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    /// Creates a new pending deposit.
    pub fn deposit(reference: Reference, amount: Money, identity: Option<Identity>) -> Self {
        let now = Utc::now();
        Self {
            reference,
            transaction_type: TransactionType::Deposit,
            status: TransactionStatus::Pending,
            amount,
            identity,
            recipient_code: None,
            reason: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Creates a new pending withdrawal.
    pub fn withdrawal(
        reference: Reference,
        amount: Money,
        identity: Identity,
        recipient_code: String,
        reason: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            reference,
            transaction_type: TransactionType::Withdrawal,
            status: TransactionStatus::Pending,
            amount,
            identity: Some(identity),
            recipient_code: Some(recipient_code),
            reason: Some(reason),
            created_at: now,
            updated_at: now,
        }
    }

    /// Reconstructs a transaction from database fields.
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        reference: Reference,
        transaction_type: TransactionType,
        status: TransactionStatus,
        amount: Money,
        identity: Option<Identity>,
        recipient_code: Option<String>,
        reason: Option<String>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            reference,
            transaction_type,
            status,
            amount,
            identity,
            recipient_code,
            reason,
            created_at,
            updated_at,
        }
    }

    /// Moves the transaction to `to`.
    ///
    /// Returns `Ok(false)` when the status is already `to`. Leaving a terminal
    /// status is rejected.
    pub fn transition(&mut self, to: TransactionStatus) -> Result<bool, DomainError> {
        if self.status == to {
            return Ok(false);
        }
        if self.status.is_terminal() {
            return Err(DomainError::InvalidTransition {
                from: self.status,
                to,
            });
        }
        self.status = to;
        self.updated_at = Utc::now();
        Ok(true)
    }
}
