//! Wallet domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::identity::Identity;
use super::money::Money;
use crate::error::DomainError;

/// A single balance held for one identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wallet {
    /// Owner of the wallet
    #[serde(rename = "email")]
    pub identity: Identity,
    /// Current balance in major units
    pub balance: Money,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Wallet {
    /// Creates a new wallet with zero balance.
    pub fn new(identity: Identity) -> Self {
        let now = Utc::now();
        Self {
            identity,
            balance: Money::zero(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Creates a wallet with all fields specified (for database reconstruction).
    pub fn from_parts(
        identity: Identity,
        balance: Money,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            identity,
            balance,
            created_at,
            updated_at,
        }
    }

    /// Credits (adds) money to the wallet.
    pub fn credit(&mut self, amount: Money) -> Result<(), DomainError> {
        self.balance = self.balance.checked_add(amount)?;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Debits (subtracts) money from the wallet. The balance is left untouched on failure.
    pub fn debit(&mut self, amount: Money) -> Result<(), DomainError> {
        self.balance = self.balance.checked_sub(amount)?;
        self.updated_at = Utc::now();
        Ok(())
    }
}
