//! Database row types and their conversion into domain types.
//!
//! PostgreSQL stores amounts as `NUMERIC` and timestamps as `TIMESTAMPTZ`.
//! SQLite has no decimal or timestamp type, so amounts are decimal strings
//! and timestamps RFC 3339 strings.

use payments_types::{
    Identity, Money, Reference, RepoError, Transaction, TransactionStatus, TransactionType,
    Wallet,
};
use rust_decimal::Decimal;

// ─────────────────────────────────────────────────────────────────────────────
// Parsing helpers
// ─────────────────────────────────────────────────────────────────────────────

pub fn parse_identity(s: &str) -> Result<Identity, RepoError> {
    Identity::parse(s).map_err(|e| RepoError::Database(format!("Corrupt identity {}: {}", s, e)))
}

pub fn parse_reference(s: &str) -> Result<Reference, RepoError> {
    Reference::parse(s).map_err(|e| RepoError::Database(format!("Corrupt reference {}: {}", s, e)))
}

pub fn parse_transaction_type(s: &str) -> Result<TransactionType, RepoError> {
    s.parse()
        .map_err(|_| RepoError::Database(format!("Unknown transaction type: {}", s)))
}

pub fn parse_status(s: &str) -> Result<TransactionStatus, RepoError> {
    s.parse()
        .map_err(|_| RepoError::Database(format!("Unknown transaction status: {}", s)))
}

pub fn to_money(amount: Decimal) -> Result<Money, RepoError> {
    Money::new(amount).map_err(RepoError::Domain)
}

// ─────────────────────────────────────────────────────────────────────────────
// PostgreSQL rows
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(feature = "postgres")]
pub mod pg {
    use chrono::{DateTime, Utc};
    use rust_decimal::Decimal;
    use sqlx::FromRow;

    use super::*;

    #[derive(FromRow)]
    pub struct WalletRow {
        pub identity: String,
        pub balance: Decimal,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }

    impl WalletRow {
        pub fn into_domain(self) -> Result<Wallet, RepoError> {
            Ok(Wallet::from_parts(
                parse_identity(&self.identity)?,
                to_money(self.balance)?,
                self.created_at,
                self.updated_at,
            ))
        }
    }

    #[derive(FromRow)]
    pub struct TransactionRow {
        pub reference: String,
        pub kind: String,
        pub status: String,
        pub amount: Decimal,
        pub identity: Option<String>,
        pub recipient_code: Option<String>,
        pub reason: Option<String>,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }

    impl TransactionRow {
        pub fn into_domain(self) -> Result<Transaction, RepoError> {
            Ok(Transaction::from_parts(
                parse_reference(&self.reference)?,
                parse_transaction_type(&self.kind)?,
                parse_status(&self.status)?,
                to_money(self.amount)?,
                self.identity.as_deref().map(parse_identity).transpose()?,
                self.recipient_code,
                self.reason,
                self.created_at,
                self.updated_at,
            ))
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// SQLite rows
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(feature = "sqlite")]
pub mod lite {
    use std::str::FromStr;

    use chrono::{DateTime, Utc};
    use rust_decimal::Decimal;
    use sqlx::FromRow;

    use super::*;

    pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, RepoError> {
        Ok(DateTime::parse_from_rfc3339(s)
            .map_err(|e| RepoError::Database(e.to_string()))?
            .with_timezone(&Utc))
    }

    pub fn parse_amount(s: &str) -> Result<Money, RepoError> {
        let amount = Decimal::from_str(s).map_err(|e| RepoError::Database(e.to_string()))?;
        to_money(amount)
    }

    #[derive(FromRow)]
    pub struct WalletRow {
        pub identity: String,
        pub balance: String,
        pub created_at: String,
        pub updated_at: String,
    }

    impl WalletRow {
        pub fn into_domain(self) -> Result<Wallet, RepoError> {
            Ok(Wallet::from_parts(
                parse_identity(&self.identity)?,
                parse_amount(&self.balance)?,
                parse_timestamp(&self.created_at)?,
                parse_timestamp(&self.updated_at)?,
            ))
        }
    }

    #[derive(FromRow)]
    pub struct TransactionRow {
        pub reference: String,
        pub kind: String,
        pub status: String,
        pub amount: String,
        pub identity: Option<String>,
        pub recipient_code: Option<String>,
        pub reason: Option<String>,
        pub created_at: String,
        pub updated_at: String,
    }

    impl TransactionRow {
        pub fn into_domain(self) -> Result<Transaction, RepoError> {
            Ok(Transaction::from_parts(
                parse_reference(&self.reference)?,
                parse_transaction_type(&self.kind)?,
                parse_status(&self.status)?,
                parse_amount(&self.amount)?,
                self.identity.as_deref().map(parse_identity).transpose()?,
                self.recipient_code,
                self.reason,
                parse_timestamp(&self.created_at)?,
                parse_timestamp(&self.updated_at)?,
            ))
        }
    }
}
