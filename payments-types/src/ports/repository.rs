//! Storage port traits.
//!
//! Adapters (Postgres, SQLite, in-memory test doubles) implement these.
//! Every balance or status mutation happens inside a [`UnitOfWork`].

use crate::domain::{Identity, Reference, Transaction, TransactionStatus, Wallet};
use crate::error::RepoError;

/// The main repository port: wallet store and transaction log.
#[async_trait::async_trait]
pub trait LedgerRepository: Send + Sync + 'static {
    type Uow: UnitOfWork;

    /// Opens a new unit of work.
    async fn begin(&self) -> Result<Self::Uow, RepoError>;

    async fn find_wallet(&self, identity: &Identity) -> Result<Option<Wallet>, RepoError>;

    async fn find_transaction(
        &self,
        reference: &Reference,
    ) -> Result<Option<Transaction>, RepoError>;

    /// Lists transactions for an identity, newest first.
    async fn list_transactions_by_identity(
        &self,
        identity: &Identity,
    ) -> Result<Vec<Transaction>, RepoError>;

    /// Lists transactions in a given status, newest first.
    async fn list_transactions_by_status(
        &self,
        status: TransactionStatus,
    ) -> Result<Vec<Transaction>, RepoError>;
}

/// A storage transaction scoped to one logical operation.
///
/// Nothing is visible to other units of work until [`UnitOfWork::commit`].
/// Dropping without committing rolls back.
#[async_trait::async_trait]
pub trait UnitOfWork: Send {
    /// Returns the wallet for `identity`, creating it with zero balance if
    /// absent. The row stays locked until the unit of work ends.
    async fn wallet_for_update(&mut self, identity: &Identity) -> Result<Wallet, RepoError>;

    async fn save_wallet(&mut self, wallet: &Wallet) -> Result<(), RepoError>;

    /// Loads and locks the transaction with `reference`, if any.
    async fn transaction_for_update(
        &mut self,
        reference: &Reference,
    ) -> Result<Option<Transaction>, RepoError>;

    /// Inserts a new transaction. Fails with `Conflict` on a duplicate reference.
    async fn insert_transaction(&mut self, tx: &Transaction) -> Result<(), RepoError>;

    /// Updates an existing transaction. Fails with `NotFound` if it is missing.
    async fn save_transaction(&mut self, tx: &Transaction) -> Result<(), RepoError>;

    async fn commit(self) -> Result<(), RepoError>;
}
