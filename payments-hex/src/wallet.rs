//! Wallet ledger.
//!
//! The free functions run inside a caller's unit of work so balance changes
//! can commit together with transaction log writes. [`WalletService`] wraps
//! each of them in a unit of work of its own.

use std::sync::Arc;

use payments_types::{
    AppError, DomainError, Identity, LedgerRepository, Money, RepoError, UnitOfWork, Wallet,
};

fn ensure_positive(amount: &Money) -> Result<(), DomainError> {
    if amount.is_zero() {
        return Err(DomainError::ValidationError(
            "Amount must be greater than zero".into(),
        ));
    }
    Ok(())
}

/// Returns the wallet for `identity`, creating an empty one if needed.
pub async fn get_or_create<U: UnitOfWork>(
    uow: &mut U,
    identity: &Identity,
) -> Result<Wallet, RepoError> {
    uow.wallet_for_update(identity).await
}

/// Adds `amount` to the wallet of `identity`.
pub async fn credit<U: UnitOfWork>(
    uow: &mut U,
    identity: &Identity,
    amount: Money,
) -> Result<Wallet, RepoError> {
    ensure_positive(&amount)?;
    let mut wallet = uow.wallet_for_update(identity).await?;
    wallet.credit(amount)?;
    uow.save_wallet(&wallet).await?;
    Ok(wallet)
}

/// Removes `amount` from the wallet of `identity`.
///
/// Fails with `InsufficientFunds` and writes nothing when the balance is short.
pub async fn debit<U: UnitOfWork>(
    uow: &mut U,
    identity: &Identity,
    amount: Money,
) -> Result<Wallet, RepoError> {
    ensure_positive(&amount)?;
    let mut wallet = uow.wallet_for_update(identity).await?;
    wallet.debit(amount)?;
    uow.save_wallet(&wallet).await?;
    Ok(wallet)
}

/// Wallet ledger operations, each committed on its own.
pub struct WalletService<R: LedgerRepository> {
    repo: Arc<R>,
}

impl<R: LedgerRepository> WalletService<R> {
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    #[tracing::instrument(skip_all, fields(identity = %identity))]
    pub async fn get_or_create(&self, identity: &Identity) -> Result<Wallet, AppError> {
        let mut uow = self.repo.begin().await?;
        let wallet = get_or_create(&mut uow, identity).await?;
        uow.commit().await?;
        Ok(wallet)
    }

    #[tracing::instrument(skip_all, fields(identity = %identity, amount = %amount))]
    pub async fn credit(&self, identity: &Identity, amount: Money) -> Result<Wallet, AppError> {
        let mut uow = self.repo.begin().await?;
        let wallet = credit(&mut uow, identity, amount).await?;
        uow.commit().await?;
        tracing::info!(balance = %wallet.balance, "Wallet credited");
        Ok(wallet)
    }

    #[tracing::instrument(skip_all, fields(identity = %identity, amount = %amount))]
    pub async fn debit(&self, identity: &Identity, amount: Money) -> Result<Wallet, AppError> {
        let mut uow = self.repo.begin().await?;
        let wallet = debit(&mut uow, identity, amount).await?;
        uow.commit().await?;
        tracing::info!(balance = %wallet.balance, "Wallet debited");
        Ok(wallet)
    }

    /// Current balance; zero for identities without a wallet.
    pub async fn get_balance(&self, identity: &Identity) -> Result<Money, AppError> {
        let wallet = self.repo.find_wallet(identity).await?;
        Ok(wallet.map(|w| w.balance).unwrap_or_else(Money::zero))
    }
}
