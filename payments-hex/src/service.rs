//! Payment Application Service
//!
//! Reconciles the local ledger with the payment gateway: deposit
//! initialization and verification, withdrawals with compensation, and
//! read-only queries. Contains NO infrastructure logic.
//!
//! Gateway calls are never made while a unit of work is open. Every mutation
//! of one reference runs under that reference's lock.

use std::sync::Arc;

use rust_decimal::Decimal;

use payments_types::{
    AppError, Bank, CreateRecipientRequest, DepositAuthorization, DepositCharge, Identity,
    InitializeDepositRequest, LedgerRepository, Money, NewRecipient, PaymentGateway, Recipient,
    Reference, Transaction, TransactionStatus, TransactionSummary, TransactionType,
    TransferInstruction, UnitOfWork, WithdrawalRequest, WithdrawalResponse,
};

use crate::locks::ReferenceLocks;
use crate::wallet::{self, WalletService};

pub const DEPOSIT_PREFIX: &str = "DEP";
pub const WITHDRAWAL_PREFIX: &str = "WIT";

/// Result of verifying a deposit.
#[derive(Debug, Clone)]
pub struct VerificationOutcome {
    pub transaction: Transaction,
    /// True only for the verification that moved the deposit into SUCCESS
    pub credited: bool,
}

/// Maps a gateway payment status onto the local state machine.
pub fn map_gateway_status(status: &str) -> TransactionStatus {
    match status.to_ascii_lowercase().as_str() {
        "success" => TransactionStatus::Success,
        "failed" | "abandoned" | "reversed" => TransactionStatus::Failed,
        _ => TransactionStatus::Pending,
    }
}

fn positive_amount(amount: Decimal) -> Result<Money, AppError> {
    let money = Money::new(amount)?;
    if money.is_zero() {
        return Err(AppError::BadRequest(
            "Amount must be greater than zero".into(),
        ));
    }
    Ok(money)
}

fn reference_or_generate(reference: Option<&str>, prefix: &str) -> Result<Reference, AppError> {
    match reference.map(str::trim).filter(|r| !r.is_empty()) {
        Some(r) => Ok(Reference::parse(r)?),
        None => Ok(Reference::generate(prefix)),
    }
}

fn required(value: &str, field: &str) -> Result<String, AppError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::BadRequest(format!("{} is required", field)));
    }
    Ok(value.to_string())
}

/// Application service for payment operations.
///
/// Generic over the storage and gateway ports; adapters are injected at
/// compile time.
pub struct PaymentService<R: LedgerRepository, G: PaymentGateway> {
    repo: Arc<R>,
    gateway: G,
    wallets: WalletService<R>,
    locks: ReferenceLocks,
}

impl<R: LedgerRepository, G: PaymentGateway> PaymentService<R, G> {
    /// Creates a new payment service with the given repository and gateway.
    pub fn new(repo: R, gateway: G) -> Self {
        let repo = Arc::new(repo);
        Self {
            wallets: WalletService::new(repo.clone()),
            repo,
            gateway,
            locks: ReferenceLocks::new(),
        }
    }

    /// Returns a reference to the underlying repository.
    pub fn repo(&self) -> &R {
        &self.repo
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn wallets(&self) -> &WalletService<R> {
        &self.wallets
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Deposits
    // ─────────────────────────────────────────────────────────────────────────────

    /// Records a PENDING deposit and opens a checkout for it on the gateway.
    #[tracing::instrument(skip_all, fields(email = %req.email, amount = %req.amount))]
    pub async fn initialize_deposit(
        &self,
        req: InitializeDepositRequest,
    ) -> Result<DepositAuthorization, AppError> {
        let identity = Identity::parse(&req.email)?;
        let amount = positive_amount(req.amount)?;
        let amount_minor = amount.to_minor_units()?;
        let reference = reference_or_generate(req.reference.as_deref(), DEPOSIT_PREFIX)?;

        let _guard = self.locks.acquire(&reference).await;

        let mut uow = self.repo.begin().await?;
        uow.insert_transaction(&Transaction::deposit(
            reference.clone(),
            amount,
            Some(identity.clone()),
        ))
        .await?;
        uow.commit().await?;

        let charge = DepositCharge {
            email: identity,
            amount_minor,
            reference: reference.clone(),
            callback_url: req.callback_url,
        };
        match self.gateway.initialize_deposit(&charge).await {
            Ok(auth) => {
                tracing::info!(reference = %reference, "Deposit initialized");
                Ok(auth)
            }
            Err(err) => {
                tracing::error!(reference = %reference, error = %err, "Deposit initialization failed");
                self.fail_if_pending(&reference).await?;
                Err(err.into())
            }
        }
    }

    /// Confirms a deposit with the gateway and credits the wallet at most once.
    #[tracing::instrument(skip(self))]
    pub async fn verify_deposit(&self, reference: &str) -> Result<VerificationOutcome, AppError> {
        let reference = Reference::parse(reference)?;
        let _guard = self.locks.acquire(&reference).await;

        if let Some(existing) = self.repo.find_transaction(&reference).await? {
            if existing.transaction_type == TransactionType::Withdrawal {
                return Err(AppError::BadRequest(format!(
                    "Reference {} belongs to a withdrawal",
                    reference
                )));
            }
        }

        let verified = match self.gateway.verify_transaction(&reference).await {
            Ok(verified) if verified.reference != reference.as_str() => {
                tracing::error!(
                    reference = %reference,
                    reported = %verified.reference,
                    "Gateway answered for a different reference"
                );
                return Err(AppError::PaymentFailed(format!(
                    "Gateway returned reference {} for {}",
                    verified.reference, reference
                )));
            }
            Ok(verified) if verified.success => verified,
            Ok(verified) => {
                tracing::warn!(reference = %reference, status = %verified.status, "Gateway reports deposit failed");
                self.record_failed_deposit(&reference).await?;
                return Err(AppError::PaymentFailed(format!(
                    "Payment was not successful: {}",
                    verified.status
                )));
            }
            Err(err) => {
                tracing::error!(reference = %reference, error = %err, "Deposit verification failed");
                self.record_failed_deposit(&reference).await?;
                return Err(err.into());
            }
        };

        let amount = Money::from_minor_units(verified.amount_minor)?;
        let reported_identity = match verified.identity.as_deref().map(Identity::parse) {
            Some(Ok(identity)) => Some(identity),
            Some(Err(err)) => {
                tracing::warn!(reference = %reference, error = %err, "Ignoring unusable customer e-mail");
                None
            }
            None => None,
        };
        let new_status = map_gateway_status(&verified.status);

        let mut uow = self.repo.begin().await?;
        let stored = uow.transaction_for_update(&reference).await?;
        let is_new = stored.is_none();
        let mut tx = stored.unwrap_or_else(|| Transaction::deposit(reference.clone(), amount, None));
        let prior_status = tx.status;

        if prior_status.is_terminal() {
            if prior_status != new_status {
                tracing::warn!(
                    reference = %reference,
                    stored = %prior_status,
                    reported = %new_status,
                    "Gateway status disagrees with final local status, keeping local"
                );
            }
            return Ok(VerificationOutcome {
                transaction: tx,
                credited: false,
            });
        }

        tx.amount = amount;
        if let Some(identity) = reported_identity {
            tx.identity = Some(identity);
        }
        tx.transition(new_status)?;
        tx.updated_at = chrono::Utc::now();

        if is_new {
            uow.insert_transaction(&tx).await?;
        } else {
            uow.save_transaction(&tx).await?;
        }

        let mut credited = false;
        if tx.status == TransactionStatus::Success && prior_status != TransactionStatus::Success {
            match &tx.identity {
                Some(identity) if !tx.amount.is_zero() => {
                    wallet::credit(&mut uow, identity, tx.amount).await?;
                    credited = true;
                }
                Some(_) => {
                    tracing::warn!(reference = %reference, "Verified deposit has zero amount, nothing to credit");
                }
                None => {
                    tracing::warn!(reference = %reference, "No identity on verified deposit, skipping wallet credit");
                }
            }
        }

        uow.commit().await?;
        tracing::info!(reference = %reference, status = %tx.status, credited, "Deposit verified");

        Ok(VerificationOutcome {
            transaction: tx,
            credited,
        })
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Withdrawals
    // ─────────────────────────────────────────────────────────────────────────────

    /// Debits the wallet, records a PENDING withdrawal, then asks the gateway
    /// to transfer. A failed transfer is compensated before the error returns.
    #[tracing::instrument(skip_all, fields(email = %req.email, amount = %req.amount))]
    pub async fn initiate_withdrawal(
        &self,
        req: WithdrawalRequest,
    ) -> Result<WithdrawalResponse, AppError> {
        let identity = Identity::parse(&req.email)?;
        let amount = positive_amount(req.amount)?;
        let amount_minor = amount.to_minor_units()?;
        let recipient_code = required(&req.recipient_code, "Recipient code")?;
        let reason = required(&req.reason, "Reason")?;
        let reference = reference_or_generate(req.reference.as_deref(), WITHDRAWAL_PREFIX)?;

        let _guard = self.locks.acquire(&reference).await;

        let mut uow = self.repo.begin().await?;
        wallet::debit(&mut uow, &identity, amount).await?;
        let tx = Transaction::withdrawal(
            reference.clone(),
            amount,
            identity.clone(),
            recipient_code.clone(),
            reason.clone(),
        );
        uow.insert_transaction(&tx).await?;
        uow.commit().await?;

        let transfer = TransferInstruction {
            amount_minor,
            recipient_code,
            reason,
            reference: reference.clone(),
        };
        let failure = match self.gateway.initiate_transfer(&transfer).await {
            Ok(receipt) if receipt.success => {
                let mut uow = self.repo.begin().await?;
                let Some(mut stored) = uow.transaction_for_update(&reference).await? else {
                    tracing::error!(
                        reference = %reference,
                        transfer_code = %receipt.transfer_code,
                        "Withdrawal vanished after a successful transfer"
                    );
                    return Err(AppError::Internal(format!(
                        "Withdrawal {} vanished after transfer {}",
                        reference, receipt.transfer_code
                    )));
                };
                stored.transition(TransactionStatus::Success)?;
                uow.save_transaction(&stored).await?;
                uow.commit().await?;
                tracing::info!(reference = %reference, transfer_code = %receipt.transfer_code, "Withdrawal completed");

                return Ok(WithdrawalResponse {
                    reference: reference.to_string(),
                    status: stored.status,
                    amount: stored.amount.amount(),
                    transfer_code: receipt.transfer_code,
                });
            }
            Ok(receipt) => format!("Transfer was not successful: {}", receipt.status),
            Err(err) => err.message().to_string(),
        };

        tracing::error!(reference = %reference, reason = %failure, "Transfer failed, refunding wallet");
        self.compensate_withdrawal(&reference, &identity, amount)
            .await?;
        Err(AppError::PaymentFailed(failure))
    }

    /// Credits a failed withdrawal back and marks it FAILED, in one unit of work.
    async fn compensate_withdrawal(
        &self,
        reference: &Reference,
        identity: &Identity,
        amount: Money,
    ) -> Result<(), AppError> {
        let mut uow = self.repo.begin().await?;
        let Some(mut tx) = uow.transaction_for_update(reference).await? else {
            return Err(AppError::Internal(format!(
                "Withdrawal {} vanished before compensation",
                reference
            )));
        };
        if tx.status != TransactionStatus::Pending {
            tracing::warn!(reference = %reference, status = %tx.status, "Withdrawal already final, not compensating");
            return Ok(());
        }

        wallet::credit(&mut uow, identity, amount).await?;
        tx.transition(TransactionStatus::Failed)?;
        uow.save_transaction(&tx).await?;
        uow.commit().await?;
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Failure bookkeeping
    // ─────────────────────────────────────────────────────────────────────────────

    /// Marks the transaction FAILED if it is still PENDING.
    async fn fail_if_pending(&self, reference: &Reference) -> Result<(), AppError> {
        let mut uow = self.repo.begin().await?;
        if let Some(mut tx) = uow.transaction_for_update(reference).await? {
            if tx.status == TransactionStatus::Pending {
                tx.transition(TransactionStatus::Failed)?;
                uow.save_transaction(&tx).await?;
                uow.commit().await?;
            }
        }
        Ok(())
    }

    /// Like [`Self::fail_if_pending`], but records a FAILED deposit when the
    /// reference is unknown locally.
    async fn record_failed_deposit(&self, reference: &Reference) -> Result<(), AppError> {
        let mut uow = self.repo.begin().await?;
        match uow.transaction_for_update(reference).await? {
            Some(mut tx) => {
                if tx.status != TransactionStatus::Pending {
                    return Ok(());
                }
                tx.transition(TransactionStatus::Failed)?;
                uow.save_transaction(&tx).await?;
            }
            None => {
                let mut tx = Transaction::deposit(reference.clone(), Money::zero(), None);
                tx.transition(TransactionStatus::Failed)?;
                uow.insert_transaction(&tx).await?;
            }
        }
        uow.commit().await?;
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────────────

    /// Lists transactions for an identity, newest first.
    pub async fn list_transactions(&self, email: &str) -> Result<Vec<TransactionSummary>, AppError> {
        let identity = Identity::parse(email)?;
        let transactions = self.repo.list_transactions_by_identity(&identity).await?;
        Ok(transactions.into_iter().map(TransactionSummary::from).collect())
    }

    pub async fn get_transaction(&self, reference: &str) -> Result<Transaction, AppError> {
        let reference = Reference::parse(reference)?;
        self.repo
            .find_transaction(&reference)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Transaction {}", reference)))
    }

    pub async fn get_balance(&self, email: &str) -> Result<Money, AppError> {
        let identity = Identity::parse(email)?;
        self.wallets.get_balance(&identity).await
    }

    /// Withdrawals still waiting on the gateway. After a crash these may hold
    /// debited funds that need manual reconciliation.
    pub async fn pending_withdrawals(&self) -> Result<Vec<Transaction>, AppError> {
        let pending = self
            .repo
            .list_transactions_by_status(TransactionStatus::Pending)
            .await?;
        Ok(pending
            .into_iter()
            .filter(|tx| tx.transaction_type == TransactionType::Withdrawal)
            .collect())
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Gateway pass-through
    // ─────────────────────────────────────────────────────────────────────────────

    #[tracing::instrument(skip_all, fields(bank_code = %req.bank_code))]
    pub async fn create_recipient(&self, req: CreateRecipientRequest) -> Result<Recipient, AppError> {
        let recipient_type = required(&req.recipient_type, "Recipient type")?;
        let name = required(&req.name, "Name")?;
        let bank_code = required(&req.bank_code, "Bank code")?;
        let account_number = req.account_number.trim().to_string();
        if account_number.len() != 10 || !account_number.chars().all(|c| c.is_ascii_digit()) {
            return Err(AppError::BadRequest(
                "Account number must be exactly 10 digits".into(),
            ));
        }
        let currency = match req.currency.trim() {
            "" => "NGN".to_string(),
            c => c.to_uppercase(),
        };

        let recipient = NewRecipient {
            recipient_type,
            name,
            account_number,
            bank_code,
            currency,
            description: req.description,
        };
        Ok(self.gateway.create_recipient(&recipient).await?)
    }

    pub async fn list_banks(&self) -> Result<Vec<Bank>, AppError> {
        Ok(self.gateway.list_banks().await?)
    }
}
