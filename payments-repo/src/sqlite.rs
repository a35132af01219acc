//! SQLite repository adapter.
#![allow(clippy::collapsible_if)]

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Sqlite, SqlitePool};

use payments_types::{
    Identity, LedgerRepository, Reference, RepoError, Transaction, TransactionStatus,
    UnitOfWork, Wallet,
};

use crate::map_write_error;
use crate::types::lite::{TransactionRow, WalletRow};

const TRANSACTION_COLUMNS: &str =
    "reference, kind, status, amount, identity, recipient_code, reason, created_at, updated_at";

const MIGRATIONS: [(&str, &str); 2] = [
    ("0001", include_str!("../migrations/0001_create_wallets.sql")),
    ("0002", include_str!("../migrations/0002_create_transactions.sql")),
];

/// Fixed-width RFC 3339 so that text ordering matches time ordering.
fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

// ─────────────────────────────────────────────────────────────────────────────
// SQLite Repository
// ─────────────────────────────────────────────────────────────────────────────

/// SQLite repository implementation.
pub struct SqliteRepo {
    pool: SqlitePool,
}

impl SqliteRepo {
    /// Creates a new SQLite repository with automatic migration.
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        let in_memory = database_url.contains(":memory:") || database_url.contains("mode=memory");

        // Ensure on-disk SQLite target directory exists.
        if !in_memory {
            if let Some(path) = database_url.strip_prefix("sqlite://") {
                let path = path.split('?').next().unwrap_or(path);
                if let Some(parent) = std::path::Path::new(path).parent() {
                    if !parent.as_os_str().is_empty() {
                        tokio::fs::create_dir_all(parent).await?;
                    }
                }
            }
        }

        let mut options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .busy_timeout(Duration::from_secs(5));
        if !in_memory {
            options = options.journal_mode(SqliteJournalMode::Wal);
        }

        // One connection keeps every unit of work on the same in-memory database.
        let pool = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new().connect_with(options).await?
        };

        let repo = Self { pool };
        repo.create_schema().await?;
        tracing::info!(in_memory, "SQLite repository ready");
        Ok(repo)
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Creates the database schema.
    pub async fn create_schema(&self) -> Result<(), RepoError> {
        for (name, sql) in MIGRATIONS {
            for statement in sql.split(';') {
                let stmt = statement.trim();
                if !stmt.is_empty() {
                    sqlx::query(stmt).execute(&self.pool).await.map_err(|e| {
                        RepoError::Database(format!("Migration {} failed: {}", name, e))
                    })?;
                }
            }
        }
        Ok(())
    }

    async fn list_where(
        &self,
        clause: &str,
        value: &str,
    ) -> Result<Vec<Transaction>, RepoError> {
        let rows: Vec<TransactionRow> = sqlx::query_as(&format!(
            "SELECT {} FROM transactions WHERE {} = ? ORDER BY created_at DESC, reference",
            TRANSACTION_COLUMNS, clause
        ))
        .bind(value)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        rows.into_iter().map(TransactionRow::into_domain).collect()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Repository implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl LedgerRepository for SqliteRepo {
    type Uow = SqliteUow;

    async fn begin(&self) -> Result<SqliteUow, RepoError> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepoError::Transaction(e.to_string()))?;
        Ok(SqliteUow { tx })
    }

    async fn find_wallet(&self, identity: &Identity) -> Result<Option<Wallet>, RepoError> {
        let row: Option<WalletRow> = sqlx::query_as(
            r#"SELECT identity, balance, created_at, updated_at FROM wallets WHERE identity = ?"#,
        )
        .bind(identity.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        row.map(WalletRow::into_domain).transpose()
    }

    async fn find_transaction(
        &self,
        reference: &Reference,
    ) -> Result<Option<Transaction>, RepoError> {
        let row: Option<TransactionRow> = sqlx::query_as(&format!(
            "SELECT {} FROM transactions WHERE reference = ?",
            TRANSACTION_COLUMNS
        ))
        .bind(reference.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        row.map(TransactionRow::into_domain).transpose()
    }

    async fn list_transactions_by_identity(
        &self,
        identity: &Identity,
    ) -> Result<Vec<Transaction>, RepoError> {
        self.list_where("identity", identity.as_str()).await
    }

    async fn list_transactions_by_status(
        &self,
        status: TransactionStatus,
    ) -> Result<Vec<Transaction>, RepoError> {
        self.list_where("status", &status.to_string()).await
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Unit of work
// ─────────────────────────────────────────────────────────────────────────────

/// SQLite unit of work.
///
/// Every locking read starts with a write so the database write lock is
/// taken up front instead of being upgraded later.
pub struct SqliteUow {
    tx: sqlx::Transaction<'static, Sqlite>,
}

#[async_trait]
impl UnitOfWork for SqliteUow {
    async fn wallet_for_update(&mut self, identity: &Identity) -> Result<Wallet, RepoError> {
        let now = format_timestamp(&Utc::now());
        sqlx::query(
            r#"INSERT OR IGNORE INTO wallets (identity, balance, created_at, updated_at)
               VALUES (?, '0.00', ?, ?)"#,
        )
        .bind(identity.as_str())
        .bind(&now)
        .bind(&now)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        let row: WalletRow = sqlx::query_as(
            r#"SELECT identity, balance, created_at, updated_at FROM wallets WHERE identity = ?"#,
        )
        .bind(identity.as_str())
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        row.into_domain()
    }

    async fn save_wallet(&mut self, wallet: &Wallet) -> Result<(), RepoError> {
        let result = sqlx::query(
            r#"UPDATE wallets SET balance = ?, updated_at = ? WHERE identity = ?"#,
        )
        .bind(wallet.balance.amount().to_string())
        .bind(format_timestamp(&wallet.updated_at))
        .bind(wallet.identity.as_str())
        .execute(&mut *self.tx)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn transaction_for_update(
        &mut self,
        reference: &Reference,
    ) -> Result<Option<Transaction>, RepoError> {
        sqlx::query(r#"UPDATE transactions SET updated_at = updated_at WHERE reference = ?"#)
            .bind(reference.as_str())
            .execute(&mut *self.tx)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        let row: Option<TransactionRow> = sqlx::query_as(&format!(
            "SELECT {} FROM transactions WHERE reference = ?",
            TRANSACTION_COLUMNS
        ))
        .bind(reference.as_str())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        row.map(TransactionRow::into_domain).transpose()
    }

    async fn insert_transaction(&mut self, tx: &Transaction) -> Result<(), RepoError> {
        sqlx::query(&format!(
            "INSERT INTO transactions ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            TRANSACTION_COLUMNS
        ))
        .bind(tx.reference.as_str())
        .bind(tx.transaction_type.to_string())
        .bind(tx.status.to_string())
        .bind(tx.amount.amount().to_string())
        .bind(tx.identity.as_ref().map(Identity::as_str))
        .bind(tx.recipient_code.as_deref())
        .bind(tx.reason.as_deref())
        .bind(format_timestamp(&tx.created_at))
        .bind(format_timestamp(&tx.updated_at))
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_write_error(e, tx.reference.as_str()))?;

        Ok(())
    }

    async fn save_transaction(&mut self, tx: &Transaction) -> Result<(), RepoError> {
        let result = sqlx::query(
            r#"UPDATE transactions
               SET status = ?, amount = ?, identity = ?, recipient_code = ?, reason = ?, updated_at = ?
               WHERE reference = ?"#,
        )
        .bind(tx.status.to_string())
        .bind(tx.amount.amount().to_string())
        .bind(tx.identity.as_ref().map(Identity::as_str))
        .bind(tx.recipient_code.as_deref())
        .bind(tx.reason.as_deref())
        .bind(format_timestamp(&tx.updated_at))
        .bind(tx.reference.as_str())
        .execute(&mut *self.tx)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn commit(self) -> Result<(), RepoError> {
        self.tx
            .commit()
            .await
            .map_err(|e| RepoError::Transaction(e.to_string()))
    }
}
