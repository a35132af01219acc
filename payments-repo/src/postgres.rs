//! PostgreSQL repository adapter.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Postgres};

use payments_types::{
    Identity, LedgerRepository, Reference, RepoError, Transaction, TransactionStatus,
    UnitOfWork, Wallet,
};

use crate::map_write_error;
use crate::types::pg::{TransactionRow, WalletRow};

const TRANSACTION_COLUMNS: &str =
    "reference, kind, status, amount, identity, recipient_code, reason, created_at, updated_at";

// ─────────────────────────────────────────────────────────────────────────────
// PostgreSQL Repository
// ─────────────────────────────────────────────────────────────────────────────

/// PostgreSQL repository with row-level locking.
pub struct PostgresRepo {
    pool: PgPool,
}

/// Executes SQL statements from a migration file, splitting by semicolons.
async fn execute_migration(pool: &PgPool, sql: &str, name: &str) -> Result<(), anyhow::Error> {
    for statement in sql.split(';') {
        let stmt = statement.trim();
        if !stmt.is_empty() {
            sqlx::query(stmt)
                .execute(pool)
                .await
                .map_err(|e| anyhow::anyhow!("Migration {} failed: {}", name, e))?;
        }
    }
    Ok(())
}

/// Runs all database migrations.
async fn run_migrations(pool: &PgPool) -> Result<(), anyhow::Error> {
    execute_migration(
        pool,
        include_str!("../migrations/0001_create_wallets_pg.sql"),
        "0001",
    )
    .await?;

    execute_migration(
        pool,
        include_str!("../migrations/0002_create_transactions_pg.sql"),
        "0002",
    )
    .await?;

    Ok(())
}

impl PostgresRepo {
    /// Creates a new PostgreSQL repository with automatic migration.
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPool::connect(database_url).await?;
        run_migrations(&pool).await?;
        tracing::info!("PostgreSQL repository ready");
        Ok(Self { pool })
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Creates the database schema (for testing with existing pool).
    pub async fn create_schema(&self) -> Result<(), RepoError> {
        run_migrations(&self.pool)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Repository implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl LedgerRepository for PostgresRepo {
    type Uow = PostgresUow;

    async fn begin(&self) -> Result<PostgresUow, RepoError> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepoError::Transaction(e.to_string()))?;
        Ok(PostgresUow { tx })
    }

    async fn find_wallet(&self, identity: &Identity) -> Result<Option<Wallet>, RepoError> {
        let row: Option<WalletRow> = sqlx::query_as(
            r#"SELECT identity, balance, created_at, updated_at FROM wallets WHERE identity = $1"#,
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
            "SELECT {} FROM transactions WHERE reference = $1",
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
        let rows: Vec<TransactionRow> = sqlx::query_as(&format!(
            "SELECT {} FROM transactions WHERE identity = $1 ORDER BY created_at DESC, reference",
            TRANSACTION_COLUMNS
        ))
        .bind(identity.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        rows.into_iter().map(TransactionRow::into_domain).collect()
    }

    async fn list_transactions_by_status(
        &self,
        status: TransactionStatus,
    ) -> Result<Vec<Transaction>, RepoError> {
        let rows: Vec<TransactionRow> = sqlx::query_as(&format!(
            "SELECT {} FROM transactions WHERE status = $1 ORDER BY created_at DESC, reference",
            TRANSACTION_COLUMNS
        ))
        .bind(status.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        rows.into_iter().map(TransactionRow::into_domain).collect()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Unit of work
// ─────────────────────────────────────────────────────────────────────────────

/// PostgreSQL unit of work. Rows read "for update" stay locked until commit
/// or rollback.
pub struct PostgresUow {
    tx: sqlx::Transaction<'static, Postgres>,
}

#[async_trait]
impl UnitOfWork for PostgresUow {
    async fn wallet_for_update(&mut self, identity: &Identity) -> Result<Wallet, RepoError> {
        let now = Utc::now();
        sqlx::query(
            r#"INSERT INTO wallets (identity, balance, created_at, updated_at)
               VALUES ($1, 0, $2, $2)
               ON CONFLICT (identity) DO NOTHING"#,
        )
        .bind(identity.as_str())
        .bind(now)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        let row: WalletRow = sqlx::query_as(
            r#"SELECT identity, balance, created_at, updated_at
               FROM wallets WHERE identity = $1 FOR UPDATE"#,
        )
        .bind(identity.as_str())
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        row.into_domain()
    }

    async fn save_wallet(&mut self, wallet: &Wallet) -> Result<(), RepoError> {
        let result =
            sqlx::query(r#"UPDATE wallets SET balance = $1, updated_at = $2 WHERE identity = $3"#)
                .bind(wallet.balance.amount())
                .bind(wallet.updated_at)
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
        let row: Option<TransactionRow> = sqlx::query_as(&format!(
            "SELECT {} FROM transactions WHERE reference = $1 FOR UPDATE",
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
            "INSERT INTO transactions ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
            TRANSACTION_COLUMNS
        ))
        .bind(tx.reference.as_str())
        .bind(tx.transaction_type.to_string())
        .bind(tx.status.to_string())
        .bind(tx.amount.amount())
        .bind(tx.identity.as_ref().map(Identity::as_str))
        .bind(tx.recipient_code.as_deref())
        .bind(tx.reason.as_deref())
        .bind(tx.created_at)
        .bind(tx.updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_write_error(e, tx.reference.as_str()))?;

        Ok(())
    }

    async fn save_transaction(&mut self, tx: &Transaction) -> Result<(), RepoError> {
        let result = sqlx::query(
            r#"UPDATE transactions
               SET status = $1, amount = $2, identity = $3, recipient_code = $4, reason = $5, updated_at = $6
               WHERE reference = $7"#,
        )
        .bind(tx.status.to_string())
        .bind(tx.amount.amount())
        .bind(tx.identity.as_ref().map(Identity::as_str))
        .bind(tx.recipient_code.as_deref())
        .bind(tx.reason.as_deref())
        .bind(tx.updated_at)
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
