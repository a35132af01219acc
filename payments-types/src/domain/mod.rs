//! Domain models for the payment service.

pub mod identity;
pub mod money;
pub mod transaction;
pub mod wallet;

pub use identity::{Identity, Reference};
pub use money::Money;
pub use transaction::{Transaction, TransactionStatus, TransactionType};
pub use wallet::Wallet;
