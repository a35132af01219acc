//! Port traits (interfaces for adapters).
//!
//! These are the contracts that adapters must implement.
//! The application layer depends on these traits, not concrete implementations.

mod gateway;
mod repository;

pub use gateway::{
    Bank, DepositAuthorization, DepositCharge, GatewayError, NewRecipient, PaymentGateway,
    Recipient, TransferInstruction, TransferReceipt, VerifiedPayment,
};
pub use repository::{LedgerRepository, UnitOfWork};
