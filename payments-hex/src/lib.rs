//! # Payments Hex
//!
//! Application service layer and HTTP adapter for the payments service.
//!
//! ## Architecture
//!
//! - `service/` - Transaction reconciliation (deposits, withdrawals, queries)
//! - `wallet/` - Wallet ledger operations
//! - `locks/` - Per-reference serialization
//! - `inbound/` - HTTP adapter (Axum server)
//!
//! The service is generic over `R: LedgerRepository` and `G: PaymentGateway`,
//! allowing different adapters to be injected.

pub mod inbound;
pub mod locks;
pub mod service;
pub mod wallet;


pub use service::{PaymentService, VerificationOutcome};
pub use wallet::WalletService;
