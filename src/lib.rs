//! # remittance-engine
//!
//! Multi-currency cash ledger for a remittance and exchange desk.
//!
//! Every operation posts signed movements against named cash boxes; box
//! balances, business value and daily profit are derived from that log.
//! Exchange rates are quoted against a single pivot currency and any
//! cross rate is resolved through it.
//!
//! ## Architecture
//!
//! - **core**: currencies, cash boxes, clients, movements, transactions
//! - **rates**: Pivot-anchored rate table and the cross-rate resolver
//! - **engine**: Remittance calculator and posting, debt subledger,
//!   inventory exchange, valuation and consistency checks
//! - **store**: Persistence trait, in-memory store and JSON snapshots
//! - **simulation**: Random workloads for tests and benchmarks

pub mod config;
pub mod core;
pub mod engine;
pub mod error;
pub mod rates;
pub mod simulation;
pub mod store;

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::config::EngineConfig;
    pub use crate::core::client::{Client, ClientId};
    pub use crate::core::currency::{BoxId, CashBox, Currency, CurrencyCode};
    pub use crate::core::ledger::{BoxBalances, MovementLedger};
    pub use crate::core::movement::{CashMovement, DebtMovement, MovementKind};
    pub use crate::core::transaction::Transaction;
    pub use crate::engine::calculator::{AmountInput, Quote, TransactionCalculator};
    pub use crate::engine::inventory::AdjustmentDirection;
    pub use crate::engine::remittance::RemittanceOrder;
    pub use crate::engine::valuation::Valuation;
    pub use crate::engine::Desk;
    pub use crate::error::{EngineError, Result};
    pub use crate::rates::resolver::RateResolver;
    pub use crate::rates::table::RateTable;
    pub use crate::store::snapshot::Snapshot;
    pub use crate::store::{MemoryStore, Store};
}
