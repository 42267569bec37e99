//! Persistence collaborator.
//!
//! The engine needs very little from storage: keyed lookups, one
//! consistent read of every collection, and an atomic batch write. Hosts
//! own the store and hand it to each engine call.

pub mod memory;
pub mod seed;
pub mod snapshot;

use crate::core::client::{Client, ClientId};
use crate::core::currency::{BoxId, CashBox, Currency, CurrencyCode};
use crate::core::movement::{CashMovement, DebtMovement};
use crate::core::transaction::Transaction;
use crate::rates::table::ExchangeRate;
use rust_decimal::Decimal;
use snapshot::Snapshot;
use std::path::PathBuf;
use thiserror::Error;

pub use memory::MemoryStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("constraint violated: {0}")]
    Constraint(String),
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("snapshot (de)serialization failed: {0}")]
    Serde(#[from] serde_json::Error),
}

/// One record write inside a [`WriteBatch`].
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    InsertCurrency(Currency),
    UpdateCurrency(Currency),
    InsertCashBox(CashBox),
    /// Insert or replace the edge with the same `(from, to)`.
    PutRate(ExchangeRate),
    InsertClient(Client),
    UpdateClient(Client),
    InsertTransaction(Transaction),
    AppendMovement(CashMovement),
    AppendDebtMovement(DebtMovement),
}

/// A group of writes that becomes visible all at once or not at all.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, op: WriteOp) -> &mut Self {
        self.ops.push(op);
        self
    }

    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn into_ops(self) -> Vec<WriteOp> {
        self.ops
    }
}

impl FromIterator<WriteOp> for WriteBatch {
    fn from_iter<T: IntoIterator<Item = WriteOp>>(iter: T) -> Self {
        Self {
            ops: iter.into_iter().collect(),
        }
    }
}

/// Record store used by the engine.
pub trait Store {
    /// Every collection as of one point in time.
    fn read(&self) -> Result<Snapshot, StoreError>;

    fn currency(&self, symbol: &CurrencyCode) -> Result<Option<Currency>, StoreError>;

    fn cash_box(&self, id: &BoxId) -> Result<Option<CashBox>, StoreError>;

    fn client(&self, id: &ClientId) -> Result<Option<Client>, StoreError>;

    fn exchange_rates(&self) -> Result<Vec<ExchangeRate>, StoreError>;

    fn debt_movements(&self, client: &ClientId) -> Result<Vec<DebtMovement>, StoreError>;

    /// Current balance of one box.
    fn box_balance(&self, id: &BoxId) -> Result<Decimal, StoreError> {
        Ok(self.read()?.cash_movements.balances_by_box().balance(id))
    }

    /// Apply every write in `batch`, or none of them.
    fn commit(&mut self, batch: WriteBatch) -> Result<(), StoreError>;

    /// Drop every collection and load `snapshot` in its place, atomically.
    fn replace_all(&mut self, snapshot: Snapshot) -> Result<(), StoreError>;
}
