use crate::core::client::{Client, ClientId};
use crate::core::currency::{BoxId, CashBox, Currency, CurrencyCode};
use crate::core::ledger::MovementLedger;
use crate::core::movement::DebtMovement;
use crate::core::transaction::Transaction;
use crate::rates::table::{ExchangeRate, RateTable};
use crate::store::{StoreError, WriteBatch, WriteOp};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Full copy of every collection the engine owns.
///
/// Used both as the consistent read handed to reports and as the backup
/// format. Importing a snapshot that was just exported reproduces the same
/// balances, debts and transaction history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub currencies: Vec<Currency>,
    #[serde(default)]
    pub cash_boxes: Vec<CashBox>,
    #[serde(default)]
    pub exchange_rates: Vec<ExchangeRate>,
    #[serde(default)]
    pub clients: Vec<Client>,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    #[serde(default)]
    pub cash_movements: MovementLedger,
    #[serde(default)]
    pub debt_movements: Vec<DebtMovement>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exported_at: Option<DateTime<Utc>>,
}

impl Snapshot {
    pub fn currency(&self, symbol: &CurrencyCode) -> Option<&Currency> {
        self.currencies.iter().find(|c| &c.symbol == symbol)
    }

    pub fn cash_box(&self, id: &BoxId) -> Option<&CashBox> {
        self.cash_boxes.iter().find(|b| &b.id == id)
    }

    pub fn boxes_for(&self, currency: &CurrencyCode) -> Vec<&CashBox> {
        self.cash_boxes
            .iter()
            .filter(|b| b.currency() == currency)
            .collect()
    }

    pub fn client(&self, id: &ClientId) -> Option<&Client> {
        self.clients.iter().find(|c| &c.id == id)
    }

    pub fn debt_movements_for<'a>(&'a self, id: &'a ClientId) -> impl Iterator<Item = &'a DebtMovement> + 'a {
        self.debt_movements.iter().filter(move |m| m.client_id() == id)
    }

    pub fn rate_table(&self, pivot: &CurrencyCode) -> RateTable {
        RateTable::from_edges(pivot.clone(), &self.exchange_rates)
    }

    /// Stamp the export time; stores never set it themselves.
    pub fn stamped(mut self) -> Self {
        self.exported_at = Some(Utc::now());
        self
    }

    /// The writes that rebuild this snapshot from an empty store, in
    /// dependency order.
    pub fn to_batch(&self) -> WriteBatch {
        let currencies = self.currencies.iter().cloned().map(WriteOp::InsertCurrency);
        let boxes = self.cash_boxes.iter().cloned().map(WriteOp::InsertCashBox);
        let rates = self.exchange_rates.iter().cloned().map(WriteOp::PutRate);
        let clients = self.clients.iter().cloned().map(WriteOp::InsertClient);
        let transactions = self.transactions.iter().cloned().map(WriteOp::InsertTransaction);
        let movements = self
            .cash_movements
            .movements()
            .iter()
            .cloned()
            .map(WriteOp::AppendMovement);
        let debt = self.debt_movements.iter().cloned().map(WriteOp::AppendDebtMovement);

        currencies
            .chain(boxes)
            .chain(rates)
            .chain(clients)
            .chain(transactions)
            .chain(movements)
            .chain(debt)
            .collect()
    }

    pub fn to_json(&self) -> Result<String, StoreError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, StoreError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), StoreError> {
        let path = path.as_ref();
        fs::write(path, self.to_json()?).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content)
    }
}
