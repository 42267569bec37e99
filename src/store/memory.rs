use crate::core::client::{Client, ClientId};
use crate::core::currency::{BoxId, CashBox, Currency, CurrencyCode};
use crate::core::movement::DebtMovement;
use crate::rates::table::{validated_edge, ExchangeRate};
use crate::store::seed::default_catalogue;
use crate::store::snapshot::Snapshot;
use crate::store::{Store, StoreError, WriteBatch, WriteOp};
use log::debug;
use rust_decimal::Decimal;

/// In-process store.
///
/// A batch is applied in place. Each write records how to undo itself, and
/// a batch that fails a constraint check is unwound in reverse order, which
/// gives all-or-nothing commits without copying the state.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Snapshot,
}

/// How to take back one applied write.
enum Undo {
    PopCurrency,
    RestoreCurrency(usize, Currency),
    PopCashBox,
    PopRate,
    RestoreRate(usize, ExchangeRate),
    PopClient,
    RestoreClient(usize, Client),
    PopTransaction,
    PopMovement,
    PopDebtMovement,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store preloaded with the stock catalogue.
    pub fn seeded() -> Self {
        Self {
            state: default_catalogue(),
        }
    }

    /// Load a snapshot, checking it the same way an import would.
    pub fn from_snapshot(snapshot: Snapshot) -> Result<Self, StoreError> {
        let mut store = Self::new();
        store.replace_all(snapshot)?;
        Ok(store)
    }
}

impl Store for MemoryStore {
    fn read(&self) -> Result<Snapshot, StoreError> {
        Ok(self.state.clone())
    }

    fn currency(&self, symbol: &CurrencyCode) -> Result<Option<Currency>, StoreError> {
        Ok(self.state.currency(symbol).cloned())
    }

    fn cash_box(&self, id: &BoxId) -> Result<Option<CashBox>, StoreError> {
        Ok(self.state.cash_box(id).cloned())
    }

    fn client(&self, id: &ClientId) -> Result<Option<Client>, StoreError> {
        Ok(self.state.client(id).cloned())
    }

    fn exchange_rates(&self) -> Result<Vec<ExchangeRate>, StoreError> {
        Ok(self.state.exchange_rates.clone())
    }

    fn debt_movements(&self, client: &ClientId) -> Result<Vec<DebtMovement>, StoreError> {
        Ok(self.state.debt_movements_for(client).cloned().collect())
    }

    fn box_balance(&self, id: &BoxId) -> Result<Decimal, StoreError> {
        Ok(self
            .state
            .cash_movements
            .movements()
            .iter()
            .filter(|m| m.box_id() == id)
            .fold(Decimal::ZERO, |sum, m| sum.saturating_add(m.amount())))
    }

    fn commit(&mut self, batch: WriteBatch) -> Result<(), StoreError> {
        let count = batch.len();
        let mut undo = Vec::with_capacity(count);
        for op in batch.into_ops() {
            match apply(&mut self.state, op) {
                Ok(step) => undo.push(step),
                Err(e) => {
                    debug!("rolling back {} of {} writes: {}", undo.len(), count, e);
                    rollback(&mut self.state, undo);
                    return Err(e);
                }
            }
        }
        debug!("committed batch of {} writes", count);
        Ok(())
    }

    fn replace_all(&mut self, snapshot: Snapshot) -> Result<(), StoreError> {
        let mut staged = Snapshot::default();
        for op in snapshot.to_batch().into_ops() {
            apply(&mut staged, op)?;
        }
        self.state = staged;
        Ok(())
    }
}

fn apply(state: &mut Snapshot, op: WriteOp) -> Result<Undo, StoreError> {
    let undo = match op {
        WriteOp::InsertCurrency(currency) => {
            if state.currency(&currency.symbol).is_some() {
                return Err(constraint(format!("currency {} already exists", currency.symbol)));
            }
            state.currencies.push(currency);
            Undo::PopCurrency
        }
        WriteOp::UpdateCurrency(currency) => {
            let index = state
                .currencies
                .iter()
                .position(|c| c.symbol == currency.symbol)
                .ok_or_else(|| constraint(format!("currency {} does not exist", currency.symbol)))?;
            Undo::RestoreCurrency(index, std::mem::replace(&mut state.currencies[index], currency))
        }
        WriteOp::InsertCashBox(cash_box) => {
            require_currency(state, cash_box.currency())?;
            if state.cash_box(&cash_box.id).is_some() {
                return Err(constraint(format!("cash box {} already exists", cash_box.id)));
            }
            state.cash_boxes.push(cash_box);
            Undo::PopCashBox
        }
        WriteOp::PutRate(rate) => {
            require_currency(state, &rate.from)?;
            require_currency(state, &rate.to)?;
            validated_edge(&rate.from, rate.from.clone(), rate.to.clone(), rate.rate)
                .map_err(|e| constraint(e.to_string()))?;
            match state
                .exchange_rates
                .iter()
                .position(|r| r.from == rate.from && r.to == rate.to)
            {
                Some(index) => {
                    Undo::RestoreRate(index, std::mem::replace(&mut state.exchange_rates[index], rate))
                }
                None => {
                    state.exchange_rates.push(rate);
                    Undo::PopRate
                }
            }
        }
        WriteOp::InsertClient(client) => {
            if state.client(&client.id).is_some() {
                return Err(constraint(format!("client {} already exists", client.id)));
            }
            state.clients.push(client);
            Undo::PopClient
        }
        WriteOp::UpdateClient(client) => {
            let index = state
                .clients
                .iter()
                .position(|c| c.id == client.id)
                .ok_or_else(|| constraint(format!("client {} does not exist", client.id)))?;
            Undo::RestoreClient(index, std::mem::replace(&mut state.clients[index], client))
        }
        WriteOp::InsertTransaction(transaction) => {
            if state.transactions.iter().any(|t| t.id == transaction.id) {
                return Err(constraint(format!("transaction {} already exists", transaction.id)));
            }
            require_client(state, &transaction.client_id)?;
            state.transactions.push(transaction);
            Undo::PopTransaction
        }
        WriteOp::AppendMovement(movement) => {
            if state.cash_box(movement.box_id()).is_none() {
                return Err(constraint(format!(
                    "movement {} targets unknown box {}",
                    movement.id(),
                    movement.box_id()
                )));
            }
            state.cash_movements.append(movement);
            Undo::PopMovement
        }
        WriteOp::AppendDebtMovement(movement) => {
            require_client(state, movement.client_id())?;
            state.debt_movements.push(movement);
            Undo::PopDebtMovement
        }
    };
    Ok(undo)
}

fn rollback(state: &mut Snapshot, undo: Vec<Undo>) {
    for step in undo.into_iter().rev() {
        match step {
            Undo::PopCurrency => {
                state.currencies.pop();
            }
            Undo::RestoreCurrency(index, previous) => state.currencies[index] = previous,
            Undo::PopCashBox => {
                state.cash_boxes.pop();
            }
            Undo::PopRate => {
                state.exchange_rates.pop();
            }
            Undo::RestoreRate(index, previous) => state.exchange_rates[index] = previous,
            Undo::PopClient => {
                state.clients.pop();
            }
            Undo::RestoreClient(index, previous) => state.clients[index] = previous,
            Undo::PopTransaction => {
                state.transactions.pop();
            }
            Undo::PopMovement => {
                state.cash_movements.pop();
            }
            Undo::PopDebtMovement => {
                state.debt_movements.pop();
            }
        }
    }
}

fn require_currency(state: &Snapshot, symbol: &CurrencyCode) -> Result<(), StoreError> {
    state
        .currency(symbol)
        .map(|_| ())
        .ok_or_else(|| constraint(format!("currency {} does not exist", symbol)))
}

fn require_client(state: &Snapshot, id: &ClientId) -> Result<(), StoreError> {
    state
        .client(id)
        .map(|_| ())
        .ok_or_else(|| constraint(format!("client {} does not exist", id)))
}

fn constraint(message: String) -> StoreError {
    StoreError::Constraint(message)
}
