use crate::core::client::ClientId;
use crate::core::currency::BoxId;
use crate::core::ledger::BoxBalances;
use crate::core::transaction::Transaction;
use crate::engine::debt::{ClientStatement, DebtSubledger};
use crate::engine::Desk;
use crate::error::{ConsistencyViolation, NotFound, Result};
use crate::rates::resolver::RateResolver;
use crate::store::snapshot::Snapshot;
use crate::store::Store;
use chrono::{NaiveDate, Utc};
use log::{debug, warn};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Business value in the pivot currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Valuation {
    /// Cash held across every box that could be converted.
    pub cash: Decimal,
    /// Outstanding client debt.
    pub receivables: Decimal,
    pub total: Decimal,
    /// Boxes left out because their currency has no usable rate.
    pub excluded: Vec<BoxId>,
}

impl Desk {
    /// Balance of every box that has ever moved.
    pub fn balances<S: Store>(&self, store: &S) -> Result<BoxBalances> {
        Ok(store.read()?.cash_movements.balances_by_box())
    }

    /// Cash plus receivables, expressed in the pivot currency.
    ///
    /// Non-pivot box balances are divided by the `pivot -> currency` rate.
    /// A box whose currency has no rate is skipped, not an error. Client
    /// debt is added as-is unless `convert_client_debt` is set.
    pub fn business_value<S: Store>(&self, store: &S) -> Result<Valuation> {
        let snapshot = store.read()?;
        Ok(self.value_snapshot(&snapshot))
    }

    pub(crate) fn value_snapshot(&self, snapshot: &Snapshot) -> Valuation {
        let table = snapshot.rate_table(self.pivot());
        let resolver = RateResolver::new(&table);

        let mut cash = Decimal::ZERO;
        let mut excluded = Vec::new();
        for (box_id, balance) in snapshot.cash_movements.balances_by_box().sorted() {
            match resolver.to_pivot(balance, &box_id.currency) {
                Some(value) => cash = cash.saturating_add(value),
                None => {
                    warn!("box {} excluded from valuation: no rate for {}", box_id, box_id.currency);
                    excluded.push(box_id.clone());
                }
            }
        }

        let mut receivables = Decimal::ZERO;
        for client in snapshot.clients.iter().filter(|c| c.has_debt()) {
            if !self.config().convert_client_debt {
                receivables = receivables.saturating_add(client.debt);
                continue;
            }
            match resolver.to_pivot(client.debt, &client.debt_currency) {
                Some(value) => receivables = receivables.saturating_add(value),
                None => warn!(
                    "debt of client {} excluded from valuation: no rate for {}",
                    client.id, client.debt_currency
                ),
            }
        }

        debug!("valuation: cash {} + receivables {}", cash, receivables);
        Valuation {
            cash,
            receivables,
            total: cash.saturating_add(receivables),
            excluded,
        }
    }

    /// Transactions created on `date` (UTC), oldest first.
    pub fn transactions_on<S: Store>(&self, store: &S, date: NaiveDate) -> Result<Vec<Transaction>> {
        let mut transactions: Vec<_> = store
            .read()?
            .transactions
            .into_iter()
            .filter(|t| t.is_on(date))
            .collect();
        transactions.sort_by_key(|t| t.created_at);
        Ok(transactions)
    }

    /// Transaction history, newest first. A non-empty `query` keeps only
    /// transactions whose client name or client ID contains it, ignoring
    /// case.
    pub fn search_transactions<S: Store>(&self, store: &S, query: &str) -> Result<Vec<Transaction>> {
        let needle = query.trim().to_lowercase();
        let mut transactions: Vec<_> = store
            .read()?
            .transactions
            .into_iter()
            .filter(|t| {
                needle.is_empty()
                    || t.client_name.to_lowercase().contains(&needle)
                    || t.client_id.as_str().to_lowercase().contains(&needle)
            })
            .collect();
        transactions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(transactions)
    }

    /// Sum of the day's transaction profits in the pivot currency.
    /// Profits in a currency without a rate are skipped.
    pub fn profit_on<S: Store>(&self, store: &S, date: NaiveDate) -> Result<Decimal> {
        let snapshot = store.read()?;
        let table = snapshot.rate_table(self.pivot());
        let resolver = RateResolver::new(&table);

        let total = snapshot
            .transactions
            .iter()
            .filter(|t| t.is_on(date))
            .filter_map(|t| {
                let converted = resolver.to_pivot(t.profit, &t.profit_currency);
                if converted.is_none() {
                    warn!(
                        "profit of {} skipped: no rate for {}",
                        t.reference(),
                        t.profit_currency
                    );
                }
                converted
            })
            .fold(Decimal::ZERO, |sum, profit| sum.saturating_add(profit));
        Ok(total)
    }

    pub fn todays_profit<S: Store>(&self, store: &S) -> Result<Decimal> {
        self.profit_on(store, Utc::now().date_naive())
    }

    pub fn client_statement<S: Store>(&self, store: &S, client_id: &ClientId) -> Result<ClientStatement> {
        let client = store
            .client(client_id)?
            .ok_or_else(|| NotFound::Client(client_id.clone()))?;
        let mut movements = store.debt_movements(client_id)?;
        movements.sort_by_key(|m| m.created_at());
        Ok(DebtSubledger::statement(client, movements))
    }

    /// Check one client's debt against its movement history.
    pub fn verify_debt<S: Store>(&self, store: &S, client_id: &ClientId) -> Result<()> {
        let statement = self.client_statement(store, client_id)?;
        DebtSubledger::verify(&statement.client, &statement.movements)?;
        Ok(())
    }

    /// Check every reference and every client's debt in one consistent
    /// read. Stops at the first violation.
    pub fn verify_all<S: Store>(&self, store: &S) -> Result<()> {
        let snapshot = store.read()?;

        let boxes: HashSet<&BoxId> = snapshot.cash_boxes.iter().map(|b| &b.id).collect();
        for movement in snapshot.cash_movements.movements() {
            if !boxes.contains(movement.box_id()) {
                return Err(ConsistencyViolation::UnknownBox {
                    movement: movement.id(),
                    box_id: movement.box_id().clone(),
                }
                .into());
            }
        }

        let clients: HashSet<&ClientId> = snapshot.clients.iter().map(|c| &c.id).collect();
        for movement in &snapshot.debt_movements {
            if !clients.contains(movement.client_id()) {
                return Err(ConsistencyViolation::UnknownClient {
                    movement: movement.id(),
                    client: movement.client_id().clone(),
                }
                .into());
            }
        }

        for client in &snapshot.clients {
            DebtSubledger::verify(client, snapshot.debt_movements_for(&client.id))?;
        }
        debug!(
            "verified {} movements and {} clients",
            snapshot.cash_movements.len(),
            snapshot.clients.len()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::core::currency::CurrencyCode;
    use crate::engine::calculator::AmountInput;
    use crate::engine::inventory::AdjustmentDirection;
    use crate::engine::remittance::RemittanceOrder;
    use crate::error::EngineError;
    use crate::store::MemoryStore;
    use rust_decimal_macros::dec;

    #[test]
    fn test_business_value_converts_through_pivot() {
        let desk = Desk::default();
        let mut store = MemoryStore::seeded();
        desk.adjust(&mut store, &BoxId::new("USD", "Efectivo"), AdjustmentDirection::In, dec!(100), "")
            .unwrap();
        desk.adjust(&mut store, &BoxId::new("BS", "Efectivo"), AdjustmentDirection::In, dec!(3650), "")
            .unwrap();

        let value = desk.business_value(&store).unwrap();
        assert_eq!(value.cash, dec!(200));
        assert_eq!(value.total, dec!(200));
        assert!(value.excluded.is_empty());
    }

    #[test]
    fn test_box_without_rate_is_excluded() {
        let desk = Desk::default();
        let mut store = MemoryStore::seeded();
        desk.add_currency(&mut store, "EUR", "Euro", dec!(2)).unwrap();
        desk.add_cash_box(&mut store, &CurrencyCode::new("EUR"), "Cash").unwrap();
        let eur_cash = BoxId::new("EUR", "Cash");
        desk.adjust(&mut store, &eur_cash, AdjustmentDirection::In, dec!(50), "")
            .unwrap();
        desk.adjust(&mut store, &BoxId::new("USD", "Zelle"), AdjustmentDirection::In, dec!(10), "")
            .unwrap();

        let value = desk.business_value(&store).unwrap();
        assert_eq!(value.total, dec!(10));
        assert_eq!(value.excluded, vec![eur_cash]);
    }

    #[test]
    fn test_debt_added_raw_by_default() {
        let desk = Desk::default();
        let mut store = MemoryStore::seeded();
        desk.register_client(&mut store, "V-1", "Ana", "").unwrap();
        desk.apply_debt_delta(&mut store, &ClientId::new("V-1"), dec!(3650), &CurrencyCode::new("BS"), "credit", None)
            .unwrap();

        let value = desk.business_value(&store).unwrap();
        assert_eq!(value.receivables, dec!(3650));

        let converting = Desk::new(EngineConfig {
            convert_client_debt: true,
            ..EngineConfig::default()
        });
        let value = converting.business_value(&store).unwrap();
        assert_eq!(value.receivables, dec!(100));
    }

    #[test]
    fn test_todays_profit_in_pivot() {
        let desk = Desk::default();
        let mut store = MemoryStore::seeded();
        desk.register_client(&mut store, "V-1", "Ana", "").unwrap();

        let usd = RemittanceOrder::new(
            "V-1",
            CurrencyCode::new("USD"),
            BoxId::new("BS", "Efectivo"),
            AmountInput::Send(dec!(100)),
        )
        .from_box("Zelle")
        .with_commission(dec!(5));
        desk.execute_remittance(&mut store, &usd).unwrap();

        let bs = RemittanceOrder::new(
            "V-1",
            CurrencyCode::new("BS"),
            BoxId::new("USD", "Efectivo"),
            AmountInput::Send(dec!(3650)),
        )
        .from_box("Pago Móvil")
        .with_commission(dec!(10));
        desk.execute_remittance(&mut store, &bs).unwrap();

        // 5 USD + 365 BS / 36.5
        assert_eq!(desk.todays_profit(&store).unwrap(), dec!(15));
        let today = Utc::now().date_naive();
        assert_eq!(desk.transactions_on(&store, today).unwrap().len(), 2);

        let yesterday = today.pred_opt().unwrap();
        assert_eq!(desk.profit_on(&store, yesterday).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_verify_all_flags_tampered_debt() {
        let desk = Desk::default();
        let mut store = MemoryStore::seeded();
        desk.register_client(&mut store, "V-1", "Ana", "").unwrap();
        desk.apply_debt_delta(&mut store, &ClientId::new("V-1"), dec!(40), &CurrencyCode::new("USD"), "credit", None)
            .unwrap();
        assert!(desk.verify_all(&store).is_ok());

        let mut snapshot = store.read().unwrap();
        snapshot.clients[0].debt = dec!(41);
        let tampered = MemoryStore::from_snapshot(snapshot).unwrap();
        assert!(matches!(
            desk.verify_all(&tampered),
            Err(EngineError::Consistency(ConsistencyViolation::DebtDiverges { .. }))
        ));
    }

    #[test]
    fn test_client_statement() {
        let desk = Desk::default();
        let mut store = MemoryStore::seeded();
        let id = ClientId::new("V-1");
        desk.register_client(&mut store, "V-1", "Ana", "").unwrap();
        let usd = CurrencyCode::new("USD");
        desk.apply_debt_delta(&mut store, &id, dec!(40), &usd, "credit", None).unwrap();
        desk.apply_debt_delta(&mut store, &id, dec!(-15), &usd, "cash payment", None).unwrap();

        let statement = desk.client_statement(&store, &id).unwrap();
        assert_eq!(statement.movements.len(), 2);
        assert_eq!(statement.client.debt, dec!(25));
        assert_eq!(statement.movement_sum, dec!(25));

        let missing = desk.client_statement(&store, &ClientId::new("V-2"));
        assert!(missing.unwrap_err().is_not_found());
    }

    #[test]
    fn test_search_transactions_by_name_or_id() {
        let desk = Desk::default();
        let mut store = MemoryStore::seeded();
        desk.register_client(&mut store, "V-12345678", "Ana Pérez", "").unwrap();
        desk.register_client(&mut store, "E-87654321", "Luis Gómez", "").unwrap();
        for client in ["V-12345678", "E-87654321", "V-12345678"] {
            let order = RemittanceOrder::new(
                client,
                CurrencyCode::new("USD"),
                BoxId::new("BS", "Efectivo"),
                AmountInput::Send(dec!(10)),
            )
            .from_box("Zelle");
            desk.execute_remittance(&mut store, &order).unwrap();
        }

        let all = desk.search_transactions(&store, "  ").unwrap();
        assert_eq!(all.len(), 3);
        assert!(all.windows(2).all(|w| w[0].created_at >= w[1].created_at));

        let by_name = desk.search_transactions(&store, "pérez").unwrap();
        assert_eq!(by_name.len(), 2);
        assert!(by_name.iter().all(|t| t.client_id == ClientId::new("V-12345678")));

        let by_id = desk.search_transactions(&store, "8765").unwrap();
        assert_eq!(by_id.len(), 1);
        assert_eq!(by_id[0].client_name, "Luis Gómez");

        assert!(desk.search_transactions(&store, "nobody").unwrap().is_empty());
    }
}
