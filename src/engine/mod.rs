//! Operations of the exchange desk.
//!
//! [`Desk`] holds configuration only. Every operation receives the store
//! it works on, so the host decides how long state lives and where it is
//! kept.
//!
//! - **calculator**: forward/reverse remittance amounts and debt carve-outs
//! - **debt**: client debt subledger
//! - **remittance**: atomic remittance posting
//! - **inventory**: currency swaps between boxes and manual adjustments
//! - **catalogue**: currencies, boxes, rates and clients
//! - **valuation**: balances, business value, daily profit, consistency checks

pub mod calculator;
pub mod catalogue;
pub mod debt;
pub mod inventory;
pub mod remittance;
pub mod valuation;

use crate::config::EngineConfig;
use crate::core::currency::{BoxId, CurrencyCode};
use crate::core::movement::CashMovement;
use crate::error::{Result, ValidationError};
use crate::rates::table::RateTable;
use crate::store::Store;
use rust_decimal::Decimal;
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct Desk {
    config: EngineConfig,
}

impl Desk {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn pivot(&self) -> &CurrencyCode {
        &self.config.pivot
    }

    /// Current pivot-anchored rate table.
    pub fn rate_table<S: Store>(&self, store: &S) -> Result<RateTable> {
        let edges = store.exchange_rates()?;
        Ok(RateTable::from_edges(self.config.pivot.clone(), &edges))
    }

    /// Reject a posting that would push any box balance out of the
    /// `Decimal` range. Movements hitting the same box are summed in order.
    pub(crate) fn check_headroom<'a, S: Store>(
        &self,
        store: &S,
        movements: impl IntoIterator<Item = &'a CashMovement>,
    ) -> Result<()> {
        let mut running: HashMap<&BoxId, Decimal> = HashMap::new();
        for movement in movements {
            let current = match running.get(movement.box_id()) {
                Some(balance) => *balance,
                None => store.box_balance(movement.box_id())?,
            };
            let next = current
                .checked_add(movement.amount())
                .ok_or(ValidationError::Overflow("box balance"))?;
            running.insert(movement.box_id(), next);
        }
        Ok(())
    }
}
