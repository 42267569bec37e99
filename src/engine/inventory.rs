use crate::core::currency::BoxId;
use crate::core::movement::{CashMovement, MovementKind};
use crate::engine::Desk;
use crate::error::{Result, ValidationError};
use crate::store::{Store, WriteBatch, WriteOp};
use log::info;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The two legs of a currency swap between boxes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exchange {
    pub purchase: CashMovement,
    pub sale: CashMovement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdjustmentDirection {
    /// Capital brought into the business.
    In,
    /// Expense or withdrawal.
    Out,
}

impl Desk {
    /// Buy `amount` of the buy box's currency, paying `amount * rate` out
    /// of the sell box. Both legs are committed together; no transaction
    /// record or client is involved.
    pub fn exchange<S: Store>(
        &self,
        store: &mut S,
        buy_box: &BoxId,
        sell_box: &BoxId,
        amount: Decimal,
        rate: Decimal,
    ) -> Result<Exchange> {
        if amount <= Decimal::ZERO {
            return Err(ValidationError::NonPositiveAmount {
                field: "purchase amount",
                amount,
            }
            .into());
        }
        if rate <= Decimal::ZERO {
            return Err(ValidationError::NonPositiveRate(rate).into());
        }
        self.require_box(&*store, buy_box)?;
        self.require_box(&*store, sell_box)?;

        let sell_amount = amount
            .checked_mul(rate)
            .ok_or(ValidationError::Overflow("sale amount"))?;

        let purchase = CashMovement::new(
            buy_box.clone(),
            amount,
            MovementKind::Purchase,
            format!("Purchase of {}", buy_box.currency),
        );
        let sale = CashMovement::new(
            sell_box.clone(),
            -sell_amount,
            MovementKind::Sale,
            format!("Sale of {}", sell_box.currency),
        );

        self.check_headroom(&*store, [&purchase, &sale])?;

        let mut batch = WriteBatch::new();
        batch
            .push(WriteOp::AppendMovement(purchase.clone()))
            .push(WriteOp::AppendMovement(sale.clone()));
        store.commit(batch)?;

        info!(
            "exchange: bought {} {} into {}, sold {} {} from {}",
            amount, buy_box.currency, buy_box, sell_amount, sell_box.currency, sell_box
        );
        Ok(Exchange { purchase, sale })
    }

    /// Post a one-leg capital adjustment. An empty concept falls back to a
    /// generic description.
    pub fn adjust<S: Store>(
        &self,
        store: &mut S,
        box_id: &BoxId,
        direction: AdjustmentDirection,
        amount: Decimal,
        concept: &str,
    ) -> Result<CashMovement> {
        if amount <= Decimal::ZERO {
            return Err(ValidationError::NonPositiveAmount {
                field: "adjustment amount",
                amount,
            }
            .into());
        }
        self.require_box(&*store, box_id)?;

        let (signed, kind, fallback) = match direction {
            AdjustmentDirection::In => (amount, MovementKind::AdjustmentIn, "Capital injection"),
            AdjustmentDirection::Out => (-amount, MovementKind::AdjustmentOut, "Expense"),
        };
        let concept = match concept.trim() {
            "" => fallback,
            c => c,
        };
        let movement = CashMovement::new(box_id.clone(), signed, kind, concept);
        self.check_headroom(&*store, [&movement])?;
        store.commit(WriteBatch::from_iter([WriteOp::AppendMovement(movement.clone())]))?;

        info!("adjustment on {}: {} ({})", box_id, signed, movement.concept());
        Ok(movement)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use crate::store::MemoryStore;
    use rust_decimal_macros::dec;

    #[test]
    fn test_exchange_posts_two_legs() {
        let desk = Desk::default();
        let mut store = MemoryStore::seeded();
        let usd = BoxId::new("USD", "Efectivo");
        let bs = BoxId::new("BS", "Transferencia");

        let exchange = desk.exchange(&mut store, &usd, &bs, dec!(100), dec!(36.5)).unwrap();
        assert_eq!(exchange.purchase.amount(), dec!(100));
        assert_eq!(exchange.sale.amount(), dec!(-3650));
        assert_eq!(exchange.sale.kind(), MovementKind::Sale);

        let snapshot = store.read().unwrap();
        assert!(snapshot.transactions.is_empty());
        let balances = snapshot.cash_movements.balances_by_box();
        assert_eq!(balances.balance(&usd), dec!(100));
        assert_eq!(balances.balance(&bs), dec!(-3650));
    }

    #[test]
    fn test_exchange_rejects_unknown_box_without_writing() {
        let desk = Desk::default();
        let mut store = MemoryStore::seeded();
        let result = desk.exchange(
            &mut store,
            &BoxId::new("USD", "Efectivo"),
            &BoxId::new("BS", "Nowhere"),
            dec!(10),
            dec!(36.5),
        );
        assert!(matches!(
            result,
            Err(EngineError::Validation(ValidationError::MissingBox(_)))
        ));
        assert!(store.read().unwrap().cash_movements.is_empty());
    }

    #[test]
    fn test_exchange_rejects_bad_inputs() {
        let desk = Desk::default();
        let mut store = MemoryStore::seeded();
        let usd = BoxId::new("USD", "Efectivo");
        let bs = BoxId::new("BS", "Transferencia");
        assert!(desk.exchange(&mut store, &usd, &bs, Decimal::ZERO, dec!(36.5)).is_err());
        assert!(desk.exchange(&mut store, &usd, &bs, dec!(1), Decimal::ZERO).is_err());
    }

    #[test]
    fn test_adjustments() {
        let desk = Desk::default();
        let mut store = MemoryStore::seeded();
        let cash = BoxId::new("USD", "Efectivo");

        let injection = desk
            .adjust(&mut store, &cash, AdjustmentDirection::In, dec!(500), "")
            .unwrap();
        assert_eq!(injection.concept(), "Capital injection");
        assert_eq!(injection.kind(), MovementKind::AdjustmentIn);

        let rent = desk
            .adjust(&mut store, &cash, AdjustmentDirection::Out, dec!(120), "Rent")
            .unwrap();
        assert_eq!(rent.amount(), dec!(-120));

        let balances = desk.balances(&store).unwrap();
        assert_eq!(balances.balance(&cash), dec!(380));
    }

    #[test]
    fn test_adjustment_past_decimal_range_is_rejected() {
        let desk = Desk::default();
        let mut store = MemoryStore::seeded();
        let cash = BoxId::new("USD", "Efectivo");

        desk.adjust(&mut store, &cash, AdjustmentDirection::In, Decimal::MAX, "")
            .unwrap();
        let result = desk.adjust(&mut store, &cash, AdjustmentDirection::In, Decimal::MAX, "");
        assert!(matches!(
            result,
            Err(EngineError::Validation(ValidationError::Overflow("box balance")))
        ));

        let balances = desk.balances(&store).unwrap();
        assert_eq!(balances.balance(&cash), Decimal::MAX);
        assert!(desk.business_value(&store).is_ok());
    }

    #[test]
    fn test_exchange_past_decimal_range_is_rejected() {
        let desk = Desk::default();
        let mut store = MemoryStore::seeded();
        let usd = BoxId::new("USD", "Efectivo");
        let bs = BoxId::new("BS", "Transferencia");

        desk.adjust(&mut store, &usd, AdjustmentDirection::In, Decimal::MAX, "")
            .unwrap();
        let result = desk.exchange(&mut store, &usd, &bs, dec!(1), dec!(36.5));
        assert!(matches!(
            result,
            Err(EngineError::Validation(ValidationError::Overflow("box balance")))
        ));
        assert_eq!(store.read().unwrap().cash_movements.len(), 1);
    }
}
