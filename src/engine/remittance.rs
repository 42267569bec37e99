use crate::core::client::{Client, ClientId};
use crate::core::currency::{BoxId, CurrencyCode};
use crate::core::movement::{CashMovement, MovementKind};
use crate::core::transaction::{
    short_reference, ReceiveSide, SendSide, Transaction, TransactionStatus,
};
use crate::engine::calculator::{AmountInput, DebtSettlement, Quote, TransactionCalculator};
use crate::engine::debt::DebtSubledger;
use crate::engine::Desk;
use crate::error::{Result, ValidationError};
use crate::rates::resolver::RateResolver;
use crate::store::{Store, WriteBatch, WriteOp};
use chrono::Utc;
use log::{debug, info};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Everything the operator enters for one remittance.
///
/// # Examples
///
/// ```
/// use remittance_engine::core::currency::{BoxId, CurrencyCode};
/// use remittance_engine::engine::calculator::AmountInput;
/// use remittance_engine::engine::remittance::RemittanceOrder;
/// use rust_decimal_macros::dec;
///
/// let order = RemittanceOrder::new(
///     "V-123",
///     CurrencyCode::new("USD"),
///     BoxId::new("BS", "Pago Móvil"),
///     AmountInput::Send(dec!(100)),
/// )
/// .from_box("Zelle")
/// .paying_debt(dec!(10));
///
/// assert_eq!(order.send_box, Some(BoxId::new("USD", "Zelle")));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemittanceOrder {
    pub client_id: ClientId,
    pub send_currency: CurrencyCode,
    /// Box the client's money goes into. Not needed on credit.
    pub send_box: Option<BoxId>,
    pub receive_box: BoxId,
    pub amount: AmountInput,
    /// Overrides the send currency's default commission.
    pub commission_percent: Option<Decimal>,
    /// Overrides the resolved rate.
    pub rate: Option<Decimal>,
    /// Extend the send amount as credit instead of taking cash.
    pub on_credit: bool,
    /// Part of the receive amount to keep as payment of existing debt.
    pub debt_payment: Option<Decimal>,
    pub notes: String,
}

impl RemittanceOrder {
    pub fn new(
        client_id: impl Into<ClientId>,
        send_currency: CurrencyCode,
        receive_box: BoxId,
        amount: AmountInput,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            send_currency,
            send_box: None,
            receive_box,
            amount,
            commission_percent: None,
            rate: None,
            on_credit: false,
            debt_payment: None,
            notes: String::new(),
        }
    }

    /// Name of the box (in the send currency) that takes the client's cash.
    pub fn from_box(mut self, name: impl Into<String>) -> Self {
        self.send_box = Some(BoxId::new(self.send_currency.clone(), name));
        self
    }

    pub fn on_credit(mut self) -> Self {
        self.on_credit = true;
        self
    }

    pub fn paying_debt(mut self, amount: Decimal) -> Self {
        self.debt_payment = Some(amount);
        self
    }

    pub fn with_rate(mut self, rate: Decimal) -> Self {
        self.rate = Some(rate);
        self
    }

    pub fn with_commission(mut self, commission_percent: Decimal) -> Self {
        self.commission_percent = Some(commission_percent);
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }
}

/// What a remittance would do, computed without writing anything.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemittancePreview {
    pub quote: Quote,
    pub settlement: DebtSettlement,
    pub client_debt: Decimal,
}

/// A validated remittance ready to commit.
struct Plan {
    transaction: Transaction,
    preview: RemittancePreview,
    batch: WriteBatch,
}

impl Desk {
    /// Compute a remittance without persisting it.
    pub fn preview_remittance<S: Store>(&self, store: &S, order: &RemittanceOrder) -> Result<RemittancePreview> {
        Ok(self.plan_remittance(store, order)?.preview)
    }

    /// Validate, compute and record a remittance.
    ///
    /// The transaction, its cash legs, any debt movements and the client's
    /// new debt are committed as one batch. Validation happens first, so a
    /// rejected order writes nothing.
    pub fn execute_remittance<S: Store>(&self, store: &mut S, order: &RemittanceOrder) -> Result<Transaction> {
        let plan = self.plan_remittance(&*store, order)?;
        store.commit(plan.batch)?;

        let tx = plan.transaction;
        info!(
            "remittance {} for {}: {} {} -> {} {} (profit {} {})",
            tx.reference(),
            tx.client_id,
            tx.send.amount,
            tx.send.currency,
            tx.delivered_amount(),
            tx.receive.currency,
            tx.profit,
            tx.profit_currency
        );
        Ok(tx)
    }

    /// Post a signed debt change outside a remittance, e.g. cash paid at
    /// the counter or a manual correction.
    pub fn apply_debt_delta<S: Store>(
        &self,
        store: &mut S,
        client_id: &ClientId,
        amount: Decimal,
        currency: &CurrencyCode,
        concept: &str,
        transaction_id: Option<Uuid>,
    ) -> Result<Client> {
        if amount.is_zero() {
            return Err(ValidationError::NonPositiveAmount {
                field: "debt change",
                amount,
            }
            .into());
        }
        if store.currency(currency)?.is_none() {
            return Err(ValidationError::MissingCurrency(currency.clone()).into());
        }
        let client = self.find_client(&*store, client_id)?;
        let posting = DebtSubledger::apply_debt_delta(&client, amount, currency, concept, transaction_id)?;

        let mut batch = WriteBatch::new();
        batch
            .push(WriteOp::AppendDebtMovement(posting.movement))
            .push(WriteOp::UpdateClient(posting.client.clone()));
        store.commit(batch)?;

        info!(
            "debt of {} changed by {} {}: now {}",
            client.id, amount, currency, posting.client.debt
        );
        Ok(posting.client)
    }

    fn plan_remittance<S: Store>(&self, store: &S, order: &RemittanceOrder) -> Result<Plan> {
        if order.on_credit && order.debt_payment.is_some() {
            return Err(ValidationError::CreditWithDebtPayment.into());
        }
        let client = store
            .client(&order.client_id)?
            .ok_or_else(|| ValidationError::MissingClient(order.client_id.clone()))?;
        let send_currency = store
            .currency(&order.send_currency)?
            .ok_or_else(|| ValidationError::MissingCurrency(order.send_currency.clone()))?;
        let receive_currency = order.receive_box.currency.clone();
        if store.currency(&receive_currency)?.is_none() {
            return Err(ValidationError::MissingCurrency(receive_currency).into());
        }
        self.require_box(store, &order.receive_box)?;

        let send_box = if order.on_credit {
            None
        } else {
            let box_id = order
                .send_box
                .clone()
                .ok_or(ValidationError::EmptyField("send box"))?;
            if box_id.currency != send_currency.symbol {
                return Err(ValidationError::BoxCurrencyMismatch {
                    box_id,
                    currency: send_currency.symbol.clone(),
                }
                .into());
            }
            self.require_box(store, &box_id)?;
            Some(box_id)
        };

        let rate = match order.rate {
            Some(rate) => rate,
            None => {
                let table = self.rate_table(store)?;
                RateResolver::new(&table)
                    .resolve(&send_currency.symbol, &receive_currency)
                    .map_err(|_| ValidationError::UnresolvedRate {
                        from: send_currency.symbol.clone(),
                        to: receive_currency.clone(),
                    })?
            }
        };
        let commission = order
            .commission_percent
            .unwrap_or(send_currency.commission_percent);

        let quote = TransactionCalculator::quote(order.amount, rate, commission)?;
        let settlement = TransactionCalculator::settle_debt(
            quote.receive_amount,
            order.debt_payment.unwrap_or(Decimal::ZERO),
            client.debt,
        );
        debug!("quote for {}: {:?}, {:?}", client.id, quote, settlement);

        let id = Uuid::new_v4();
        let reference = short_reference(id);
        let transaction = Transaction {
            id,
            client_id: client.id.clone(),
            client_name: client.name.clone(),
            created_at: Utc::now(),
            send: SendSide {
                amount: quote.send_amount,
                currency: send_currency.symbol.clone(),
                box_id: send_box.clone(),
                commission_percent: commission,
            },
            receive: ReceiveSide {
                amount: quote.receive_amount,
                currency: receive_currency,
                box_id: order.receive_box.clone(),
            },
            rate,
            net_amount: quote.net_amount,
            profit: quote.profit,
            profit_currency: send_currency.symbol.clone(),
            notes: order.notes.clone(),
            status: TransactionStatus::Completed,
            is_debt: order.on_credit,
            debt_payment_amount: settlement.payment,
        };

        let send_leg = send_box.map(|box_id| {
            CashMovement::new(
                box_id,
                quote.send_amount,
                MovementKind::RemittanceIn,
                format!("Remittance {} - in", reference),
            )
            .with_transaction(id)
        });
        let receive_leg = CashMovement::new(
            order.receive_box.clone(),
            -settlement.delivered,
            MovementKind::RemittanceOut,
            format!("Remittance {} - out", reference),
        )
        .with_transaction(id);
        self.check_headroom(store, send_leg.iter().chain([&receive_leg]))?;

        let mut batch = WriteBatch::new();
        batch.push(WriteOp::InsertTransaction(transaction.clone()));
        if let Some(leg) = send_leg {
            batch.push(WriteOp::AppendMovement(leg));
        }
        batch.push(WriteOp::AppendMovement(receive_leg));

        let mut debtor = client.clone();
        if order.on_credit {
            let posting = DebtSubledger::apply_debt_delta(
                &debtor,
                quote.send_amount,
                &send_currency.symbol,
                format!("Remittance {} - credit extended", reference),
                Some(id),
            )?;
            batch.push(WriteOp::AppendDebtMovement(posting.movement));
            debtor = posting.client;
        }
        if settlement.payment > Decimal::ZERO {
            let posting = DebtSubledger::apply_debt_delta(
                &debtor,
                -settlement.payment,
                &send_currency.symbol,
                format!("Remittance {} - debt payment", reference),
                Some(id),
            )?;
            batch.push(WriteOp::AppendDebtMovement(posting.movement));
            debtor = posting.client;
        }
        if debtor != client {
            batch.push(WriteOp::UpdateClient(debtor));
        }

        Ok(Plan {
            transaction,
            preview: RemittancePreview {
                quote,
                settlement,
                client_debt: client.debt,
            },
            batch,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::inventory::AdjustmentDirection;
    use crate::error::EngineError;
    use crate::store::MemoryStore;
    use rust_decimal_macros::dec;

    fn desk_with_client() -> (Desk, MemoryStore) {
        let desk = Desk::default();
        let mut store = MemoryStore::seeded();
        desk.register_client(&mut store, "V-123", "Ana", "0412").unwrap();
        (desk, store)
    }

    fn usd_to_bs(amount: AmountInput) -> RemittanceOrder {
        RemittanceOrder::new(
            "V-123",
            CurrencyCode::new("USD"),
            BoxId::new("BS", "Efectivo"),
            amount,
        )
        .from_box("Zelle")
        .with_commission(dec!(5))
    }

    #[test]
    fn test_forward_remittance_posts_both_legs() {
        let (desk, mut store) = desk_with_client();
        let tx = desk
            .execute_remittance(&mut store, &usd_to_bs(AmountInput::Send(dec!(100))))
            .unwrap();

        assert_eq!(tx.rate, dec!(36.5));
        assert_eq!(tx.receive.amount, dec!(3467.5));
        assert_eq!(tx.profit, dec!(5));
        assert_eq!(tx.profit_currency, CurrencyCode::new("USD"));

        let snapshot = store.read().unwrap();
        assert_eq!(snapshot.transactions.len(), 1);
        let legs = snapshot.cash_movements.for_transaction(tx.id);
        assert_eq!(legs.len(), 2);

        let balances = snapshot.cash_movements.balances_by_box();
        assert_eq!(balances.balance(&BoxId::new("USD", "Zelle")), dec!(100));
        assert_eq!(balances.balance(&BoxId::new("BS", "Efectivo")), dec!(-3467.5));
    }

    #[test]
    fn test_reverse_remittance() {
        let (desk, mut store) = desk_with_client();
        let tx = desk
            .execute_remittance(&mut store, &usd_to_bs(AmountInput::Receive(dec!(3467.5))))
            .unwrap();
        assert_eq!(tx.send.amount, dec!(100));
        assert_eq!(tx.net_amount, dec!(95));
    }

    #[test]
    fn test_default_commission_comes_from_currency() {
        let (desk, mut store) = desk_with_client();
        let order = RemittanceOrder::new(
            "V-123",
            CurrencyCode::new("BS"),
            BoxId::new("USD", "Efectivo"),
            AmountInput::Send(dec!(3650)),
        )
        .from_box("Pago Móvil");
        let tx = desk.execute_remittance(&mut store, &order).unwrap();

        assert_eq!(tx.send.commission_percent, dec!(6));
        assert_eq!(tx.profit, dec!(219));
        assert_eq!(tx.profit_currency, CurrencyCode::new("BS"));
    }

    #[test]
    fn test_manual_rate_overrides_table() {
        let (desk, mut store) = desk_with_client();
        let order = usd_to_bs(AmountInput::Send(dec!(10))).with_rate(dec!(40));
        let tx = desk.execute_remittance(&mut store, &order).unwrap();
        assert_eq!(tx.rate, dec!(40));
        assert_eq!(tx.receive.amount, dec!(380));
    }

    #[test]
    fn test_missing_send_box_rejected() {
        let (desk, mut store) = desk_with_client();
        let order = RemittanceOrder::new(
            "V-123",
            CurrencyCode::new("USD"),
            BoxId::new("BS", "Efectivo"),
            AmountInput::Send(dec!(100)),
        );
        let result = desk.execute_remittance(&mut store, &order);
        assert!(matches!(
            result,
            Err(EngineError::Validation(ValidationError::EmptyField("send box")))
        ));
        assert!(store.read().unwrap().transactions.is_empty());
    }

    #[test]
    fn test_unknown_client_rejected() {
        let desk = Desk::default();
        let mut store = MemoryStore::seeded();
        let result = desk.execute_remittance(&mut store, &usd_to_bs(AmountInput::Send(dec!(1))));
        assert!(matches!(
            result,
            Err(EngineError::Validation(ValidationError::MissingClient(_)))
        ));
    }

    #[test]
    fn test_send_box_in_wrong_currency_rejected() {
        let (desk, mut store) = desk_with_client();
        let mut order = usd_to_bs(AmountInput::Send(dec!(10)));
        order.send_box = Some(BoxId::new("BS", "Pago Móvil"));
        let result = desk.execute_remittance(&mut store, &order);
        assert!(matches!(
            result,
            Err(EngineError::Validation(ValidationError::BoxCurrencyMismatch { .. }))
        ));
    }

    #[test]
    fn test_debt_payment_reduces_delivery() {
        let (desk, mut store) = desk_with_client();
        let id = ClientId::new("V-123");
        desk.apply_debt_delta(&mut store, &id, dec!(80), &CurrencyCode::new("USD"), "credit", None)
            .unwrap();

        let order = usd_to_bs(AmountInput::Send(dec!(100))).paying_debt(dec!(50));
        let tx = desk.execute_remittance(&mut store, &order).unwrap();

        assert_eq!(tx.debt_payment_amount, dec!(50));
        assert_eq!(tx.delivered_amount(), dec!(3417.5));
        let client = desk.find_client(&store, &id).unwrap();
        assert_eq!(client.debt, dec!(30));

        let balances = desk.balances(&store).unwrap();
        assert_eq!(balances.balance(&BoxId::new("BS", "Efectivo")), dec!(-3417.5));
    }

    #[test]
    fn test_debt_payment_capped_at_current_debt() {
        let (desk, mut store) = desk_with_client();
        let id = ClientId::new("V-123");
        desk.apply_debt_delta(&mut store, &id, dec!(20), &CurrencyCode::new("USD"), "credit", None)
            .unwrap();

        let order = usd_to_bs(AmountInput::Send(dec!(100))).paying_debt(dec!(500));
        let tx = desk.execute_remittance(&mut store, &order).unwrap();
        assert_eq!(tx.debt_payment_amount, dec!(20));
        assert_eq!(desk.find_client(&store, &id).unwrap().debt, Decimal::ZERO);
        assert!(desk.verify_debt(&store, &id).is_ok());
    }

    #[test]
    fn test_preview_writes_nothing() {
        let (desk, store) = desk_with_client();
        let preview = desk
            .preview_remittance(&store, &usd_to_bs(AmountInput::Send(dec!(100))))
            .unwrap();
        assert_eq!(preview.quote.receive_amount, dec!(3467.5));
        assert_eq!(preview.settlement.delivered, dec!(3467.5));
        assert!(store.read().unwrap().transactions.is_empty());
    }

    #[test]
    fn test_credit_order_cannot_pay_debt() {
        let (desk, mut store) = desk_with_client();
        let id = ClientId::new("V-123");
        desk.apply_debt_delta(&mut store, &id, dec!(40), &CurrencyCode::new("USD"), "credit", None)
            .unwrap();

        let order = usd_to_bs(AmountInput::Send(dec!(100)))
            .on_credit()
            .paying_debt(dec!(10));
        let result = desk.execute_remittance(&mut store, &order);
        assert!(matches!(
            result,
            Err(EngineError::Validation(ValidationError::CreditWithDebtPayment))
        ));

        let snapshot = store.read().unwrap();
        assert!(snapshot.transactions.is_empty());
        assert!(snapshot.cash_movements.is_empty());
        assert_eq!(desk.find_client(&store, &id).unwrap().debt, dec!(40));
    }

    #[test]
    fn test_standalone_debt_overflow_is_rejected() {
        let (desk, mut store) = desk_with_client();
        let id = ClientId::new("V-123");
        let usd = CurrencyCode::new("USD");
        desk.apply_debt_delta(&mut store, &id, Decimal::MAX, &usd, "credit", None)
            .unwrap();

        let result = desk.apply_debt_delta(&mut store, &id, Decimal::MAX, &usd, "credit", None);
        assert!(matches!(
            result,
            Err(EngineError::Validation(ValidationError::Overflow("client debt")))
        ));
        assert_eq!(desk.find_client(&store, &id).unwrap().debt, Decimal::MAX);
        assert_eq!(store.debt_movements(&id).unwrap().len(), 1);
        assert!(desk.verify_debt(&store, &id).is_ok());
    }

    #[test]
    fn test_remittance_into_full_box_is_rejected() {
        let (desk, mut store) = desk_with_client();
        let zelle = BoxId::new("USD", "Zelle");
        desk.adjust(&mut store, &zelle, AdjustmentDirection::In, Decimal::MAX, "")
            .unwrap();

        let result = desk.execute_remittance(&mut store, &usd_to_bs(AmountInput::Send(dec!(100))));
        assert!(matches!(
            result,
            Err(EngineError::Validation(ValidationError::Overflow("box balance")))
        ));
        assert!(store.read().unwrap().transactions.is_empty());
    }
}
