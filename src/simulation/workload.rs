//! Random but valid desk activity.
//!
//! Drives a [`Desk`] through a mix of remittances, credit, debt payments,
//! exchanges and adjustments so that reports, invariants and performance
//! can be checked against realistic histories.

use crate::core::client::ClientId;
use crate::core::currency::{BoxId, CurrencyCode};
use crate::engine::calculator::AmountInput;
use crate::engine::inventory::AdjustmentDirection;
use crate::engine::remittance::RemittanceOrder;
use crate::engine::Desk;
use crate::error::{EngineError, Result};
use crate::rates::resolver::RateResolver;
use crate::store::Store;
use log::debug;
use rand::seq::SliceRandom;
use rand::Rng;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;

/// Shape of a generated workload.
#[derive(Debug, Clone)]
pub struct WorkloadConfig {
    /// Number of clients registered before the run.
    pub clients: usize,
    /// Number of operations attempted.
    pub operations: usize,
    /// Minimum amount typed by the operator.
    pub min_amount: Decimal,
    /// Maximum amount typed by the operator.
    pub max_amount: Decimal,
    /// Share of remittances extended on credit.
    pub credit_ratio: f64,
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        Self {
            clients: 10,
            operations: 100,
            min_amount: Decimal::from(5),
            max_amount: Decimal::from(500),
            credit_ratio: 0.15,
        }
    }
}

/// What a run actually did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WorkloadReport {
    pub remittances: usize,
    pub credits: usize,
    pub debt_payments: usize,
    pub exchanges: usize,
    pub adjustments: usize,
    /// Operations the desk refused with a validation error.
    pub rejected: usize,
}

impl WorkloadReport {
    pub fn total(&self) -> usize {
        self.remittances + self.credits + self.debt_payments + self.exchanges + self.adjustments
    }
}

/// Register the configured clients and run random operations against
/// `store`. Validation failures are counted, anything else aborts.
pub fn run_workload<S: Store, R: Rng + ?Sized>(
    desk: &Desk,
    store: &mut S,
    config: &WorkloadConfig,
    rng: &mut R,
) -> Result<WorkloadReport> {
    let clients: Vec<ClientId> = (0..config.clients)
        .map(|i| ClientId::new(format!("V-{:05}", i)))
        .collect();
    for (i, id) in clients.iter().enumerate() {
        if store.client(id)?.is_none() {
            desk.register_client(store, id.as_str(), &format!("Client {}", i), "")?;
        }
    }

    let boxes: Vec<BoxId> = store.read()?.cash_boxes.into_iter().map(|b| b.id).collect();
    let mut report = WorkloadReport::default();
    if clients.is_empty() || boxes.len() < 2 {
        return Ok(report);
    }

    for _ in 0..config.operations {
        let amount = random_amount(rng, config);
        let outcome = match rng.gen_range(0..10) {
            0..=5 => {
                let client = pick(rng, &clients);
                let on_credit = rng.gen_bool(config.credit_ratio.clamp(0.0, 1.0));
                remit(desk, store, rng, &boxes, client, amount, on_credit, None).map(|()| {
                    if on_credit {
                        report.credits += 1;
                    } else {
                        report.remittances += 1;
                    }
                })
            }
            6 => {
                let client = pick(rng, &clients);
                let debt = desk.find_client(&*store, client)?.debt;
                if debt.is_zero() {
                    continue;
                }
                let payment = (debt * Decimal::from(rng.gen_range(1..=10)) / Decimal::TEN).round_dp(2);
                remit(desk, store, rng, &boxes, client, amount, false, Some(payment))
                    .map(|()| report.debt_payments += 1)
            }
            7 => {
                let buy = pick(rng, &boxes).clone();
                let Some(sell) = other_currency_box(rng, &boxes, &buy.currency) else {
                    continue;
                };
                let rate = desk
                    .rate_table(&*store)
                    .ok()
                    .and_then(|table| {
                        RateResolver::new(&table)
                            .resolve(&buy.currency, &sell.currency)
                            .ok()
                    })
                    .unwrap_or(Decimal::ONE);
                desk.exchange(store, &buy, &sell, amount, rate)
                    .map(|_| report.exchanges += 1)
            }
            _ => {
                let box_id = pick(rng, &boxes);
                let direction = if rng.gen_bool(0.7) {
                    AdjustmentDirection::In
                } else {
                    AdjustmentDirection::Out
                };
                desk.adjust(store, box_id, direction, amount, "")
                    .map(|_| report.adjustments += 1)
            }
        };

        match outcome {
            Ok(()) => {}
            Err(EngineError::Validation(err)) => {
                debug!("workload operation rejected: {}", err);
                report.rejected += 1;
            }
            Err(err) => return Err(err),
        }
    }

    Ok(report)
}

#[allow(clippy::too_many_arguments)]
fn remit<S: Store, R: Rng + ?Sized>(
    desk: &Desk,
    store: &mut S,
    rng: &mut R,
    boxes: &[BoxId],
    client: &ClientId,
    amount: Decimal,
    on_credit: bool,
    debt_payment: Option<Decimal>,
) -> Result<()> {
    let send_box = pick(rng, boxes).clone();
    let Some(receive_box) = other_currency_box(rng, boxes, &send_box.currency) else {
        return Ok(());
    };
    let input = if rng.gen_bool(0.5) {
        AmountInput::Send(amount)
    } else {
        AmountInput::Receive(amount)
    };

    let mut order = RemittanceOrder::new(client.clone(), send_box.currency.clone(), receive_box, input);
    order = if on_credit {
        order.on_credit()
    } else {
        order.from_box(send_box.name)
    };
    if let Some(payment) = debt_payment {
        order = order.paying_debt(payment);
    }
    desk.execute_remittance(store, &order)?;
    Ok(())
}

fn pick<'a, T, R: Rng + ?Sized>(rng: &mut R, items: &'a [T]) -> &'a T {
    // Callers check for emptiness first.
    &items[rng.gen_range(0..items.len())]
}

fn other_currency_box<R: Rng + ?Sized>(
    rng: &mut R,
    boxes: &[BoxId],
    currency: &CurrencyCode,
) -> Option<BoxId> {
    let candidates: Vec<&BoxId> = boxes.iter().filter(|b| &b.currency != currency).collect();
    candidates.choose(rng).map(|b| (*b).clone())
}

fn random_amount<R: Rng + ?Sized>(rng: &mut R, config: &WorkloadConfig) -> Decimal {
    let min_cents = (config.min_amount * Decimal::ONE_HUNDRED).to_i64().unwrap_or(100).max(1);
    let max_cents = (config.max_amount * Decimal::ONE_HUNDRED)
        .to_i64()
        .unwrap_or(100_000)
        .max(min_cents + 1);
    Decimal::new(rng.gen_range(min_cents..max_cents), 2)
}
