use crate::error::ValidationError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Which side of the remittance the operator typed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "amount", rename_all = "snake_case")]
pub enum AmountInput {
    /// Forward mode: the client says how much they hand over.
    Send(Decimal),
    /// Reverse mode: the client says how much must be delivered.
    Receive(Decimal),
}

/// Fully derived amounts for one remittance.
///
/// `profit` is denominated in the send currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub input: AmountInput,
    pub rate: Decimal,
    pub commission_percent: Decimal,
    pub send_amount: Decimal,
    pub net_amount: Decimal,
    pub receive_amount: Decimal,
    pub profit: Decimal,
}

/// Debt repayment carved out of a remittance's receive amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebtSettlement {
    /// Amount applied against the client's debt.
    pub payment: Decimal,
    /// What is left for the beneficiary.
    pub delivered: Decimal,
}

/// Derives the missing amounts of a remittance from the one that is known.
///
/// Forward mode:
/// - `net = send * (1 - commission / 100)`
/// - `receive = net * rate`
///
/// Reverse mode:
/// - `net = receive / rate`
/// - `send = net / (1 - commission / 100)`
///
/// In both modes `profit = send * commission / 100`.
///
/// # Examples
///
/// ```
/// use remittance_engine::engine::calculator::{AmountInput, TransactionCalculator};
/// use rust_decimal_macros::dec;
///
/// let quote = TransactionCalculator::quote(AmountInput::Send(dec!(100)), dec!(36.5), dec!(5)).unwrap();
/// assert_eq!(quote.net_amount, dec!(95));
/// assert_eq!(quote.receive_amount, dec!(3467.5));
/// assert_eq!(quote.profit, dec!(5));
/// ```
pub struct TransactionCalculator;

impl TransactionCalculator {
    pub fn quote(
        input: AmountInput,
        rate: Decimal,
        commission_percent: Decimal,
    ) -> Result<Quote, ValidationError> {
        match input {
            AmountInput::Send(amount) => Self::forward(amount, rate, commission_percent),
            AmountInput::Receive(amount) => Self::reverse(amount, rate, commission_percent),
        }
    }

    pub fn forward(
        send_amount: Decimal,
        rate: Decimal,
        commission_percent: Decimal,
    ) -> Result<Quote, ValidationError> {
        check_rate(rate)?;
        check_commission(commission_percent)?;
        check_positive("send amount", send_amount)?;

        let kept = Decimal::ONE - commission_percent / HUNDRED;
        let net_amount = send_amount
            .checked_mul(kept)
            .ok_or(ValidationError::Overflow("net amount"))?;
        let receive_amount = net_amount
            .checked_mul(rate)
            .ok_or(ValidationError::Overflow("receive amount"))?;
        let profit = profit(send_amount, commission_percent)?;

        Ok(Quote {
            input: AmountInput::Send(send_amount),
            rate,
            commission_percent,
            send_amount,
            net_amount,
            receive_amount,
            profit,
        })
    }

    pub fn reverse(
        receive_amount: Decimal,
        rate: Decimal,
        commission_percent: Decimal,
    ) -> Result<Quote, ValidationError> {
        check_rate(rate)?;
        check_commission(commission_percent)?;
        if commission_percent == HUNDRED {
            return Err(ValidationError::DegenerateCommission(commission_percent));
        }
        check_positive("receive amount", receive_amount)?;

        let kept = Decimal::ONE - commission_percent / HUNDRED;
        let net_amount = receive_amount
            .checked_div(rate)
            .ok_or(ValidationError::Overflow("net amount"))?;
        let send_amount = net_amount
            .checked_div(kept)
            .ok_or(ValidationError::Overflow("send amount"))?;
        check_positive("send amount", send_amount)?;
        let profit = profit(send_amount, commission_percent)?;

        Ok(Quote {
            input: AmountInput::Receive(receive_amount),
            rate,
            commission_percent,
            send_amount,
            net_amount,
            receive_amount,
            profit,
        })
    }

    /// Split the receive amount between a debt payment and the beneficiary.
    ///
    /// The payment is capped to `[0, min(current_debt, receive_amount)]`
    /// so it can never push the debt below zero nor deliver a negative
    /// amount.
    pub fn settle_debt(receive_amount: Decimal, requested: Decimal, current_debt: Decimal) -> DebtSettlement {
        let payment = requested
            .min(current_debt)
            .min(receive_amount)
            .max(Decimal::ZERO);
        DebtSettlement {
            payment,
            delivered: receive_amount - payment,
        }
    }
}

fn profit(send_amount: Decimal, commission_percent: Decimal) -> Result<Decimal, ValidationError> {
    send_amount
        .checked_mul(commission_percent)
        .map(|v| v / HUNDRED)
        .ok_or(ValidationError::Overflow("profit"))
}

fn check_rate(rate: Decimal) -> Result<(), ValidationError> {
    if rate <= Decimal::ZERO {
        return Err(ValidationError::NonPositiveRate(rate));
    }
    Ok(())
}

fn check_commission(commission_percent: Decimal) -> Result<(), ValidationError> {
    if commission_percent < Decimal::ZERO || commission_percent > HUNDRED {
        return Err(ValidationError::CommissionOutOfRange(commission_percent));
    }
    Ok(())
}

fn check_positive(field: &'static str, amount: Decimal) -> Result<(), ValidationError> {
    if amount <= Decimal::ZERO {
        return Err(ValidationError::NonPositiveAmount { field, amount });
    }
    Ok(())
}
