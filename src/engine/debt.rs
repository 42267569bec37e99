use crate::core::client::Client;
use crate::core::currency::CurrencyCode;
use crate::core::movement::DebtMovement;
use crate::error::{ConsistencyViolation, ValidationError};
use log::warn;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The two records a debt change produces. They must be committed in the
/// same batch.
#[derive(Debug, Clone, PartialEq)]
pub struct DebtPosting {
    pub client: Client,
    pub movement: DebtMovement,
}

/// A client's debt history with the balance it replays to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientStatement {
    pub client: Client,
    pub movements: Vec<DebtMovement>,
    /// Plain sum of movement amounts. Differs from `client.debt` after an
    /// overpayment was clamped.
    pub movement_sum: Decimal,
}

/// Keeps each client's `debt` field and debt movement log in step.
pub struct DebtSubledger;

impl DebtSubledger {
    /// Build the updated client and the movement for a signed debt change.
    ///
    /// Debt is clamped at zero: a payment larger than the outstanding debt
    /// zeroes it and the movement keeps the full amount, so the log then
    /// sums below the field. The currency is only updated when credit is
    /// extended. A change that would push the debt past the `Decimal`
    /// range is rejected.
    pub fn apply_debt_delta(
        client: &Client,
        amount: Decimal,
        currency: &CurrencyCode,
        concept: impl Into<String>,
        transaction_id: Option<Uuid>,
    ) -> Result<DebtPosting, ValidationError> {
        let raw = client
            .debt
            .checked_add(amount)
            .ok_or(ValidationError::Overflow("client debt"))?;
        let mut updated = client.clone();
        if raw < Decimal::ZERO {
            warn!(
                "debt of client {} clamped at zero: {} + ({}) = {}",
                client.id, client.debt, amount, raw
            );
        }
        updated.debt = raw.max(Decimal::ZERO);
        if amount > Decimal::ZERO {
            updated.debt_currency = currency.clone();
        }

        let mut movement = DebtMovement::new(client.id.clone(), amount, currency.clone(), concept);
        if let Some(id) = transaction_id {
            movement = movement.with_transaction(id);
        }

        Ok(DebtPosting {
            client: updated,
            movement,
        })
    }

    /// Debt obtained by applying movements in order with the zero clamp.
    pub fn replay<'a>(movements: impl IntoIterator<Item = &'a DebtMovement>) -> Decimal {
        movements
            .into_iter()
            .fold(Decimal::ZERO, |debt, m| debt.saturating_add(m.amount()).max(Decimal::ZERO))
    }

    /// Check that the recorded debt matches its movement history.
    pub fn verify<'a>(
        client: &Client,
        movements: impl IntoIterator<Item = &'a DebtMovement>,
    ) -> Result<(), ConsistencyViolation> {
        let replayed = Self::replay(movements);
        if replayed != client.debt {
            return Err(ConsistencyViolation::DebtDiverges {
                client: client.id.clone(),
                recorded: client.debt,
                replayed,
            });
        }
        Ok(())
    }

    pub fn statement(client: Client, movements: Vec<DebtMovement>) -> ClientStatement {
        let movement_sum = movements
            .iter()
            .fold(Decimal::ZERO, |sum, m| sum.saturating_add(m.amount()));
        ClientStatement {
            client,
            movements,
            movement_sum,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::client::ClientId;
    use rust_decimal_macros::dec;

    fn client() -> Client {
        Client::new(ClientId::new("V-123"), "Ana", "", CurrencyCode::new("USD"))
    }

    #[test]
    fn test_credit_then_partial_payment() {
        let usd = CurrencyCode::new("USD");
        let credit = DebtSubledger::apply_debt_delta(&client(), dec!(50), &usd, "credit", None).unwrap();
        assert_eq!(credit.client.debt, dec!(50));

        let payment =
            DebtSubledger::apply_debt_delta(&credit.client, dec!(-20), &usd, "payment", None).unwrap();
        assert_eq!(payment.client.debt, dec!(30));

        let log = [credit.movement, payment.movement];
        assert_eq!(DebtSubledger::replay(&log), dec!(30));
        assert!(DebtSubledger::verify(&payment.client, &log).is_ok());
    }

    #[test]
    fn test_overpayment_clamps_and_diverges_from_sum() {
        let usd = CurrencyCode::new("USD");
        let credit = DebtSubledger::apply_debt_delta(&client(), dec!(50), &usd, "credit", None).unwrap();
        let payment =
            DebtSubledger::apply_debt_delta(&credit.client, dec!(-80), &usd, "payment", None).unwrap();

        assert_eq!(payment.client.debt, Decimal::ZERO);
        let log = vec![credit.movement, payment.movement];
        let statement = DebtSubledger::statement(payment.client.clone(), log.clone());
        assert_eq!(statement.movement_sum, dec!(-30));

        // The clamp-aware replay still agrees with the field.
        assert!(DebtSubledger::verify(&payment.client, &log).is_ok());
    }

    #[test]
    fn test_payment_keeps_debt_currency() {
        let bs = CurrencyCode::new("BS");
        let credit = DebtSubledger::apply_debt_delta(&client(), dec!(3650), &bs, "credit", None).unwrap();
        assert_eq!(credit.client.debt_currency, bs);

        let usd = CurrencyCode::new("USD");
        let payment = DebtSubledger::apply_debt_delta(&credit.client, dec!(-10), &usd, "payment", None).unwrap();
        assert_eq!(payment.client.debt_currency, bs);
    }

    #[test]
    fn test_transaction_link() {
        let tx = Uuid::new_v4();
        let usd = CurrencyCode::new("USD");
        let posting = DebtSubledger::apply_debt_delta(&client(), dec!(5), &usd, "credit", Some(tx)).unwrap();
        assert_eq!(posting.movement.transaction_id(), Some(tx));
    }

    #[test]
    fn test_verify_detects_divergence() {
        let mut tampered = client();
        tampered.debt = dec!(10);
        let result = DebtSubledger::verify(&tampered, &Vec::<DebtMovement>::new());
        assert!(matches!(
            result,
            Err(ConsistencyViolation::DebtDiverges { .. })
        ));
    }

    #[test]
    fn test_debt_overflow_is_rejected() {
        let usd = CurrencyCode::new("USD");
        let first = DebtSubledger::apply_debt_delta(&client(), Decimal::MAX, &usd, "credit", None)
            .unwrap();
        assert_eq!(first.client.debt, Decimal::MAX);

        let second = DebtSubledger::apply_debt_delta(&first.client, Decimal::MAX, &usd, "credit", None);
        assert!(matches!(second, Err(ValidationError::Overflow("client debt"))));
    }
}
