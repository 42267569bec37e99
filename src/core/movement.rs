use crate::core::client::ClientId;
use crate::core::currency::{BoxId, CurrencyCode};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What produced a cash movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementKind {
    /// Money received from a client for a remittance.
    RemittanceIn,
    /// Money delivered to a beneficiary.
    RemittanceOut,
    /// Currency bought into a box.
    Purchase,
    /// Currency sold out of a box to pay for a purchase.
    Sale,
    /// Capital injected by hand.
    AdjustmentIn,
    /// Expense or withdrawal taken by hand.
    AdjustmentOut,
}

impl MovementKind {
    /// Whether movements of this kind carry a positive amount.
    pub fn is_inflow(self) -> bool {
        matches!(
            self,
            MovementKind::RemittanceIn | MovementKind::Purchase | MovementKind::AdjustmentIn
        )
    }
}

/// An immutable signed entry against one cash box.
///
/// Positive amounts flow into the box, negative amounts flow out. Box
/// balances exist only as the sum of these entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashMovement {
    id: Uuid,
    box_id: BoxId,
    amount: Decimal,
    concept: String,
    kind: MovementKind,
    transaction_id: Option<Uuid>,
    created_at: DateTime<Utc>,
}

impl CashMovement {
    pub fn new(box_id: BoxId, amount: Decimal, kind: MovementKind, concept: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            box_id,
            amount,
            concept: concept.into(),
            kind,
            transaction_id: None,
            created_at: Utc::now(),
        }
    }

    /// Link the movement back to the transaction that produced it.
    pub fn with_transaction(mut self, transaction_id: Uuid) -> Self {
        self.transaction_id = Some(transaction_id);
        self
    }

    /// Override the timestamp (imports, tests).
    pub fn with_timestamp(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = at;
        self
    }

    // --- Accessors ---

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn box_id(&self) -> &BoxId {
        &self.box_id
    }

    pub fn currency(&self) -> &CurrencyCode {
        &self.box_id.currency
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn concept(&self) -> &str {
        &self.concept
    }

    pub fn kind(&self) -> MovementKind {
        self.kind
    }

    pub fn transaction_id(&self) -> Option<Uuid> {
        self.transaction_id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// An immutable signed entry against one client's debt.
///
/// Positive amounts extend credit, negative amounts record payments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebtMovement {
    id: Uuid,
    client_id: ClientId,
    amount: Decimal,
    currency: CurrencyCode,
    concept: String,
    transaction_id: Option<Uuid>,
    created_at: DateTime<Utc>,
}

impl DebtMovement {
    pub fn new(
        client_id: ClientId,
        amount: Decimal,
        currency: CurrencyCode,
        concept: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            client_id,
            amount,
            currency,
            concept: concept.into(),
            transaction_id: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_transaction(mut self, transaction_id: Uuid) -> Self {
        self.transaction_id = Some(transaction_id);
        self
    }

    pub fn with_timestamp(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = at;
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn client_id(&self) -> &ClientId {
        &self.client_id
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn currency(&self) -> &CurrencyCode {
        &self.currency
    }

    pub fn concept(&self) -> &str {
        &self.concept
    }

    pub fn transaction_id(&self) -> Option<Uuid> {
        self.transaction_id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn is_payment(&self) -> bool {
        self.amount < Decimal::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_movement_creation() {
        let tx = Uuid::new_v4();
        let mv = CashMovement::new(
            BoxId::new("USD", "Zelle"),
            dec!(100),
            MovementKind::RemittanceIn,
            "Remittance in",
        )
        .with_transaction(tx);

        assert_eq!(mv.currency().as_str(), "USD");
        assert_eq!(mv.amount(), dec!(100));
        assert_eq!(mv.transaction_id(), Some(tx));
        assert!(mv.kind().is_inflow());
    }

    #[test]
    fn test_outflow_kinds() {
        assert!(!MovementKind::RemittanceOut.is_inflow());
        assert!(!MovementKind::Sale.is_inflow());
        assert!(!MovementKind::AdjustmentOut.is_inflow());
    }

    #[test]
    fn test_movement_kind_serializes_snake_case() {
        let json = serde_json::to_string(&MovementKind::RemittanceOut).unwrap();
        assert_eq!(json, "\"remittance_out\"");
    }

    #[test]
    fn test_debt_movement_payment() {
        let mv = DebtMovement::new(
            ClientId::new("V-123"),
            dec!(-20),
            CurrencyCode::new("USD"),
            "Payment",
        );
        assert!(mv.is_payment());
    }
}
