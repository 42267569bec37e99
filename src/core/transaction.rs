use crate::core::client::ClientId;
use crate::core::currency::{BoxId, CurrencyCode};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle state of a remittance. The engine only ever creates
/// `Completed` records; the other states exist for imported history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Completed,
    Pending,
    Cancelled,
}

/// The side of a remittance where the client hands money over.
///
/// `box_id` is `None` when the operation is extended on credit: nothing
/// physically enters a box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SendSide {
    pub amount: Decimal,
    pub currency: CurrencyCode,
    pub box_id: Option<BoxId>,
    pub commission_percent: Decimal,
}

impl SendSide {
    /// Box label for receipts; credit operations have no box.
    pub fn box_name(&self) -> &str {
        self.box_id.as_ref().map(|b| b.name.as_str()).unwrap_or("Credit")
    }
}

/// The side of a remittance where the beneficiary is paid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiveSide {
    pub amount: Decimal,
    pub currency: CurrencyCode,
    pub box_id: BoxId,
}

/// One remittance, frozen at creation time.
///
/// Cash and debt movements point back here through `id`, but they are
/// stored independently; the transaction does not own them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub client_id: ClientId,
    pub client_name: String,
    pub created_at: DateTime<Utc>,
    pub send: SendSide,
    pub receive: ReceiveSide,
    pub rate: Decimal,
    pub net_amount: Decimal,
    pub profit: Decimal,
    /// Always the send currency.
    pub profit_currency: CurrencyCode,
    pub notes: String,
    pub status: TransactionStatus,
    pub is_debt: bool,
    pub debt_payment_amount: Decimal,
}

impl Transaction {
    /// Short human reference used in movement concepts and receipts.
    pub fn reference(&self) -> String {
        short_reference(self.id)
    }

    /// Amount actually handed to the beneficiary after any debt payment.
    pub fn delivered_amount(&self) -> Decimal {
        self.receive.amount - self.debt_payment_amount
    }

    pub fn is_on(&self, date: NaiveDate) -> bool {
        self.created_at.date_naive() == date
    }
}

pub(crate) fn short_reference(id: Uuid) -> String {
    let simple = id.simple().to_string();
    format!("#{}", &simple[..8])
}
