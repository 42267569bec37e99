//! Error taxonomy shared by every engine operation.
//!
//! Validation errors and not-found results are raised before anything is
//! written, so a failed operation never leaves partial state behind.

use crate::core::client::ClientId;
use crate::core::currency::{BoxId, CurrencyCode};
use crate::rates::table::FxError;
use crate::store::StoreError;
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

/// Input the caller has to correct. Never retried automatically.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("client {0} is not registered")]
    MissingClient(ClientId),
    #[error("currency {0} is not configured")]
    MissingCurrency(CurrencyCode),
    #[error("cash box {0} does not exist")]
    MissingBox(BoxId),
    #[error("cash box {box_id} does not hold {currency}")]
    BoxCurrencyMismatch { box_id: BoxId, currency: CurrencyCode },
    #[error("{field} must be positive, got {amount}")]
    NonPositiveAmount { field: &'static str, amount: Decimal },
    #[error("no usable rate for {from} -> {to}")]
    UnresolvedRate { from: CurrencyCode, to: CurrencyCode },
    #[error("rate must be positive, got {0}")]
    NonPositiveRate(Decimal),
    #[error("commission {0}% is outside 0..=100")]
    CommissionOutOfRange(Decimal),
    #[error("commission of {0}% leaves nothing to convert")]
    DegenerateCommission(Decimal),
    #[error("a remittance on credit cannot also pay debt")]
    CreditWithDebtPayment,
    #[error("client {0} is already registered")]
    DuplicateClient(ClientId),
    #[error("currency {0} already exists")]
    DuplicateCurrency(CurrencyCode),
    #[error("cash box {0} already exists")]
    DuplicateBox(BoxId),
    #[error("{0} must not be empty")]
    EmptyField(&'static str),
    #[error("amount overflowed while computing {0}")]
    Overflow(&'static str),
    #[error(transparent)]
    Rate(FxError),
}

/// "No data" results that callers branch on.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NotFound {
    #[error("no rate for {from} -> {to}")]
    Rate { from: CurrencyCode, to: CurrencyCode },
    #[error("no client with national ID {0}")]
    Client(ClientId),
    #[error("no currency {0}")]
    Currency(CurrencyCode),
}

/// Broken invariants. These indicate corrupted state, not bad input.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConsistencyViolation {
    #[error("client {client} records debt {recorded} but movements replay to {replayed}")]
    DebtDiverges {
        client: ClientId,
        recorded: Decimal,
        replayed: Decimal,
    },
    #[error("movement {movement} references unknown box {box_id}")]
    UnknownBox { movement: Uuid, box_id: BoxId },
    #[error("debt movement {movement} references unknown client {client}")]
    UnknownClient { movement: Uuid, client: ClientId },
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    NotFound(#[from] NotFound),
    #[error(transparent)]
    Consistency(#[from] ConsistencyViolation),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<FxError> for EngineError {
    fn from(err: FxError) -> Self {
        match err {
            FxError::RateNotFound { from, to } => NotFound::Rate { from, to }.into(),
            other => ValidationError::Rate(other).into(),
        }
    }
}

impl EngineError {
    pub fn is_validation(&self) -> bool {
        matches!(self, EngineError::Validation(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, EngineError::NotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_miss_maps_to_not_found() {
        let err: EngineError = FxError::RateNotFound {
            from: CurrencyCode::new("USD"),
            to: CurrencyCode::new("EUR"),
        }
        .into();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_invalid_rate_maps_to_validation() {
        let err: EngineError = FxError::InvalidRate {
            from: CurrencyCode::new("USD"),
            to: CurrencyCode::new("BS"),
            rate: Decimal::ZERO,
        }
        .into();
        assert!(err.is_validation());
        assert_eq!(err.to_string(), "FX rate must be positive, got 0 for USD -> BS");
    }
}
