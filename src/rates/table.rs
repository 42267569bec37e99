use crate::core::currency::CurrencyCode;
use chrono::{DateTime, Utc};
use log::{debug, warn};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Errors arising from FX rate operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FxError {
    #[error("no FX rate available for {from} -> {to}")]
    RateNotFound {
        from: CurrencyCode,
        to: CurrencyCode,
    },
    #[error("FX rate must be positive, got {rate} for {from} -> {to}")]
    InvalidRate {
        from: CurrencyCode,
        to: CurrencyCode,
        rate: Decimal,
    },
    #[error("rate {from} -> {to} is not anchored at pivot {pivot}")]
    NotPivotAnchored {
        from: CurrencyCode,
        to: CurrencyCode,
        pivot: CurrencyCode,
    },
}

/// A stored, directed rate edge: 1 unit of `from` buys `rate` units of `to`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeRate {
    pub from: CurrencyCode,
    pub to: CurrencyCode,
    pub rate: Decimal,
    pub updated_at: DateTime<Utc>,
}

impl ExchangeRate {
    pub fn new(from: CurrencyCode, to: CurrencyCode, rate: Decimal) -> Self {
        Self {
            from,
            to,
            rate,
            updated_at: Utc::now(),
        }
    }
}

/// Rate edges anchored at the pivot currency.
///
/// Only `pivot -> X` edges are kept. Every other pair is derived at read
/// time by the resolver.
///
/// # Examples
///
/// ```
/// use remittance_engine::core::currency::CurrencyCode;
/// use remittance_engine::rates::table::RateTable;
/// use rust_decimal_macros::dec;
///
/// let mut rates = RateTable::new(CurrencyCode::new("USD"));
/// rates.set_rate(CurrencyCode::new("BS"), dec!(36.5)).unwrap();
///
/// assert_eq!(rates.pivot_rate(&CurrencyCode::new("BS")), Some(dec!(36.5)));
/// ```
#[derive(Debug, Clone)]
pub struct RateTable {
    pivot: CurrencyCode,
    /// to -> edge pivot->to
    edges: HashMap<CurrencyCode, ExchangeRate>,
}

impl RateTable {
    pub fn new(pivot: CurrencyCode) -> Self {
        Self {
            pivot,
            edges: HashMap::new(),
        }
    }

    /// Build a table from stored edges. Edges that do not start at the
    /// pivot, or that carry a non-positive rate, are skipped.
    pub fn from_edges<'a>(pivot: CurrencyCode, edges: impl IntoIterator<Item = &'a ExchangeRate>) -> Self {
        let mut table = Self::new(pivot);
        for edge in edges {
            if edge.from != table.pivot {
                debug!("ignoring rate {} -> {}: not pivot-anchored", edge.from, edge.to);
                continue;
            }
            if edge.rate <= Decimal::ZERO {
                warn!("ignoring rate {} -> {}: non-positive rate {}", edge.from, edge.to, edge.rate);
                continue;
            }
            table.edges.insert(edge.to.clone(), edge.clone());
        }
        table
    }

    pub fn pivot(&self) -> &CurrencyCode {
        &self.pivot
    }

    /// Set the rate `pivot -> to`, replacing any previous value.
    pub fn set_rate(&mut self, to: CurrencyCode, rate: Decimal) -> Result<&ExchangeRate, FxError> {
        let edge = validated_edge(&self.pivot, self.pivot.clone(), to, rate)?;
        let key = edge.to.clone();
        self.edges.insert(key.clone(), edge);
        Ok(&self.edges[&key])
    }

    /// Stored rate `pivot -> to`, if any.
    pub fn pivot_rate(&self, to: &CurrencyCode) -> Option<Decimal> {
        self.edges.get(to).map(|e| e.rate)
    }

    pub fn edge(&self, to: &CurrencyCode) -> Option<&ExchangeRate> {
        self.edges.get(to)
    }

    pub fn edges(&self) -> impl Iterator<Item = &ExchangeRate> {
        self.edges.values()
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

/// Checks that an edge starts at the pivot, links two different currencies
/// and carries a positive rate.
pub fn validated_edge(
    pivot: &CurrencyCode,
    from: CurrencyCode,
    to: CurrencyCode,
    rate: Decimal,
) -> Result<ExchangeRate, FxError> {
    if &from != pivot || to == from {
        return Err(FxError::NotPivotAnchored {
            from,
            to,
            pivot: pivot.clone(),
        });
    }
    if rate <= Decimal::ZERO {
        return Err(FxError::InvalidRate { from, to, rate });
    }
    Ok(ExchangeRate::new(from, to, rate))
}
