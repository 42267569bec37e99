use crate::core::currency::CurrencyCode;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// National identity document number of a client ("V-123").
///
/// This is the lookup key at the counter: clients are searched by
/// document, never by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(String);

impl ClientId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ClientId {
    fn from(s: &str) -> Self {
        Self::new(s.trim())
    }
}

/// A registered client and the credit currently extended to them.
///
/// `debt` is never negative and is denominated in `debt_currency`.
/// It must always agree with the client's debt movement history; only the
/// debt subledger writes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub id: ClientId,
    pub name: String,
    pub phone: String,
    pub created_at: DateTime<Utc>,
    pub debt: Decimal,
    pub debt_currency: CurrencyCode,
}

impl Client {
    pub fn new(
        id: ClientId,
        name: impl Into<String>,
        phone: impl Into<String>,
        debt_currency: CurrencyCode,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            phone: phone.into(),
            created_at: Utc::now(),
            debt: Decimal::ZERO,
            debt_currency,
        }
    }

    pub fn has_debt(&self) -> bool {
        self.debt > Decimal::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_id_trims_input() {
        assert_eq!(ClientId::from("  V-123 "), ClientId::new("V-123"));
    }

    #[test]
    fn test_new_client_has_no_debt() {
        let client = Client::new(
            ClientId::new("V-123"),
            "Ana",
            "+58 412 0000000",
            CurrencyCode::new("USD"),
        );
        assert_eq!(client.debt, Decimal::ZERO);
        assert!(!client.has_debt());
    }
}
