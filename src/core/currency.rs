use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Currency symbol as used by the desk ("USD", "BS", "COP").
///
/// Symbols are free-form: the desk quotes local units that have no
/// ISO 4217 code, so no validation beyond normalisation is applied.
///
/// # Examples
///
/// ```
/// use remittance_engine::core::currency::CurrencyCode;
///
/// let usd = CurrencyCode::new("USD");
/// let bs = CurrencyCode::normalized("  bs ");
/// assert_ne!(usd, bs);
/// assert_eq!(bs.as_str(), "BS");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CurrencyCode(String);

impl CurrencyCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Trims and upper-cases user input before building the code.
    pub fn normalized(code: &str) -> Self {
        Self(code.trim().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for CurrencyCode {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// A currency the desk trades, with its default commission.
///
/// `commission_percent` is only a default: it is copied into each
/// transaction when the transaction is created, so editing it later
/// leaves past transactions untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Currency {
    pub symbol: CurrencyCode,
    pub name: String,
    pub commission_percent: Decimal,
}

impl Currency {
    pub fn new(symbol: CurrencyCode, name: impl Into<String>, commission_percent: Decimal) -> Self {
        Self {
            symbol,
            name: name.into(),
            commission_percent,
        }
    }
}

/// Identity of a cash box: the currency it holds plus its name.
///
/// A box belongs to exactly one currency, so the same name ("Efectivo")
/// under two currencies names two distinct boxes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BoxId {
    pub currency: CurrencyCode,
    pub name: String,
}

impl BoxId {
    pub fn new(currency: impl Into<CurrencyCode>, name: impl Into<String>) -> Self {
        Self {
            currency: currency.into(),
            name: name.into(),
        }
    }

    /// Parses the `CURRENCY:Box name` form used on the command line and in
    /// serialized balance maps.
    pub fn parse(s: &str) -> Option<Self> {
        let (currency, name) = s.split_once(':')?;
        let name = name.trim();
        if currency.trim().is_empty() || name.is_empty() {
            return None;
        }
        Some(Self::new(CurrencyCode::normalized(currency), name))
    }
}

impl fmt::Display for BoxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.currency, self.name)
    }
}

/// A named sub-account of a currency: a payment rail or a physical till.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashBox {
    pub id: BoxId,
}

impl CashBox {
    pub fn new(currency: CurrencyCode, name: impl Into<String>) -> Self {
        Self {
            id: BoxId::new(currency, name),
        }
    }

    pub fn currency(&self) -> &CurrencyCode {
        &self.id.currency
    }

    pub fn name(&self) -> &str {
        &self.id.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currency_code_equality() {
        let a = CurrencyCode::new("USD");
        let b = CurrencyCode::new("USD");
        assert_eq!(a, b);
    }

    #[test]
    fn test_normalized_code() {
        assert_eq!(CurrencyCode::normalized(" cop "), CurrencyCode::new("COP"));
    }

    #[test]
    fn test_same_box_name_different_currency() {
        let usd_cash = BoxId::new("USD", "Efectivo");
        let bs_cash = BoxId::new("BS", "Efectivo");
        assert_ne!(usd_cash, bs_cash);
    }

    #[test]
    fn test_box_id_parse() {
        let id = BoxId::parse("bs:Pago Móvil").unwrap();
        assert_eq!(id.currency.as_str(), "BS");
        assert_eq!(id.name, "Pago Móvil");
        assert_eq!(id.to_string(), "BS:Pago Móvil");
    }

    #[test]
    fn test_box_id_parse_rejects_missing_parts() {
        assert!(BoxId::parse("USD").is_none());
        assert!(BoxId::parse("USD:").is_none());
        assert!(BoxId::parse(":Zelle").is_none());
    }
}
