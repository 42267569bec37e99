use crate::core::currency::CurrencyCode;
use crate::rates::table::{FxError, RateTable};
use log::debug;
use rust_decimal::Decimal;

/// Derives a rate between any two currencies known to a [`RateTable`],
/// pivoting through the table's pivot currency.
///
/// No rounding is applied; callers round for display only.
///
/// # Examples
///
/// ```
/// use remittance_engine::core::currency::CurrencyCode;
/// use remittance_engine::rates::resolver::RateResolver;
/// use remittance_engine::rates::table::RateTable;
/// use rust_decimal_macros::dec;
///
/// let mut table = RateTable::new(CurrencyCode::new("USD"));
/// table.set_rate(CurrencyCode::new("BS"), dec!(36.5)).unwrap();
/// table.set_rate(CurrencyCode::new("COP"), dec!(4200)).unwrap();
///
/// let resolver = RateResolver::new(&table);
/// let rate = resolver
///     .resolve(&CurrencyCode::new("BS"), &CurrencyCode::new("COP"))
///     .unwrap();
/// assert_eq!(rate, dec!(4200) / dec!(36.5));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct RateResolver<'a> {
    table: &'a RateTable,
}

impl<'a> RateResolver<'a> {
    pub fn new(table: &'a RateTable) -> Self {
        Self { table }
    }

    pub fn pivot(&self) -> &CurrencyCode {
        self.table.pivot()
    }

    /// Rate to turn one unit of `from` into `to`.
    ///
    /// - same currency: 1
    /// - from the pivot: the stored edge
    /// - to the pivot: reciprocal of the stored edge
    /// - otherwise: `rate(pivot -> to) / rate(pivot -> from)`
    ///
    /// A missing edge or a zero divisor is reported as `RateNotFound`.
    pub fn resolve(&self, from: &CurrencyCode, to: &CurrencyCode) -> Result<Decimal, FxError> {
        if from == to {
            return Ok(Decimal::ONE);
        }
        let pivot = self.table.pivot();
        let not_found = || FxError::RateNotFound {
            from: from.clone(),
            to: to.clone(),
        };

        let rate = if from == pivot {
            self.table.pivot_rate(to)
        } else if to == pivot {
            self.table
                .pivot_rate(from)
                .and_then(|r| checked_ratio(Decimal::ONE, r))
        } else {
            match (self.table.pivot_rate(from), self.table.pivot_rate(to)) {
                (Some(from_rate), Some(to_rate)) => checked_ratio(to_rate, from_rate),
                _ => None,
            }
        };

        let rate = rate.ok_or_else(not_found)?;
        debug!("resolved {} -> {} = {}", from, to, rate);
        Ok(rate)
    }

    /// Convert an amount from one currency to another.
    pub fn convert(
        &self,
        amount: Decimal,
        from: &CurrencyCode,
        to: &CurrencyCode,
    ) -> Result<Decimal, FxError> {
        let rate = self.resolve(from, to)?;
        amount.checked_mul(rate).ok_or_else(|| FxError::RateNotFound {
            from: from.clone(),
            to: to.clone(),
        })
    }

    /// Value of `amount` in the pivot currency, dividing by the
    /// `pivot -> currency` edge. `None` when the edge is missing or not
    /// positive.
    pub fn to_pivot(&self, amount: Decimal, currency: &CurrencyCode) -> Option<Decimal> {
        if currency == self.table.pivot() {
            return Some(amount);
        }
        let rate = self.table.pivot_rate(currency)?;
        checked_ratio(amount, rate)
    }
}

fn checked_ratio(numerator: Decimal, divisor: Decimal) -> Option<Decimal> {
    if divisor <= Decimal::ZERO {
        return None;
    }
    numerator.checked_div(divisor)
}
