use crate::core::currency::{BoxId, CurrencyCode};
use crate::core::movement::CashMovement;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Append-only log of cash movements.
///
/// The log is the only source of truth for box balances. Balances are
/// recomputed from it on every read; nothing caches them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MovementLedger {
    entries: Vec<CashMovement>,
}

impl MovementLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a movement. No validation beyond what the type enforces.
    pub fn append(&mut self, movement: CashMovement) {
        self.entries.push(movement);
    }

    /// Drop the most recent movement. Used to unwind a failed batch.
    pub(crate) fn pop(&mut self) -> Option<CashMovement> {
        self.entries.pop()
    }

    pub fn movements(&self) -> &[CashMovement] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Movements linked to one transaction.
    pub fn for_transaction(&self, transaction_id: uuid::Uuid) -> Vec<&CashMovement> {
        self.entries
            .iter()
            .filter(|m| m.transaction_id() == Some(transaction_id))
            .collect()
    }

    /// Sum of signed amounts per box over the full history.
    pub fn balances_by_box(&self) -> BoxBalances {
        BoxBalances::from_movements(&self.entries)
    }
}

impl FromIterator<CashMovement> for MovementLedger {
    fn from_iter<T: IntoIterator<Item = CashMovement>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Balance of every box that has seen at least one movement.
///
/// A read-side projection of a [`MovementLedger`]. Movements commute under
/// addition, so the projection does not depend on insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoxBalances {
    /// BoxId -> sum of signed amounts
    #[serde(with = "balances_serde")]
    balances: HashMap<BoxId, Decimal>,
}

mod balances_serde {
    use super::*;
    use serde::de::{self, MapAccess, Visitor};
    use serde::ser::SerializeMap;

    pub fn serialize<S: serde::Serializer>(
        balances: &HashMap<BoxId, Decimal>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(balances.len()))?;
        for (box_id, amount) in balances {
            map.serialize_entry(&box_id.to_string(), amount)?;
        }
        map.end()
    }

    pub fn deserialize<'de, D: serde::Deserializer<'de>>(
        deserializer: D,
    ) -> Result<HashMap<BoxId, Decimal>, D::Error> {
        struct V;
        impl<'de> Visitor<'de> for V {
            type Value = HashMap<BoxId, Decimal>;
            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.write_str("a map with \"currency:box\" keys")
            }
            fn visit_map<M: MapAccess<'de>>(self, mut access: M) -> Result<Self::Value, M::Error> {
                let mut map = HashMap::new();
                while let Some((key, value)) = access.next_entry::<String, Decimal>()? {
                    let (currency, name) = key
                        .split_once(':')
                        .ok_or_else(|| de::Error::custom(format!("invalid key: {key}")))?;
                    map.insert(BoxId::new(CurrencyCode::new(currency), name), value);
                }
                Ok(map)
            }
        }
        deserializer.deserialize_map(V)
    }
}

impl BoxBalances {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_movements<'a>(movements: impl IntoIterator<Item = &'a CashMovement>) -> Self {
        let mut balances = Self::new();
        for movement in movements {
            balances.apply(movement);
        }
        balances
    }

    /// Add one movement. Sums saturate at the `Decimal` range; writers
    /// check headroom with [`BoxBalances::balance_after`] before posting.
    pub fn apply(&mut self, movement: &CashMovement) {
        let slot = self
            .balances
            .entry(movement.box_id().clone())
            .or_insert(Decimal::ZERO);
        *slot = slot.saturating_add(movement.amount());
    }

    /// Balance of `box_id` once `delta` is posted, or `None` if it would
    /// not fit in a `Decimal`.
    pub fn balance_after(&self, box_id: &BoxId, delta: Decimal) -> Option<Decimal> {
        self.balance(box_id).checked_add(delta)
    }

    /// Balance of one box; zero for a box with no history.
    pub fn balance(&self, box_id: &BoxId) -> Decimal {
        self.balances.get(box_id).copied().unwrap_or(Decimal::ZERO)
    }

    /// All box balances held in one currency, keyed by box name.
    pub fn balances_for_currency(&self, currency: &CurrencyCode) -> HashMap<String, Decimal> {
        self.balances
            .iter()
            .filter(|(id, _)| &id.currency == currency)
            .map(|(id, &v)| (id.name.clone(), v))
            .collect()
    }

    /// Sum of all boxes per currency.
    pub fn currency_totals(&self) -> HashMap<CurrencyCode, Decimal> {
        let mut totals: HashMap<CurrencyCode, Decimal> = HashMap::new();
        for (id, amount) in &self.balances {
            let slot = totals.entry(id.currency.clone()).or_insert(Decimal::ZERO);
            *slot = slot.saturating_add(*amount);
        }
        totals
    }

    pub fn all_balances(&self) -> &HashMap<BoxId, Decimal> {
        &self.balances
    }

    /// Balances ordered by currency, then box name.
    pub fn sorted(&self) -> Vec<(&BoxId, Decimal)> {
        let mut rows: Vec<_> = self.balances.iter().map(|(id, &v)| (id, v)).collect();
        rows.sort_by(|a, b| a.0.cmp(b.0));
        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::movement::MovementKind;
    use rust_decimal_macros::dec;

    fn movement(currency: &str, name: &str, amount: Decimal) -> CashMovement {
        let kind = if amount >= Decimal::ZERO {
            MovementKind::AdjustmentIn
        } else {
            MovementKind::AdjustmentOut
        };
        CashMovement::new(BoxId::new(currency, name), amount, kind, "test")
    }

    #[test]
    fn test_ledger_basic() {
        let mut ledger = MovementLedger::new();
        ledger.append(movement("USD", "Zelle", dec!(100)));
        ledger.append(movement("USD", "Zelle", dec!(-30)));
        ledger.append(movement("BS", "Efectivo", dec!(-7300)));

        let balances = ledger.balances_by_box();
        assert_eq!(balances.balance(&BoxId::new("USD", "Zelle")), dec!(70));
        assert_eq!(balances.balance(&BoxId::new("BS", "Efectivo")), dec!(-7300));
        assert_eq!(balances.balance(&BoxId::new("COP", "Nequi")), Decimal::ZERO);
    }

    #[test]
    fn test_boxes_are_independent_within_currency() {
        let ledger: MovementLedger = vec![
            movement("USD", "Zelle", dec!(100)),
            movement("USD", "Efectivo", dec!(40)),
        ]
        .into_iter()
        .collect();

        let balances = ledger.balances_by_box();
        let usd = balances.balances_for_currency(&CurrencyCode::new("USD"));
        assert_eq!(usd.len(), 2);
        assert_eq!(usd["Zelle"], dec!(100));
        assert_eq!(
            balances.currency_totals()[&CurrencyCode::new("USD")],
            dec!(140)
        );
    }

    #[test]
    fn test_order_independent() {
        let a = movement("USD", "Zelle", dec!(10.25));
        let b = movement("USD", "Zelle", dec!(-3.5));
        let c = movement("USD", "Zelle", dec!(7));

        let forward = BoxBalances::from_movements([&a, &b, &c]);
        let backward = BoxBalances::from_movements([&c, &b, &a]);
        assert_eq!(forward, backward);
    }

    #[test]
    fn test_balances_serialize_with_composite_keys() {
        let ledger: MovementLedger = vec![movement("BS", "Pago Móvil", dec!(12))]
            .into_iter()
            .collect();
        let json = serde_json::to_value(ledger.balances_by_box()).unwrap();
        assert_eq!(json["balances"]["BS:Pago Móvil"], "12");

        let back: BoxBalances = serde_json::from_value(json).unwrap();
        assert_eq!(back.balance(&BoxId::new("BS", "Pago Móvil")), dec!(12));
    }

    #[test]
    fn test_balance_saturates_instead_of_overflowing() {
        let ledger: MovementLedger = vec![
            movement("USD", "Efectivo", Decimal::MAX),
            movement("USD", "Efectivo", Decimal::MAX),
        ]
        .into_iter()
        .collect();

        let balances = ledger.balances_by_box();
        let id = BoxId::new("USD", "Efectivo");
        assert_eq!(balances.balance(&id), Decimal::MAX);
        assert_eq!(balances.balance_after(&id, dec!(1)), None);
        assert_eq!(balances.balance_after(&id, dec!(-1)), Some(Decimal::MAX - dec!(1)));
    }
}
