//! Stock catalogue a fresh desk starts with.

use crate::core::currency::{CashBox, Currency, CurrencyCode};
use crate::rates::table::ExchangeRate;
use crate::store::snapshot::Snapshot;
use rust_decimal_macros::dec;

/// Dollar, bolívar and Colombian peso with their usual boxes and rates.
pub fn default_catalogue() -> Snapshot {
    let usd = CurrencyCode::new("USD");
    let bs = CurrencyCode::new("BS");
    let cop = CurrencyCode::new("COP");

    let currencies = vec![
        Currency::new(usd.clone(), "Dólar", dec!(0)),
        Currency::new(bs.clone(), "Bolívar", dec!(6)),
        Currency::new(cop.clone(), "Peso Colombiano", dec!(3)),
    ];

    let boxes = [
        (&usd, "Zelle"),
        (&usd, "Efectivo"),
        (&usd, "USDT"),
        (&usd, "Transferencia"),
        (&usd, "Banesco Panamá"),
        (&bs, "Transferencia"),
        (&bs, "Pago Móvil"),
        (&bs, "Efectivo"),
        (&cop, "Nequi"),
        (&cop, "Efectivo"),
        (&cop, "Transferencia"),
    ];

    Snapshot {
        currencies,
        cash_boxes: boxes
            .iter()
            .map(|(currency, name)| CashBox::new((*currency).clone(), *name))
            .collect(),
        exchange_rates: vec![
            ExchangeRate::new(usd.clone(), bs, dec!(36.5)),
            ExchangeRate::new(usd, cop, dec!(4200)),
        ],
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::currency::BoxId;
    use crate::store::{MemoryStore, Store};

    #[test]
    fn test_seeded_store_has_catalogue() {
        let store = MemoryStore::seeded();
        let snapshot = store.read().unwrap();
        assert_eq!(snapshot.currencies.len(), 3);
        assert_eq!(snapshot.cash_boxes.len(), 11);
        assert_eq!(snapshot.exchange_rates.len(), 2);
        assert!(store
            .cash_box(&BoxId::new("BS", "Pago Móvil"))
            .unwrap()
            .is_some());
    }
}
