use crate::core::client::{Client, ClientId};
use crate::core::currency::{BoxId, CashBox, Currency, CurrencyCode};
use crate::engine::Desk;
use crate::error::{NotFound, Result, ValidationError};
use crate::rates::table::{validated_edge, ExchangeRate};
use crate::store::{Store, WriteBatch, WriteOp};
use log::info;
use rust_decimal::Decimal;

impl Desk {
    /// Register a currency. The symbol is trimmed and upper-cased.
    pub fn add_currency<S: Store>(
        &self,
        store: &mut S,
        symbol: &str,
        name: &str,
        commission_percent: Decimal,
    ) -> Result<Currency> {
        let symbol = CurrencyCode::normalized(symbol);
        if symbol.as_str().is_empty() {
            return Err(ValidationError::EmptyField("currency symbol").into());
        }
        if name.trim().is_empty() {
            return Err(ValidationError::EmptyField("currency name").into());
        }
        check_commission(commission_percent)?;
        if store.currency(&symbol)?.is_some() {
            return Err(ValidationError::DuplicateCurrency(symbol).into());
        }

        let currency = Currency::new(symbol, name.trim(), commission_percent);
        store.commit(WriteBatch::from_iter([WriteOp::InsertCurrency(currency.clone())]))?;
        info!("added currency {}", currency.symbol);
        Ok(currency)
    }

    /// Change the default commission. Past transactions keep the
    /// commission they were created with.
    pub fn set_default_commission<S: Store>(
        &self,
        store: &mut S,
        symbol: &CurrencyCode,
        commission_percent: Decimal,
    ) -> Result<Currency> {
        check_commission(commission_percent)?;
        let mut currency = store
            .currency(symbol)?
            .ok_or_else(|| NotFound::Currency(symbol.clone()))?;
        currency.commission_percent = commission_percent;
        store.commit(WriteBatch::from_iter([WriteOp::UpdateCurrency(currency.clone())]))?;
        Ok(currency)
    }

    pub fn add_cash_box<S: Store>(
        &self,
        store: &mut S,
        currency: &CurrencyCode,
        name: &str,
    ) -> Result<CashBox> {
        if name.trim().is_empty() {
            return Err(ValidationError::EmptyField("box name").into());
        }
        if store.currency(currency)?.is_none() {
            return Err(ValidationError::MissingCurrency(currency.clone()).into());
        }
        let cash_box = CashBox::new(currency.clone(), name.trim());
        if store.cash_box(&cash_box.id)?.is_some() {
            return Err(ValidationError::DuplicateBox(cash_box.id).into());
        }
        store.commit(WriteBatch::from_iter([WriteOp::InsertCashBox(cash_box.clone())]))?;
        Ok(cash_box)
    }

    /// Set the rate `pivot -> to`, creating the edge if needed.
    pub fn set_pivot_rate<S: Store>(
        &self,
        store: &mut S,
        to: &CurrencyCode,
        rate: Decimal,
    ) -> Result<ExchangeRate> {
        if store.currency(to)?.is_none() {
            return Err(ValidationError::MissingCurrency(to.clone()).into());
        }
        if store.currency(self.pivot())?.is_none() {
            return Err(ValidationError::MissingCurrency(self.pivot().clone()).into());
        }
        let edge = validated_edge(self.pivot(), self.pivot().clone(), to.clone(), rate)?;
        store.commit(WriteBatch::from_iter([WriteOp::PutRate(edge.clone())]))?;
        info!("rate {} -> {} set to {}", edge.from, edge.to, edge.rate);
        Ok(edge)
    }

    pub fn register_client<S: Store>(
        &self,
        store: &mut S,
        national_id: &str,
        name: &str,
        phone: &str,
    ) -> Result<Client> {
        let id = ClientId::from(national_id);
        if id.as_str().is_empty() {
            return Err(ValidationError::EmptyField("national ID").into());
        }
        if name.trim().is_empty() {
            return Err(ValidationError::EmptyField("client name").into());
        }
        if store.client(&id)?.is_some() {
            return Err(ValidationError::DuplicateClient(id).into());
        }

        let client = Client::new(id, name.trim(), phone.trim(), self.config.debt_currency().clone());
        store.commit(WriteBatch::from_iter([WriteOp::InsertClient(client.clone())]))?;
        info!("registered client {}", client.id);
        Ok(client)
    }

    /// Look a client up by national ID.
    pub fn find_client<S: Store>(&self, store: &S, national_id: &ClientId) -> Result<Client> {
        store
            .client(national_id)?
            .ok_or_else(|| NotFound::Client(national_id.clone()).into())
    }

    /// Update name and phone. Debt fields are left to the debt subledger.
    pub fn update_client_contact<S: Store>(
        &self,
        store: &mut S,
        national_id: &ClientId,
        name: &str,
        phone: &str,
    ) -> Result<Client> {
        if name.trim().is_empty() {
            return Err(ValidationError::EmptyField("client name").into());
        }
        let mut client = self.find_client(&*store, national_id)?;
        client.name = name.trim().to_string();
        client.phone = phone.trim().to_string();
        store.commit(WriteBatch::from_iter([WriteOp::UpdateClient(client.clone())]))?;
        Ok(client)
    }

    /// Require that `box_id` exists.
    pub(crate) fn require_box<S: Store>(&self, store: &S, box_id: &BoxId) -> Result<CashBox> {
        store
            .cash_box(box_id)?
            .ok_or_else(|| ValidationError::MissingBox(box_id.clone()).into())
    }
}

fn check_commission(commission_percent: Decimal) -> Result<()> {
    if commission_percent < Decimal::ZERO || commission_percent > Decimal::ONE_HUNDRED {
        return Err(ValidationError::CommissionOutOfRange(commission_percent).into());
    }
    Ok(())
}
