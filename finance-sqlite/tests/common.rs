#![allow(dead_code)]

use finance_api::{
    models::{
        Amount, CurrencyId, DateTime, InvoiceData, InvoiceDirection, InvoiceStatusId,
        OfficialQuote, PartnerId, PaymentData, PaymentStatusId, PaymentTypeId, ServiceTypeId,
        Stamp,
    },
    ports::RateSource,
};
use finance_sqlite::{Db, config::SqliteConfig};
use std::sync::atomic::{AtomicUsize, Ordering};

pub const RUB: CurrencyId = CurrencyId::RUB;
pub const USD: CurrencyId = CurrencyId(2);
pub const EUR: CurrencyId = CurrencyId(3);
pub const CNY: CurrencyId = CurrencyId(4);

pub const PARTNER: PartnerId = PartnerId(1);

/// A rate source that publishes the same bulletin for every day
pub struct FixedRates {
    quotes: Vec<OfficialQuote>,
    calls: AtomicUsize,
}

impl FixedRates {
    pub fn new(quotes: &[(&str, u32, &str)]) -> Self {
        let quotes = quotes
            .iter()
            .map(|(code, nominal, value)| OfficialQuote {
                char_code: (*code).to_owned(),
                nominal: *nominal,
                value: value.parse().unwrap(),
            })
            .collect();
        Self {
            quotes,
            calls: AtomicUsize::new(0),
        }
    }

    /// USD at 90, EUR at 100 and CNY at 12.5 per unit
    pub fn standard() -> Self {
        Self::new(&[("USD", 1, "90"), ("EUR", 1, "100"), ("CNY", 10, "125")])
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[derive(Debug, thiserror::Error)]
#[error("rate source is offline")]
pub struct Offline;

impl RateSource for FixedRates {
    type Error = Offline;

    async fn daily_rates(&self, _date: time::Date) -> Result<Vec<OfficialQuote>, Self::Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.quotes.clone())
    }
}

/// A rate source that is never reachable
pub struct OfflineRates;

impl RateSource for OfflineRates {
    type Error = Offline;

    async fn daily_rates(&self, _date: time::Date) -> Result<Vec<OfficialQuote>, Self::Error> {
        Err(Offline)
    }
}

pub async fn open() -> anyhow::Result<Db> {
    Ok(Db::open(&SqliteConfig::default()).await?)
}

pub fn stamp() -> Stamp {
    Stamp::new(DateTime::from(time::OffsetDateTime::now_utc()), "tester")
}

pub fn amount(value: &str) -> Amount {
    value.parse().unwrap()
}

pub fn invoice_data(
    direction: InvoiceDirection,
    currency_id: CurrencyId,
    total: &str,
    issue_date: time::Date,
) -> InvoiceData {
    InvoiceData {
        direction,
        partner_id: PARTNER,
        service_type_id: ServiceTypeId(1),
        total_amount: amount(total),
        currency_id,
        issue_date,
        due_date: None,
        commentary: Some("test invoice".into()),
        shipment_id: Some(123),
        status_id: InvoiceStatusId::DRAFT,
    }
}

pub fn payment_data(currency_id: CurrencyId, value: &str, payment_date: time::Date) -> PaymentData {
    PaymentData {
        partner_id: PARTNER,
        payment_date,
        currency_id,
        amount: amount(value),
        processing_fees: Amount::ZERO,
        payment_type_id: PaymentTypeId(1),
        payment_status_id: PaymentStatusId::COMPLETED,
        commentary: Some("test payment".into()),
    }
}
