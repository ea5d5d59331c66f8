use crate::{
    models::{Amount, Conversion, CurrencyId, ExchangeRate, Rate},
    ports::RateSource,
};
use std::future::Future;

/// Repository interface for exchange rates.
///
/// Only rates into the ruble are stored. Lookups that miss ask `rates` for
/// the whole day and store it before trying again.
pub trait ExchangeRateRepository: super::Repository {
    /// The standard rate from one currency to another on `date`.
    ///
    /// Refused with `ExchangeRateUnavailable` if a leg is still missing after
    /// asking `rates`.
    fn get_rate(
        &self,
        from: CurrencyId,
        to: CurrencyId,
        date: time::Date,
        rates: &impl RateSource,
    ) -> impl Future<Output = Result<Rate, Self::Error>> + Send;

    /// Convert `amount` at the standard rate on `date`.
    ///
    /// A result below one cent is refused with `ConvertedAmountTooSmall`.
    fn convert(
        &self,
        from: CurrencyId,
        to: CurrencyId,
        amount: Amount,
        date: time::Date,
        rates: &impl RateSource,
    ) -> impl Future<Output = Result<Conversion, Self::Error>> + Send;

    /// The stored rates for `date`, ordered by currency
    fn rates_for_date(
        &self,
        date: time::Date,
    ) -> impl Future<Output = Result<Vec<ExchangeRate>, Self::Error>> + Send;

    /// Ask `rates` for a day's quotes and store those for enabled currencies
    fn fetch_and_save(
        &self,
        date: time::Date,
        rates: &impl RateSource,
    ) -> impl Future<Output = Result<Vec<ExchangeRate>, Self::Error>> + Send;

    /// Whether a day's rates have been loaded successfully
    fn rates_loaded(
        &self,
        date: time::Date,
    ) -> impl Future<Output = Result<bool, Self::Error>> + Send;

    /// Load every day in `from..=to` that has no stored rates, at most
    /// `concurrency` days at a time.
    ///
    /// Days that fail are logged and skipped. Returns the number of days loaded.
    fn backfill(
        &self,
        from: time::Date,
        to: time::Date,
        concurrency: usize,
        rates: &impl RateSource,
    ) -> impl Future<Output = Result<usize, Self::Error>> + Send;
}
