use crate::{Db, Error, rows::RATE_COLUMNS};
use finance_api::{
    models::{Amount, Conversion, CurrencyId, DateTime, ExchangeRate, Failure, Rate},
    ports::{CurrencyRepository as _, ExchangeRateRepository, RateSource},
};
use futures::{StreamExt as _, stream};
use std::collections::{HashMap, HashSet};
use tracing::{Level, event};

impl ExchangeRateRepository for Db {
    async fn get_rate(
        &self,
        from: CurrencyId,
        to: CurrencyId,
        date: time::Date,
        rates: &impl RateSource,
    ) -> Result<Rate, Self::Error> {
        if from == to {
            return Ok(Rate::ONE);
        }
        let from_rub = self.rate_to_rub(from, date, rates).await?;
        let to_rub = self.rate_to_rub(to, date, rates).await?;
        // A stored rate is never zero, so crossing cannot fail
        from_rub
            .cross(to_rub)
            .ok_or_else(|| Error::Corrupt(format!("zero exchange rate for {to} on {date}")))
    }

    async fn convert(
        &self,
        from: CurrencyId,
        to: CurrencyId,
        amount: Amount,
        date: time::Date,
        rates: &impl RateSource,
    ) -> Result<Conversion, Self::Error> {
        let rate = self.get_rate(from, to, date, rates).await?;
        let converted = amount
            .convert(rate)
            .ok_or(Failure::ConvertedAmountTooLarge)?;
        if converted < Amount::CENT {
            return Err(Failure::ConvertedAmountTooSmall.into());
        }
        Ok(Conversion {
            from,
            to,
            amount,
            rate,
            converted,
            date,
        })
    }

    async fn rates_for_date(&self, date: time::Date) -> Result<Vec<ExchangeRate>, Self::Error> {
        let query = format!(
            "select {RATE_COLUMNS} from exchange_rate where rate_date = $1 order by currency_from_id"
        );
        Ok(sqlx::query_as::<_, ExchangeRate>(&query)
            .bind(date)
            .fetch_all(&self.reader)
            .await?)
    }

    async fn fetch_and_save(
        &self,
        date: time::Date,
        rates: &impl RateSource,
    ) -> Result<Vec<ExchangeRate>, Self::Error> {
        let quotes = rates
            .daily_rates(date)
            .await
            .map_err(|err| Error::RateSource(Box::new(err)))?;

        let by_code: HashMap<String, CurrencyId> = self
            .list_currencies(true)
            .await?
            .into_iter()
            .filter(|currency| currency.id != CurrencyId::RUB)
            .map(|currency| (currency.data.code, currency.id))
            .collect();

        let stored: Vec<ExchangeRate> = quotes
            .iter()
            .filter_map(|quote| {
                let currency_id = by_code.get(&quote.char_code)?;
                ExchangeRate::from_quote(*currency_id, quote, date, &self.markup)
            })
            .collect();

        if stored.is_empty() {
            event!(Level::WARN, %date, "rate source returned no usable quotes");
            return Ok(stored);
        }

        let mut tx = self.writer.begin().await?;
        for rate in &stored {
            sqlx::query(
                "insert into exchange_rate (currency_from_id, currency_to_id, official_rate, \
                 standard_rate, premium_client_rate, rate_date) values ($1, $2, $3, $4, $5, $6) \
                 on conflict (currency_from_id, currency_to_id, rate_date) do update set \
                 official_rate = excluded.official_rate, standard_rate = excluded.standard_rate, \
                 premium_client_rate = excluded.premium_client_rate",
            )
            .bind(rate.currency_from_id)
            .bind(rate.currency_to_id)
            .bind(rate.official_rate)
            .bind(rate.standard_rate)
            .bind(rate.premium_client_rate)
            .bind(rate.rate_date)
            .execute(&mut *tx)
            .await?;
        }
        sqlx::query(
            "insert into rate_update_log (update_date, status, created_at) values ($1, 'SUCCESS', $2) \
             on conflict (update_date) do update set status = excluded.status, \
             created_at = excluded.created_at",
        )
        .bind(date)
        .bind(DateTime::from(time::OffsetDateTime::now_utc()))
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        event!(Level::INFO, %date, count = stored.len(), "stored exchange rates");
        Ok(stored)
    }

    async fn rates_loaded(&self, date: time::Date) -> Result<bool, Self::Error> {
        Ok(sqlx::query_scalar::<_, bool>(
            "select exists(select 1 from rate_update_log where update_date = $1 and status = 'SUCCESS')",
        )
        .bind(date)
        .fetch_one(&self.reader)
        .await?)
    }

    async fn backfill(
        &self,
        from: time::Date,
        to: time::Date,
        concurrency: usize,
        rates: &impl RateSource,
    ) -> Result<usize, Self::Error> {
        let present: HashSet<time::Date> = sqlx::query_scalar::<_, time::Date>(
            "select distinct rate_date from exchange_rate where rate_date between $1 and $2",
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.reader)
        .await?
        .into_iter()
        .collect();

        let mut missing = Vec::new();
        let mut day = from;
        while day <= to {
            if !present.contains(&day) {
                missing.push(day);
            }
            match day.next_day() {
                Some(next) => day = next,
                None => break,
            }
        }

        event!(Level::INFO, %from, %to, missing = missing.len(), "backfilling exchange rates");

        let loaded = stream::iter(missing)
            .map(|day| async move { (day, self.fetch_and_save(day, rates).await) })
            .buffer_unordered(concurrency.max(1))
            .fold(0, |count, (day, result)| async move {
                match result {
                    Ok(stored) if !stored.is_empty() => count + 1,
                    Ok(_) => count,
                    Err(err) => {
                        event!(Level::WARN, %day, err = err.to_string(), "failed to load exchange rates");
                        count
                    }
                }
            })
            .await;

        Ok(loaded)
    }
}

impl Db {
    /// The stored standard rate from `currency_id` to rubles on `date`
    async fn stored_rate(
        &self,
        currency_id: CurrencyId,
        date: time::Date,
    ) -> Result<Option<Rate>, Error> {
        Ok(sqlx::query_scalar::<_, Rate>(
            "select standard_rate from exchange_rate \
             where currency_from_id = $1 and currency_to_id = $2 and rate_date = $3",
        )
        .bind(currency_id)
        .bind(CurrencyId::RUB)
        .bind(date)
        .fetch_optional(&self.reader)
        .await?)
    }

    /// The standard rate from `currency_id` to rubles on `date`, fetching the
    /// day from `rates` on a miss.
    ///
    /// This reads and writes through the pools, so it must not be called while
    /// the caller holds a write transaction.
    pub(crate) async fn rate_to_rub(
        &self,
        currency_id: CurrencyId,
        date: time::Date,
        rates: &impl RateSource,
    ) -> Result<Rate, Error> {
        if currency_id == CurrencyId::RUB {
            return Ok(Rate::ONE);
        }
        if let Some(rate) = self.stored_rate(currency_id, date).await? {
            return Ok(rate);
        }

        if let Err(err) = self.fetch_and_save(date, rates).await {
            event!(Level::WARN, %date, err = err.to_string(), "on-demand rate fetch failed");
        }

        match self.stored_rate(currency_id, date).await? {
            Some(rate) => Ok(rate),
            None => {
                let currency = self
                    .currency_code(currency_id)
                    .await?
                    .ok_or(Failure::CurrencyNotFound(currency_id))?;
                Err(Failure::ExchangeRateUnavailable { currency, date }.into())
            }
        }
    }
}
