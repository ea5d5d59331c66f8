use crate::models::{Amount, CurrencyId, Rate};

/// A day's rate from one currency to the ruble.
///
/// Only rates against the base currency are stored; every other pair is
/// derived by crossing two of these.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase")
)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ExchangeRate {
    /// The quoted currency
    pub currency_from_id: CurrencyId,
    /// Always the base currency
    pub currency_to_id: CurrencyId,
    /// The central bank's rate for one unit
    pub official_rate: Rate,
    /// The rate used for conversions and ledger pricing
    pub standard_rate: Rate,
    /// The rate offered to premium clients
    pub premium_client_rate: Rate,
    /// The day the rate applies to
    #[cfg_attr(feature = "schemars", schemars(with = "String"))]
    pub rate_date: time::Date,
}

impl ExchangeRate {
    /// Derive the stored rates from an official quote.
    ///
    /// Returns `None` when the quote has a zero nominal.
    pub fn from_quote(
        currency_from_id: CurrencyId,
        quote: &OfficialQuote,
        rate_date: time::Date,
        markup: &RateMarkup,
    ) -> Option<Self> {
        let official_rate = quote.value.per_unit(quote.nominal)?;
        Some(Self {
            currency_from_id,
            currency_to_id: CurrencyId::RUB,
            official_rate,
            standard_rate: official_rate.with_markup(markup.standard),
            premium_client_rate: official_rate.with_markup(markup.premium),
            rate_date,
        })
    }
}

/// One line of a central bank daily bulletin
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfficialQuote {
    /// The alphabetic currency code
    pub char_code: String,
    /// How many units `value` is quoted for
    pub nominal: u32,
    /// Rubles per `nominal` units
    pub value: Rate,
}

/// Fractional markups applied over the official rate
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RateMarkup {
    /// Added on top of the official rate to give the standard rate
    #[cfg_attr(feature = "serde", serde(default))]
    pub standard: Rate,
    /// Added on top of the official rate to give the premium client rate
    #[cfg_attr(feature = "serde", serde(default))]
    pub premium: Rate,
}

/// A record that a day's rates were loaded
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase")
)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct RateUpdateLog {
    /// The day whose rates were loaded
    #[cfg_attr(feature = "schemars", schemars(with = "String"))]
    pub update_date: time::Date,
    /// The outcome of the load
    pub status: String,
}

/// The result of converting an amount between currencies
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct Conversion {
    /// The source currency
    pub from: CurrencyId,
    /// The target currency
    pub to: CurrencyId,
    /// The amount in `from`
    pub amount: Amount,
    /// The rate applied
    pub rate: Rate,
    /// The amount in `to`
    pub converted: Amount,
    /// The day whose rates were used
    #[cfg_attr(feature = "schemars", schemars(with = "String"))]
    pub date: time::Date,
}
