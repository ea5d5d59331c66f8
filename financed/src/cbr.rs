//! A client for the Central Bank of Russia daily rates bulletin.
//!
//! The bulletin is an XML document listing, for one day, how many rubles a
//! nominal amount of each foreign currency costs:
//!
//! ```xml
//! <ValCurs Date="03.03.2025" name="Foreign Currency Market">
//!   <Valute ID="R01235">
//!     <NumCode>840</NumCode>
//!     <CharCode>USD</CharCode>
//!     <Nominal>1</Nominal>
//!     <Name>US Dollar</Name>
//!     <Value>89,9914</Value>
//!   </Valute>
//! </ValCurs>
//! ```
//!
//! Values use a comma as the decimal separator.

use finance_api::{
    models::{OfficialQuote, ParseDecimalError},
    ports::RateSource,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use time::{format_description::BorrowedFormatItem, macros::format_description};
use tracing::{Level, event};

const DATE_REQ: &[BorrowedFormatItem<'static>] = format_description!("[day]/[month]/[year]");

/// Settings for [`CbrClient`]
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CbrConfig {
    /// The bulletin endpoint
    #[serde(default = "default_url")]
    pub url: String,
    /// Timeout for each request
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,
    /// How many times a request is attempted
    #[serde(default = "default_attempts")]
    pub attempts: u32,
    /// The wait before the first retry; later retries wait proportionally longer
    #[serde(default = "default_backoff", with = "humantime_serde")]
    pub backoff: Duration,
}

fn default_url() -> String {
    "https://www.cbr.ru/scripts/XML_daily.asp".to_owned()
}

fn default_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_attempts() -> u32 {
    3
}

fn default_backoff() -> Duration {
    Duration::from_secs(1)
}

impl Default for CbrConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            timeout: default_timeout(),
            attempts: default_attempts(),
            backoff: default_backoff(),
        }
    }
}

/// Errors raised while reading the bulletin
#[derive(Debug, thiserror::Error)]
pub enum CbrError {
    /// The request could not be sent or the body could not be read
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The bank answered with an error status
    #[error("unexpected status {0}")]
    Status(reqwest::StatusCode),
    /// The body is not a bulletin
    #[error("malformed bulletin: {0}")]
    Xml(#[from] quick_xml::DeError),
    /// A quote's value is not a decimal number
    #[error("malformed value {value:?} for {code}: {source}")]
    Value {
        /// The quote's currency code
        code: String,
        /// The text as published
        value: String,
        /// Why it did not parse
        source: ParseDecimalError,
    },
    /// The request date could not be formatted
    #[error("unformattable date: {0}")]
    Date(#[from] time::error::Format),
}

#[derive(Debug, Deserialize)]
struct ValCurs {
    #[serde(rename = "Valute", default)]
    valutes: Vec<Valute>,
}

#[derive(Debug, Deserialize)]
struct Valute {
    #[serde(rename = "CharCode")]
    char_code: String,
    #[serde(rename = "Nominal")]
    nominal: u32,
    #[serde(rename = "Value")]
    value: String,
}

impl TryFrom<Valute> for OfficialQuote {
    type Error = CbrError;

    fn try_from(valute: Valute) -> Result<Self, Self::Error> {
        let value = valute
            .value
            .trim()
            .replace(',', ".")
            .parse()
            .map_err(|source| CbrError::Value {
                code: valute.char_code.clone(),
                value: valute.value.clone(),
                source,
            })?;
        Ok(Self {
            char_code: valute.char_code,
            nominal: valute.nominal,
            value,
        })
    }
}

/// Parse a bulletin into quotes
pub fn parse_bulletin(xml: &str) -> Result<Vec<OfficialQuote>, CbrError> {
    let bulletin: ValCurs = quick_xml::de::from_str(xml)?;
    bulletin
        .valutes
        .into_iter()
        .map(OfficialQuote::try_from)
        .collect()
}

/// A [`RateSource`] backed by the central bank's XML endpoint
#[derive(Debug, Clone)]
pub struct CbrClient {
    client: reqwest::Client,
    config: CbrConfig,
}

impl CbrClient {
    /// Build a client; fails only if the TLS backend cannot be initialized
    pub fn new(config: CbrConfig) -> Result<Self, CbrError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("financed/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, config })
    }

    async fn fetch_once(&self, date: time::Date) -> Result<Vec<OfficialQuote>, CbrError> {
        let response = self
            .client
            .get(&self.config.url)
            .query(&[("date_req", date.format(DATE_REQ)?)])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(CbrError::Status(response.status()));
        }

        // The bulletin is windows-1251; every field read here is ASCII
        let body = response.bytes().await?;
        parse_bulletin(&String::from_utf8_lossy(&body))
    }
}

impl RateSource for CbrClient {
    type Error = CbrError;

    async fn daily_rates(&self, date: time::Date) -> Result<Vec<OfficialQuote>, Self::Error> {
        let attempts = self.config.attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.fetch_once(date).await {
                Ok(quotes) => {
                    event!(Level::DEBUG, %date, quotes = quotes.len(), "fetched bulletin");
                    return Ok(quotes);
                }
                Err(err) if attempt < attempts => {
                    event!(Level::WARN, %date, attempt, err = err.to_string(), "bulletin fetch failed, retrying");
                    tokio::time::sleep(self.config.backoff * attempt).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BULLETIN: &str = r#"<?xml version="1.0" encoding="windows-1251"?>
<ValCurs Date="03.03.2025" name="Foreign Currency Market">
  <Valute ID="R01235">
    <NumCode>840</NumCode>
    <CharCode>USD</CharCode>
    <Nominal>1</Nominal>
    <Name>US Dollar</Name>
    <Value>89,9914</Value>
    <VunitRate>89,9914</VunitRate>
  </Valute>
  <Valute ID="R01375">
    <NumCode>156</NumCode>
    <CharCode>CNY</CharCode>
    <Nominal>10</Nominal>
    <Name>Yuan</Name>
    <Value>123,4500</Value>
  </Valute>
</ValCurs>"#;

    #[test]
    fn parses_comma_decimals() {
        let quotes = parse_bulletin(BULLETIN).unwrap();
        assert_eq!(quotes.len(), 2);
        assert_eq!(quotes[0].char_code, "USD");
        assert_eq!(quotes[0].nominal, 1);
        assert_eq!(quotes[0].value, "89.9914".parse().unwrap());
        assert_eq!(quotes[1].char_code, "CNY");
        assert_eq!(quotes[1].nominal, 10);
        assert_eq!(quotes[1].value, "123.45".parse().unwrap());
    }

    #[test]
    fn an_empty_bulletin_has_no_quotes() {
        let quotes = parse_bulletin(r#"<ValCurs Date="05.01.2025"></ValCurs>"#).unwrap();
        assert!(quotes.is_empty());
    }

    #[test]
    fn rejects_garbled_values() {
        let xml = "<ValCurs><Valute><CharCode>USD</CharCode><Nominal>1</Nominal>\
                   <Value>n/a</Value></Valute></ValCurs>";
        assert!(matches!(parse_bulletin(xml), Err(CbrError::Value { .. })));
    }

    #[test]
    fn formats_the_request_date() {
        let date = time::macros::date!(2025 - 03 - 07);
        assert_eq!(date.format(DATE_REQ).unwrap(), "07/03/2025");
    }
}
