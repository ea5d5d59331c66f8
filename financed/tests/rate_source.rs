use finance_api::{
    models::Rate,
    ports::{ExchangeRateRepository as _, RateSource as _},
};
use finance_sqlite::{Db, config::SqliteConfig};
use financed::cbr::{CbrClient, CbrConfig, CbrError};
use httpmock::prelude::*;
use std::time::Duration;
use time::macros::date;

const BULLETIN: &str = r#"<?xml version="1.0" encoding="windows-1251"?>
<ValCurs Date="03.03.2025" name="Foreign Currency Market">
  <Valute ID="R01235"><NumCode>840</NumCode><CharCode>USD</CharCode><Nominal>1</Nominal><Name>US Dollar</Name><Value>90,0000</Value></Valute>
  <Valute ID="R01239"><NumCode>978</NumCode><CharCode>EUR</CharCode><Nominal>1</Nominal><Name>Euro</Name><Value>100,0000</Value></Valute>
  <Valute ID="R01375"><NumCode>156</NumCode><CharCode>CNY</CharCode><Nominal>10</Nominal><Name>Yuan</Name><Value>125,0000</Value></Valute>
  <Valute ID="R01820"><NumCode>392</NumCode><CharCode>JPY</CharCode><Nominal>100</Nominal><Name>Yen</Name><Value>60,1234</Value></Valute>
</ValCurs>"#;

fn client(server: &MockServer) -> CbrClient {
    CbrClient::new(CbrConfig {
        url: server.url("/scripts/XML_daily.asp"),
        timeout: Duration::from_secs(2),
        attempts: 3,
        backoff: Duration::from_millis(5),
    })
    .unwrap()
}

fn rate(value: &str) -> Rate {
    value.parse().unwrap()
}

#[test_log::test(tokio::test)]
async fn requests_the_bulletin_for_a_day() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/scripts/XML_daily.asp")
                .query_param("date_req", "03/03/2025");
            then.status(200)
                .header("Content-Type", "application/xml; charset=windows-1251")
                .body(BULLETIN);
        })
        .await;

    let quotes = client(&server)
        .daily_rates(date!(2025 - 03 - 03))
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(quotes.len(), 4);
    assert_eq!(quotes[2].char_code, "CNY");
    assert_eq!(quotes[2].nominal, 10);
    assert_eq!(quotes[2].value, rate("125"));
}

#[test_log::test(tokio::test)]
async fn gives_up_after_the_last_attempt() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/scripts/XML_daily.asp");
            then.status(503);
        })
        .await;

    let err = client(&server)
        .daily_rates(date!(2025 - 03 - 03))
        .await
        .unwrap_err();

    assert!(matches!(err, CbrError::Status(status) if status.as_u16() == 503));
    mock.assert_hits_async(3).await;
}

#[test_log::test(tokio::test)]
async fn loaded_rates_cover_enabled_currencies() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/scripts/XML_daily.asp");
            then.status(200).body(BULLETIN);
        })
        .await;

    let db = Db::open(&SqliteConfig::default()).await.unwrap();
    let day = date!(2025 - 03 - 03);
    let stored = db.fetch_and_save(day, &client(&server)).await.unwrap();

    // The yen is not a configured currency
    assert_eq!(stored.len(), 3);
    assert!(db.rates_loaded(day).await.unwrap());

    let cny = stored
        .iter()
        .find(|stored| stored.official_rate == rate("12.5"))
        .map(|stored| stored.standard_rate);
    assert_eq!(cny, Some(rate("12.5")));
}
