use finance_api::ports::ExchangeRateRepository as _;
use finance_axum::start_server;
use finance_sqlite::Db;
use financed::{
    AppConfig, Cli, RatesConfig, cbr::CbrClient, impls::FinanceApp, partners::PartnerClient,
};
use jwt_simple::prelude::HS256Key;
use time::OffsetDateTime;
use tokio::select;
use tracing::{Level, event};
use tracing_subscriber::{layer::SubscriberExt as _, util::SubscriberInitExt as _};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Parse CLI args and extract the JWT key
    let cli = Cli::import()?;
    let key = HS256Key::from_bytes(cli.secret.as_bytes());

    let AppConfig {
        server,
        database,
        rates,
        partners,
    } = AppConfig::load(&cli)?;
    let RatesConfig {
        source,
        backfill_days,
        backfill_concurrency,
        refresh,
    } = rates;

    let db = Db::open(&database).await?;
    let rates = CbrClient::new(source)?;
    let partners = PartnerClient::new(partners)?;

    // Load recent history in the background so the API is up immediately
    if backfill_days > 0 {
        let today = refresh.local(OffsetDateTime::now_utc()).date();
        let from = today
            .checked_sub(time::Duration::days(backfill_days.into()))
            .unwrap_or(today);
        let (db, rates) = (db.clone(), rates.clone());
        tokio::spawn(async move {
            match db.backfill(from, today, backfill_concurrency, &rates).await {
                Ok(days) => event!(Level::INFO, %from, %today, days, "backfill finished"),
                Err(err) => event!(Level::ERROR, err = err.to_string(), "backfill aborted"),
            }
        });
    }

    let app = FinanceApp {
        db: db.clone(),
        key,
        rates: rates.clone(),
        partners,
        business_offset: refresh.offset(),
    };
    let server_task = tokio::spawn(async move { start_server(server, app).await });

    if refresh.every.is_some() {
        let refresh_task = tokio::spawn(async move {
            let f = async move |today: time::Date| -> Result<(), finance_sqlite::Error> {
                if db.rates_loaded(today).await? {
                    Ok(())
                } else {
                    let stored = db.fetch_and_save(today, &rates).await?;
                    event!(Level::INFO, %today, rates = stored.len(), "loaded today's rates");
                    Ok(())
                }
            };
            refresh.run(f).await
        });

        select! {
            r = server_task => r??,
            r = refresh_task => r?,
        }
    } else {
        server_task.await??;
    }

    Ok(())
}
