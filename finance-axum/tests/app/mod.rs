#![allow(dead_code)]

use finance_api::{
    models::{DateTime, OfficialQuote, Partner, PartnerId},
    ports::{Application, PartnerDirectory, RateSource},
};
use finance_sqlite::{Db, config::SqliteConfig};
use headers::{Authorization, authorization::Bearer};
use std::{
    collections::HashSet,
    str::FromStr,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

// Tokens are plain comma-separated permission words, e.g. `view,edit`, so a
// test can say exactly what the caller may do without minting a JWT.
#[derive(Debug, Default)]
pub struct Permissions {
    pub view: bool,
    pub edit: bool,
    pub admin: bool,
}

impl FromStr for Permissions {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut permissions = Self::default();
        for word in s.split(',').map(str::trim) {
            match word {
                "view" => permissions.view = true,
                "edit" => permissions.edit = true,
                "admin" => permissions.admin = true,
                _ => {}
            }
        }
        Ok(permissions)
    }
}

#[derive(Debug, thiserror::Error)]
#[error("service is offline")]
pub struct Offline;

/// A rate source publishing USD at 90, EUR at 100 and CNY at 12.5 every day
pub struct TestRates {
    online: bool,
    calls: AtomicUsize,
}

impl TestRates {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl RateSource for TestRates {
    type Error = Offline;

    async fn daily_rates(&self, _date: time::Date) -> Result<Vec<OfficialQuote>, Self::Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.online {
            return Err(Offline);
        }
        Ok(vec![
            quote("USD", 1, "90"),
            quote("EUR", 1, "100"),
            quote("CNY", 10, "125"),
        ])
    }
}

fn quote(code: &str, nominal: u32, value: &str) -> OfficialQuote {
    OfficialQuote {
        char_code: code.to_owned(),
        nominal,
        value: value.parse().unwrap(),
    }
}

/// A partner directory knowing a fixed set of partners
pub struct TestPartners {
    online: bool,
    known: HashSet<PartnerId>,
}

impl PartnerDirectory for TestPartners {
    type Error = Offline;

    async fn find_partner(&self, partner_id: PartnerId) -> Result<Option<Partner>, Self::Error> {
        if !self.online {
            return Err(Offline);
        }
        Ok(self.known.contains(&partner_id).then(|| Partner {
            id: partner_id,
            name: Some(format!("Partner {partner_id}")),
        }))
    }
}

#[derive(Clone)]
pub struct TestApp {
    db: Db,
    rates: Arc<TestRates>,
    partners: Arc<TestPartners>,
    today: Option<time::Date>,
}

/// Partners 1 and 2 exist; everything else is unknown
pub const KNOWN: [PartnerId; 2] = [PartnerId(1), PartnerId(2)];

impl TestApp {
    pub async fn new() -> Self {
        Self::with(true, true).await
    }

    pub async fn with(rates_online: bool, partners_online: bool) -> Self {
        let db = Db::open(&SqliteConfig::default()).await.unwrap();
        Self {
            db,
            rates: Arc::new(TestRates {
                online: rates_online,
                calls: AtomicUsize::new(0),
            }),
            partners: Arc::new(TestPartners {
                online: partners_online,
                known: KNOWN.into_iter().collect(),
            }),
            today: None,
        }
    }

    /// Pin the business date instead of following the UTC calendar
    pub fn on(self, today: time::Date) -> Self {
        Self {
            today: Some(today),
            ..self
        }
    }

    pub fn rate_calls(&self) -> usize {
        self.rates.calls()
    }

    fn permissions(&self, context: &Authorization<Bearer>) -> Permissions {
        context.0.token().parse().unwrap_or_default()
    }
}

impl Application for TestApp {
    type Context = Authorization<Bearer>;
    type Repository = Db;
    type Rates = TestRates;
    type Partners = TestPartners;

    fn database(&self) -> &Self::Repository {
        &self.db
    }

    fn rates(&self) -> &Self::Rates {
        &self.rates
    }

    fn partners(&self) -> &Self::Partners {
        &self.partners
    }

    fn now(&self) -> DateTime {
        time::OffsetDateTime::now_utc().into()
    }

    fn today(&self) -> time::Date {
        self.today.unwrap_or_else(|| self.now().date())
    }

    async fn can_view(&self, context: &Self::Context) -> bool {
        self.permissions(context).view
    }

    async fn can_edit(&self, context: &Self::Context) -> Option<String> {
        self.permissions(context).edit.then(|| "editor".to_owned())
    }

    async fn can_administer(&self, context: &Self::Context) -> Option<String> {
        self.permissions(context).admin.then(|| "admin".to_owned())
    }
}
