//! Application implementation with JWT-based authorization.
//!
//! Every request carries an HS256 token. Any token that verifies may read;
//! the custom `edit` and `admin` claims unlock writes, and the standard `sub`
//! claim names the principal recorded in audit fields.

use crate::{cbr::CbrClient, partners::PartnerClient};
use finance_api::{models::DateTime, ports::Application};
use finance_sqlite::Db;
use headers::{Authorization, authorization::Bearer};
use jwt_simple::{
    claims::JWTClaims,
    prelude::{HS256Key, MACLike},
};
use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, UtcOffset};

/// The service's composition root.
#[derive(Clone)]
pub struct FinanceApp {
    /// Persistent storage
    pub db: Db,
    /// HMAC key for JWT token verification
    pub key: HS256Key,
    /// The central bank rate source
    pub rates: CbrClient,
    /// The partner directory client
    pub partners: PartnerClient,
    /// The offset whose calendar defines the business date
    pub business_offset: UtcOffset,
}

impl FinanceApp {
    /// Extract and verify JWT claims from the authorization header.
    fn claims(&self, context: &Authorization<Bearer>) -> Option<JWTClaims<CustomClaims>> {
        let token = context.0.token();
        self.key.verify_token::<CustomClaims>(token, None).ok()
    }

    /// The calendar date at `now` in the business time zone
    fn business_date(&self, now: OffsetDateTime) -> time::Date {
        now.to_offset(self.business_offset).date()
    }

    /// The subject of a verified token whose custom claims pass `allowed`
    fn principal(
        &self,
        context: &Authorization<Bearer>,
        allowed: impl Fn(&CustomClaims) -> bool,
    ) -> Option<String> {
        let claims = self.claims(context)?;
        if allowed(&claims.custom) {
            claims.subject
        } else {
            None
        }
    }
}

impl Application for FinanceApp {
    type Context = Authorization<Bearer>;
    type Repository = Db;
    type Rates = CbrClient;
    type Partners = PartnerClient;

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
        OffsetDateTime::now_utc().into()
    }

    fn today(&self) -> time::Date {
        self.business_date(OffsetDateTime::now_utc())
    }

    async fn can_view(&self, context: &Self::Context) -> bool {
        self.claims(context).is_some()
    }

    async fn can_edit(&self, context: &Self::Context) -> Option<String> {
        // administrators may edit too
        self.principal(context, |claims| claims.edit || claims.admin)
    }

    async fn can_administer(&self, context: &Self::Context) -> Option<String> {
        self.principal(context, |claims| claims.admin)
    }
}

/// Custom claims structure for JWT tokens.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CustomClaims {
    /// Whether the holder may write invoices, payments and allocations
    #[serde(default)]
    pub edit: bool,
    /// Whether the holder may manage reference data and exchange rates
    #[serde(default)]
    pub admin: bool,
}
