//! REST API endpoints for reading the ledger.

use crate::{ApiApplication, access, error::ApiError};
use aide::axum::{ApiRouter, routing::get};
use axum::{
    Json,
    extract::{Path, Query, State},
};
use axum_extra::TypedHeader;
use finance_api::{
    models::{Amount, CurrencyId, LedgerEntry, PartnerId},
    ports::{Application as _, LedgerRepository as _},
};
use headers::{Authorization, authorization::Bearer};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Deserialize, JsonSchema)]
struct Partner {
    /// The partner's directory key
    partner_id: PartnerId,
}

#[derive(Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct BalanceQuery {
    /// The currency to total; omit for the ruble balance across all currencies
    currency_id: Option<CurrencyId>,
}

/// A partner's signed ledger balance
#[derive(Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct Balance {
    partner_id: PartnerId,
    currency_id: CurrencyId,
    balance: Amount,
}

/// Creates a router with ledger endpoints.
pub fn router<T: ApiApplication>() -> ApiRouter<T> {
    ApiRouter::new()
        .api_route_with(
            "/partner/{partner_id}",
            get(partner_ledger::<T>),
            |route| route.security_requirement("jwt").tag("ledger"),
        )
        .api_route_with(
            "/partner/{partner_id}/balance",
            get(partner_balance::<T>),
            |route| route.security_requirement("jwt").tag("ledger"),
        )
}

async fn partner_ledger<T: ApiApplication>(
    State(app): State<T>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(Partner { partner_id }): Path<Partner>,
) -> Result<Json<Vec<LedgerEntry>>, ApiError> {
    access::view(&app, &auth).await?;
    let entries = app
        .database()
        .ledger_for_partner(partner_id)
        .await
        .map_err(ApiError::repository)?;
    Ok(Json(entries))
}

/// Total a partner's ledger.
///
/// With `currencyId` the result sums the rows in that currency. Without it,
/// every row's ruble amount is summed and the result is in rubles.
async fn partner_balance<T: ApiApplication>(
    State(app): State<T>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(Partner { partner_id }): Path<Partner>,
    Query(query): Query<BalanceQuery>,
) -> Result<Json<Balance>, ApiError> {
    access::view(&app, &auth).await?;
    let db = app.database();
    let (currency_id, balance) = match query.currency_id {
        Some(currency_id) => (currency_id, db.partner_balance(partner_id, currency_id).await),
        None => (CurrencyId::RUB, db.partner_base_balance(partner_id).await),
    };
    let balance = balance.map_err(ApiError::repository)?;

    Ok(Json(Balance {
        partner_id,
        currency_id,
        balance,
    }))
}
