//! REST API endpoints for exchange rates.

use crate::{ApiApplication, access, error::ApiError};
use aide::axum::{
    ApiRouter,
    routing::{get, post},
};
use axum::{
    Json,
    extract::{Query, State},
};
use axum_extra::TypedHeader;
use finance_api::{
    models::{Amount, Conversion, CurrencyId, ExchangeRate},
    ports::{Application as _, AsFailure as _, ExchangeRateRepository as _},
};
use headers::{Authorization, authorization::Bearer};
use schemars::JsonSchema;
use serde::Deserialize;
use tracing::{Level, event};

#[derive(Deserialize, JsonSchema)]
struct DateQuery {
    /// The day, as `YYYY-MM-DD`; defaults to today
    #[schemars(with = "Option<String>")]
    date: Option<time::Date>,
}

#[derive(Deserialize, JsonSchema)]
struct ConvertQuery {
    /// The currency `amount` is in
    from: CurrencyId,
    /// The currency to convert into
    to: CurrencyId,
    /// The amount to convert
    amount: Amount,
    /// The day whose rates to use, as `YYYY-MM-DD`; defaults to today
    #[schemars(with = "Option<String>")]
    date: Option<time::Date>,
}

/// Creates a router with exchange rate endpoints.
pub fn router<T: ApiApplication>() -> ApiRouter<T> {
    ApiRouter::new()
        .api_route_with("/", get(list_rates::<T>), |route| {
            route.security_requirement("jwt").tag("exchangeRate")
        })
        .api_route_with("/convert", get(convert::<T>), |route| {
            route.security_requirement("jwt").tag("exchangeRate")
        })
        .api_route_with("/refresh", post(refresh::<T>), |route| {
            route
                .security_requirement("jwt")
                .tag("exchangeRate")
                .tag("admin")
        })
}

/// The rates stored for a day. Never fetches; an unloaded day lists nothing.
async fn list_rates<T: ApiApplication>(
    State(app): State<T>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Query(DateQuery { date }): Query<DateQuery>,
) -> Result<Json<Vec<ExchangeRate>>, ApiError> {
    access::view(&app, &auth).await?;
    let date = date.unwrap_or_else(|| app.today());
    let rates = app
        .database()
        .rates_for_date(date)
        .await
        .map_err(ApiError::repository)?;
    Ok(Json(rates))
}

/// Convert an amount between two currencies, fetching the day's rates if they
/// have not been loaded yet.
///
/// # Returns
///
/// - `200 OK`: The conversion, rounded to cents
/// - `400 Bad Request`: The result would be less than one cent
/// - `502 Bad Gateway`: No rate is available for the day
async fn convert<T: ApiApplication>(
    State(app): State<T>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Query(query): Query<ConvertQuery>,
) -> Result<Json<Conversion>, ApiError> {
    access::view(&app, &auth).await?;
    let date = query.date.unwrap_or_else(|| app.today());
    let conversion = app
        .database()
        .convert(query.from, query.to, query.amount, date, app.rates())
        .await
        .map_err(ApiError::repository)?;
    Ok(Json(conversion))
}

/// Fetch a day's rates from the central bank, replacing any stored ones.
///
/// # Authorization
///
/// Requires administrator permissions.
///
/// # Returns
///
/// - `200 OK`: The rates now stored for the day
/// - `401 Unauthorized`: Missing administrator permissions
/// - `502 Bad Gateway`: The rate source could not be read
async fn refresh<T: ApiApplication>(
    State(app): State<T>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Query(DateQuery { date }): Query<DateQuery>,
) -> Result<Json<Vec<ExchangeRate>>, ApiError> {
    access::administer(&app, &auth).await?;
    let date = date.unwrap_or_else(|| app.today());
    let rates = app
        .database()
        .fetch_and_save(date, app.rates())
        .await
        .map_err(|err| {
            if err.as_failure().is_some() {
                ApiError::repository(err)
            } else {
                event!(Level::WARN, %date, err = err.to_string(), "rate refresh failed");
                ApiError::upstream()
            }
        })?;
    Ok(Json(rates))
}
