//! REST API endpoints for the currency reference table.

use crate::{ApiApplication, access, error::ApiError};
use aide::axum::{ApiRouter, routing::get};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use axum_extra::TypedHeader;
use finance_api::{
    models::{Currency, CurrencyData, CurrencyId, Failure},
    ports::{Application as _, CurrencyRepository as _},
};
use headers::{Authorization, authorization::Bearer};
use schemars::JsonSchema;
use serde::Deserialize;

/// Path parameter for currency-specific endpoints.
#[derive(Deserialize, JsonSchema)]
struct Id {
    /// The unique identifier of the currency
    currency_id: CurrencyId,
}

#[derive(Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct ListQuery {
    /// Only list currencies that receive exchange rates
    #[serde(default)]
    enabled_only: bool,
}

/// Creates a router with currency endpoints.
pub fn router<T: ApiApplication>() -> ApiRouter<T> {
    ApiRouter::new()
        .api_route_with(
            "/",
            get(list_currencies::<T>).post(create_currency::<T>),
            |route| route.security_requirement("jwt").tag("currency"),
        )
        .api_route_with(
            "/{currency_id}",
            get(get_currency::<T>)
                .put(update_currency::<T>)
                .delete(delete_currency::<T>),
            |route| route.security_requirement("jwt").tag("currency"),
        )
}

/// List currencies, optionally only the enabled ones.
async fn list_currencies<T: ApiApplication>(
    State(app): State<T>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Currency>>, ApiError> {
    access::view(&app, &auth).await?;
    let currencies = app
        .database()
        .list_currencies(query.enabled_only)
        .await
        .map_err(ApiError::repository)?;
    Ok(Json(currencies))
}

/// Retrieve a currency.
///
/// # Returns
///
/// - `200 OK`: The currency
/// - `401 Unauthorized`: Missing view permissions
/// - `404 Not Found`: No such currency
async fn get_currency<T: ApiApplication>(
    State(app): State<T>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(Id { currency_id }): Path<Id>,
) -> Result<Json<Currency>, ApiError> {
    access::view(&app, &auth).await?;
    app.database()
        .get_currency(currency_id)
        .await
        .map_err(ApiError::repository)?
        .map(Json)
        .ok_or_else(|| Failure::CurrencyNotFound(currency_id).into())
}

/// Create a currency.
///
/// # Returns
///
/// - `201 Created`: The stored currency
/// - `400 Bad Request`: A field failed validation
/// - `401 Unauthorized`: Missing administrator permissions
/// - `409 Conflict`: The code is already taken
async fn create_currency<T: ApiApplication>(
    State(app): State<T>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(data): Json<CurrencyData>,
) -> Result<(StatusCode, Json<Currency>), ApiError> {
    let stamp = access::administer(&app, &auth).await?;
    let currency = app
        .database()
        .create_currency(data, &stamp)
        .await
        .map_err(ApiError::repository)?;
    Ok((StatusCode::CREATED, Json(currency)))
}

/// Replace a currency's fields.
async fn update_currency<T: ApiApplication>(
    State(app): State<T>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(Id { currency_id }): Path<Id>,
    Json(data): Json<CurrencyData>,
) -> Result<Json<Currency>, ApiError> {
    let stamp = access::administer(&app, &auth).await?;
    app.database()
        .update_currency(currency_id, data, &stamp)
        .await
        .map_err(ApiError::repository)?
        .map(Json)
        .ok_or_else(|| Failure::CurrencyNotFound(currency_id).into())
}

/// Delete a currency.
///
/// # Returns
///
/// - `204 No Content`: The currency was deleted
/// - `404 Not Found`: No such currency
/// - `409 Conflict`: The currency is still referenced
async fn delete_currency<T: ApiApplication>(
    State(app): State<T>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(Id { currency_id }): Path<Id>,
) -> Result<StatusCode, ApiError> {
    access::administer(&app, &auth).await?;
    let deleted = app
        .database()
        .delete_currency(currency_id)
        .await
        .map_err(ApiError::repository)?;
    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(Failure::CurrencyNotFound(currency_id).into())
    }
}
