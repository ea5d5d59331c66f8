//! REST API endpoints for payments.

use crate::{ApiApplication, access, error::ApiError};
use aide::axum::{ApiRouter, routing::get};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use axum_extra::TypedHeader;
use finance_api::{
    models::{Failure, PartnerId, Payment, PaymentData, PaymentId},
    ports::{Application as _, PaymentRepository as _},
};
use headers::{Authorization, authorization::Bearer};
use schemars::JsonSchema;
use serde::Deserialize;

/// Path parameter for payment-specific endpoints.
#[derive(Deserialize, JsonSchema)]
struct Id {
    /// The unique identifier of the payment
    payment_id: PaymentId,
}

#[derive(Deserialize, JsonSchema)]
struct Partner {
    /// The partner's directory key
    partner_id: PartnerId,
}

/// Creates a router with payment endpoints.
pub fn router<T: ApiApplication>() -> ApiRouter<T> {
    ApiRouter::new()
        .api_route_with(
            "/",
            get(list_payments::<T>).post(create_payment::<T>),
            |route| route.security_requirement("jwt").tag("payment"),
        )
        .api_route_with(
            "/{payment_id}",
            get(get_payment::<T>)
                .put(update_payment::<T>)
                .delete(delete_payment::<T>),
            |route| route.security_requirement("jwt").tag("payment"),
        )
        .api_route_with(
            "/partnerId/{partner_id}",
            get(partner_payments::<T>),
            |route| route.security_requirement("jwt").tag("payment"),
        )
}

async fn list_payments<T: ApiApplication>(
    State(app): State<T>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Vec<Payment>>, ApiError> {
    access::view(&app, &auth).await?;
    let payments = app
        .database()
        .list_payments()
        .await
        .map_err(ApiError::repository)?;
    Ok(Json(payments))
}

async fn get_payment<T: ApiApplication>(
    State(app): State<T>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(Id { payment_id }): Path<Id>,
) -> Result<Json<Payment>, ApiError> {
    access::view(&app, &auth).await?;
    app.database()
        .get_payment(payment_id)
        .await
        .map_err(ApiError::repository)?
        .map(Json)
        .ok_or_else(|| Failure::PaymentNotFound(payment_id).into())
}

/// List a partner's payments; `404 Not Found` if there are none.
async fn partner_payments<T: ApiApplication>(
    State(app): State<T>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(Partner { partner_id }): Path<Partner>,
) -> Result<Json<Vec<Payment>>, ApiError> {
    access::view(&app, &auth).await?;
    let payments = app
        .database()
        .payments_for_partner(partner_id)
        .await
        .map_err(ApiError::repository)?;
    Ok(Json(payments))
}

/// Record a payment and post it to the ledger.
///
/// The whole total (amount plus processing fees) starts out unallocated.
///
/// # Returns
///
/// - `201 Created`: The stored payment
/// - `400 Bad Request`: A field failed validation, e.g. a future payment date
/// - `401 Unauthorized`: Missing edit permissions
/// - `404 Not Found`: The partner directory does not know the partner
/// - `503 Service Unavailable`: The partner directory could not be reached
async fn create_payment<T: ApiApplication>(
    State(app): State<T>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(data): Json<PaymentData>,
) -> Result<(StatusCode, Json<Payment>), ApiError> {
    let stamp = access::edit(&app, &auth).await?;
    access::partner(&app, data.partner_id).await?;
    let payment = app
        .database()
        .create_payment(data, &stamp, app.rates())
        .await
        .map_err(ApiError::repository)?;
    Ok((StatusCode::CREATED, Json(payment)))
}

/// Edit a payment. The partner and currency are fixed, and the new total must
/// still cover whatever has been allocated.
async fn update_payment<T: ApiApplication>(
    State(app): State<T>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(Id { payment_id }): Path<Id>,
    Json(data): Json<PaymentData>,
) -> Result<Json<Payment>, ApiError> {
    let stamp = access::edit(&app, &auth).await?;
    access::partner(&app, data.partner_id).await?;
    app.database()
        .update_payment(payment_id, data, &stamp, app.rates())
        .await
        .map_err(ApiError::repository)?
        .map(Json)
        .ok_or_else(|| Failure::PaymentNotFound(payment_id).into())
}

/// Delete a payment that has no allocations, reversing its ledger entry.
async fn delete_payment<T: ApiApplication>(
    State(app): State<T>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(Id { payment_id }): Path<Id>,
) -> Result<StatusCode, ApiError> {
    let stamp = access::edit(&app, &auth).await?;
    let deleted = app
        .database()
        .delete_payment(payment_id, &stamp, app.rates())
        .await
        .map_err(ApiError::repository)?;
    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(Failure::PaymentNotFound(payment_id).into())
    }
}
