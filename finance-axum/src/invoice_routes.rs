//! REST API endpoints for invoices.
//!
//! Creating or editing an invoice also checks that its partner exists in the
//! partner directory. Deleting an invoice cancels it: the row stays, its
//! status becomes Cancelled and its ledger effect is reversed.

use crate::{ApiApplication, access, error::ApiError};
use aide::axum::{ApiRouter, routing::get};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use axum_extra::TypedHeader;
use finance_api::{
    models::{Failure, Invoice, InvoiceData, InvoiceId, PartnerId},
    ports::{Application as _, InvoiceRepository as _},
};
use headers::{Authorization, authorization::Bearer};
use schemars::JsonSchema;
use serde::Deserialize;

/// Path parameter for invoice-specific endpoints.
#[derive(Deserialize, JsonSchema)]
struct Id {
    /// The unique identifier of the invoice
    invoice_id: InvoiceId,
}

#[derive(Deserialize, JsonSchema)]
struct Partner {
    /// The partner's directory key
    partner_id: PartnerId,
}

/// Creates a router with invoice endpoints.
pub fn router<T: ApiApplication>() -> ApiRouter<T> {
    ApiRouter::new()
        .api_route_with(
            "/",
            get(list_invoices::<T>).post(create_invoice::<T>),
            |route| route.security_requirement("jwt").tag("invoice"),
        )
        .api_route_with(
            "/{invoice_id}",
            get(get_invoice::<T>)
                .put(update_invoice::<T>)
                .delete(cancel_invoice::<T>),
            |route| route.security_requirement("jwt").tag("invoice"),
        )
        .api_route_with(
            "/partner/{partner_id}",
            get(partner_invoices::<T>),
            |route| route.security_requirement("jwt").tag("invoice"),
        )
}

async fn list_invoices<T: ApiApplication>(
    State(app): State<T>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Vec<Invoice>>, ApiError> {
    access::view(&app, &auth).await?;
    let invoices = app
        .database()
        .list_invoices()
        .await
        .map_err(ApiError::repository)?;
    Ok(Json(invoices))
}

async fn get_invoice<T: ApiApplication>(
    State(app): State<T>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(Id { invoice_id }): Path<Id>,
) -> Result<Json<Invoice>, ApiError> {
    access::view(&app, &auth).await?;
    app.database()
        .get_invoice(invoice_id)
        .await
        .map_err(ApiError::repository)?
        .map(Json)
        .ok_or_else(|| Failure::InvoiceNotFound(invoice_id).into())
}

/// List a partner's invoices.
///
/// # Returns
///
/// - `200 OK`: The invoices, oldest first
/// - `404 Not Found`: The partner has no invoices
async fn partner_invoices<T: ApiApplication>(
    State(app): State<T>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(Partner { partner_id }): Path<Partner>,
) -> Result<Json<Vec<Invoice>>, ApiError> {
    access::view(&app, &auth).await?;
    let invoices = app
        .database()
        .invoices_for_partner(partner_id)
        .await
        .map_err(ApiError::repository)?;
    Ok(Json(invoices))
}

/// Create an invoice and post it to the ledger.
///
/// # Returns
///
/// - `201 Created`: The stored invoice
/// - `400 Bad Request`: A field failed validation
/// - `401 Unauthorized`: Missing edit permissions
/// - `404 Not Found`: The partner directory does not know the partner
/// - `502 Bad Gateway`: No exchange rate for the issue date
/// - `503 Service Unavailable`: The partner directory could not be reached
async fn create_invoice<T: ApiApplication>(
    State(app): State<T>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(data): Json<InvoiceData>,
) -> Result<(StatusCode, Json<Invoice>), ApiError> {
    let stamp = access::edit(&app, &auth).await?;
    access::partner(&app, data.partner_id).await?;
    let invoice = app
        .database()
        .create_invoice(data, &stamp, app.rates())
        .await
        .map_err(ApiError::repository)?;
    Ok((StatusCode::CREATED, Json(invoice)))
}

/// Edit an unpaid invoice.
///
/// The partner, currency and issue date cannot change; a change of total posts
/// the difference to the ledger.
async fn update_invoice<T: ApiApplication>(
    State(app): State<T>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(Id { invoice_id }): Path<Id>,
    Json(data): Json<InvoiceData>,
) -> Result<Json<Invoice>, ApiError> {
    let stamp = access::edit(&app, &auth).await?;
    access::partner(&app, data.partner_id).await?;
    app.database()
        .update_invoice(invoice_id, data, &stamp, app.rates())
        .await
        .map_err(ApiError::repository)?
        .map(Json)
        .ok_or_else(|| Failure::InvoiceNotFound(invoice_id).into())
}

/// Cancel an invoice.
///
/// # Returns
///
/// - `204 No Content`: The invoice is cancelled, or already was
/// - `400 Bad Request`: Payments have been allocated to the invoice
/// - `404 Not Found`: No such invoice
async fn cancel_invoice<T: ApiApplication>(
    State(app): State<T>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(Id { invoice_id }): Path<Id>,
) -> Result<StatusCode, ApiError> {
    let stamp = access::edit(&app, &auth).await?;
    let cancelled = app
        .database()
        .cancel_invoice(invoice_id, &stamp, app.rates())
        .await
        .map_err(ApiError::repository)?;
    if cancelled {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(Failure::InvoiceNotFound(invoice_id).into())
    }
}
