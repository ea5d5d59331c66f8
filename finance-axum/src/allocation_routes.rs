//! REST API endpoints for allocating payments to invoices.

use crate::{ApiApplication, access, error::ApiError};
use aide::axum::{
    ApiRouter,
    routing::{get, post},
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use axum_extra::TypedHeader;
use finance_api::{
    models::{AllocationRequest, Failure, InvoiceId, LedgerEntry, PartnerId, PaymentId},
    ports::{
        AllocationRepository as _, Application as _, InvoiceRepository as _,
        PaymentRepository as _,
    },
};
use headers::{Authorization, authorization::Bearer};
use schemars::JsonSchema;
use serde::Deserialize;

#[derive(Deserialize, JsonSchema)]
struct Partner {
    /// The partner's directory key
    partner_id: PartnerId,
}

#[derive(Deserialize, JsonSchema)]
struct Payment {
    /// The unique identifier of the payment
    payment_id: PaymentId,
}

#[derive(Deserialize, JsonSchema)]
struct Invoice {
    /// The unique identifier of the invoice
    invoice_id: InvoiceId,
}

/// Creates a router with allocation endpoints.
pub fn router<T: ApiApplication>() -> ApiRouter<T> {
    ApiRouter::new()
        .api_route_with(
            "/client/{partner_id}",
            get(partner_allocations::<T>),
            |route| route.security_requirement("jwt").tag("allocation"),
        )
        .api_route_with(
            "/payment/{payment_id}",
            get(payment_allocations::<T>),
            |route| route.security_requirement("jwt").tag("allocation"),
        )
        .api_route_with(
            "/invoice/{invoice_id}",
            get(invoice_allocations::<T>),
            |route| route.security_requirement("jwt").tag("allocation"),
        )
        .api_route_with("/allocate", post(allocate::<T>), |route| {
            route.security_requirement("jwt").tag("allocation")
        })
        .api_route_with("/deallocate", post(deallocate::<T>), |route| {
            route.security_requirement("jwt").tag("allocation")
        })
}

async fn partner_allocations<T: ApiApplication>(
    State(app): State<T>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(Partner { partner_id }): Path<Partner>,
) -> Result<Json<Vec<LedgerEntry>>, ApiError> {
    access::view(&app, &auth).await?;
    let entries = app
        .database()
        .allocations_for_partner(partner_id)
        .await
        .map_err(ApiError::repository)?;
    Ok(Json(entries))
}

/// The allocation rows of a payment, along with the conversion legs of any
/// cross-currency allocations.
async fn payment_allocations<T: ApiApplication>(
    State(app): State<T>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(Payment { payment_id }): Path<Payment>,
) -> Result<Json<Vec<LedgerEntry>>, ApiError> {
    access::view(&app, &auth).await?;
    let entries = app
        .database()
        .allocations_for_payment(payment_id)
        .await
        .map_err(ApiError::repository)?;
    Ok(Json(entries))
}

async fn invoice_allocations<T: ApiApplication>(
    State(app): State<T>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(Invoice { invoice_id }): Path<Invoice>,
) -> Result<Json<Vec<LedgerEntry>>, ApiError> {
    access::view(&app, &auth).await?;
    let entries = app
        .database()
        .allocations_for_invoice(invoice_id)
        .await
        .map_err(ApiError::repository)?;
    Ok(Json(entries))
}

/// Confirm that both sides of an allocation exist, along with their partners.
async fn check_partners<T: ApiApplication>(
    app: &T,
    request: &AllocationRequest,
) -> Result<(), ApiError> {
    let db = app.database();
    let payment = db
        .get_payment(request.payment_id)
        .await
        .map_err(ApiError::repository)?
        .ok_or(Failure::PaymentNotFound(request.payment_id))?;
    let invoice = db
        .get_invoice(request.invoice_id)
        .await
        .map_err(ApiError::repository)?
        .ok_or(Failure::InvoiceNotFound(request.invoice_id))?;

    access::partner(app, payment.data.partner_id).await?;
    if invoice.data.partner_id != payment.data.partner_id {
        access::partner(app, invoice.data.partner_id).await?;
    }
    Ok(())
}

/// Allocate part of a payment to an invoice.
///
/// The amount is in the payment's currency. When the invoice is in another
/// currency the amount is converted at the invoice's issue date, and the
/// ledger records the conversion alongside the allocation.
///
/// # Returns
///
/// - `201 Created`: The allocation's ledger row
/// - `400 Bad Request`: The amount is too small, exceeds what is unallocated or
///   outstanding, the partners differ, or the invoice is cancelled
/// - `401 Unauthorized`: Missing edit permissions
/// - `404 Not Found`: The payment, the invoice or a partner does not exist
/// - `502 Bad Gateway`: No exchange rate for the conversion
/// - `503 Service Unavailable`: The partner directory could not be reached
async fn allocate<T: ApiApplication>(
    State(app): State<T>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(request): Json<AllocationRequest>,
) -> Result<(StatusCode, Json<LedgerEntry>), ApiError> {
    let stamp = access::edit(&app, &auth).await?;
    check_partners(&app, &request).await?;
    let entry = app
        .database()
        .allocate(request, &stamp, app.rates())
        .await
        .map_err(ApiError::repository)?;
    Ok((StatusCode::CREATED, Json(entry)))
}

/// Undo (part of) an earlier allocation, returning the reversing ledger row.
async fn deallocate<T: ApiApplication>(
    State(app): State<T>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(request): Json<AllocationRequest>,
) -> Result<Json<LedgerEntry>, ApiError> {
    let stamp = access::edit(&app, &auth).await?;
    check_partners(&app, &request).await?;
    let entry = app
        .database()
        .deallocate(request, &stamp, app.rates())
        .await
        .map_err(ApiError::repository)?;
    Ok(Json(entry))
}
