//! REST API endpoint for the partner balance report.

use crate::{ApiApplication, access, error::ApiError};
use aide::axum::{ApiRouter, routing::get};
use axum::{
    Json,
    extract::{Path, Query, State},
};
use axum_extra::TypedHeader;
use finance_api::{
    models::{PartnerBalanceReport, PartnerId},
    ports::{Application as _, BalanceRepository as _},
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
#[serde(rename_all = "camelCase")]
struct ReportQuery {
    /// The day whose rates price the ruble columns, as `YYYY-MM-DD`; defaults to today
    #[schemars(with = "Option<String>")]
    report_date: Option<time::Date>,
}

/// Creates a router with the balance report endpoint.
pub fn router<T: ApiApplication>() -> ApiRouter<T> {
    ApiRouter::new().api_route_with("/{partner_id}", get(balance_report::<T>), |route| {
        route.security_requirement("jwt").tag("balance")
    })
}

/// A partner's balances per currency.
///
/// Each row reports the unallocated money of completed payments and what is
/// still owed on unpaid and partially paid invoices, with the leftover and
/// outstanding columns also priced in rubles.
///
/// # Returns
///
/// - `200 OK`: The report
/// - `404 Not Found`: The partner directory does not know the partner
/// - `502 Bad Gateway`: No exchange rate for the report date
/// - `503 Service Unavailable`: The partner directory could not be reached
async fn balance_report<T: ApiApplication>(
    State(app): State<T>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(Partner { partner_id }): Path<Partner>,
    Query(ReportQuery { report_date }): Query<ReportQuery>,
) -> Result<Json<PartnerBalanceReport>, ApiError> {
    access::view(&app, &auth).await?;
    access::partner(&app, partner_id).await?;
    let report_date = report_date.unwrap_or_else(|| app.today());
    let report = app
        .database()
        .partner_balance_report(partner_id, report_date, app.rates())
        .await
        .map_err(ApiError::repository)?;
    Ok(Json(report))
}
