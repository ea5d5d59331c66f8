#![warn(missing_docs)]
#![doc = include_str!("../README.md")]

mod access;
mod allocation_routes;
mod balance_routes;
mod catalog_routes;
mod currency_routes;
mod error;
mod invoice_routes;
mod ledger_routes;
mod payment_routes;
mod rate_routes;

use aide::{
    axum::{ApiRouter, routing::get},
    openapi::OpenApi,
};
use axum::{Extension, Json};
use finance_api::{
    models::{InvoiceStatuses, PaymentStatuses, PaymentTypes, ReferenceTypes, ServiceTypes},
    ports::Application,
};
use headers::{Authorization, authorization::Bearer};
use schemars::JsonSchema;
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

mod openapi;
use openapi::{api_docs, docs_routes};

pub mod config;
use config::AxumConfig;

pub use error::ErrorBody;

/// Response for the health check endpoint
#[derive(Serialize, JsonSchema)]
#[schemars(inline)]
struct HealthResponse {
    status: String,
}

/// Simple health check endpoint
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// Every versioned endpoint, mounted under `/api/v1`
fn api_v1<T: ApiApplication>() -> ApiRouter<T> {
    ApiRouter::new()
        .nest("/currencies", currency_routes::router())
        .nest(
            "/paymentTypes",
            catalog_routes::router::<T, PaymentTypes>("paymentType"),
        )
        .nest(
            "/paymentStatuses",
            catalog_routes::router::<T, PaymentStatuses>("paymentStatus"),
        )
        .nest(
            "/invoiceStatuses",
            catalog_routes::router::<T, InvoiceStatuses>("invoiceStatus"),
        )
        .nest(
            "/serviceTypes",
            catalog_routes::router::<T, ServiceTypes>("serviceType"),
        )
        .nest(
            "/referenceTypes",
            catalog_routes::router::<T, ReferenceTypes>("referenceType"),
        )
        .nest("/invoices", invoice_routes::router())
        .nest("/payments", payment_routes::router())
        .nest("/allocations", allocation_routes::router())
        .nest("/ledger", ledger_routes::router())
        .nest("/exchangeRates", rate_routes::router())
        .nest("/clientBalances", balance_routes::router())
}

/// Construct a full API router with the given state
pub fn router<T: ApiApplication>(state: T) -> axum::Router {
    let mut api = OpenApi::default();
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    ApiRouter::new()
        .api_route("/health", get(health_check))
        .nest("/api/v1", api_v1::<T>())
        .nest_api_service("/docs", docs_routes())
        .finish_api_with(&mut api, api_docs)
        .layer(Extension(Arc::new(api))) // keep the document behind an Arc, it is cloned per request
        .layer(cors)
        .with_state(state)
}

/// Starts the HTTP server with the provided configuration
pub async fn start_server<T: ApiApplication>(
    config: AxumConfig,
    app: T,
) -> Result<(), std::io::Error> {
    let listener = tokio::net::TcpListener::bind(config.bind_address).await?;
    tracing::info!("Listening for requests on {}", listener.local_addr()?);

    axum::serve(listener, router(app)).await
}

/// Axum imposes all sorts of constraints on what can pass for state. This
/// trait, coupled with a blanket implementation, specifies it all upfront and
/// in one place. If a function takes a generic `T: ApiApplication`, then
/// everything one might reasonably want to do should work.
pub trait ApiApplication:
    Clone + Send + Sync + 'static + Application<Context = Authorization<Bearer>>
{
}

impl<T> ApiApplication for T where
    T: Clone + Send + Sync + 'static + Application<Context = Authorization<Bearer>>
{
}
