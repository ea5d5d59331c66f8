//! OpenAPI document generation and the RapiDoc viewer.

use std::sync::Arc;

use aide::{
    axum::{ApiRouter, IntoApiResponse, routing::get},
    openapi::{OpenApi, SecurityScheme, Tag},
    transform::TransformOpenApi,
};
use axum::{
    Extension, Json,
    response::{Html, IntoResponse},
};

const RAPIDOC: &str = r#"<!doctype html>
<html>
  <head>
    <meta charset="utf-8">
    <title>Finance API</title>
    <script type="module" src="https://unpkg.com/rapidoc/dist/rapidoc-min.js"></script>
  </head>
  <body>
    <rapi-doc spec-url="/docs/api.json"
        render-style="focused"
        show-method-in-nav-bar="as-colored-text"
        use-path-in-nav-bar="true"
        allow-authentication="true"
    ></rapi-doc>
  </body>
</html>"#;

async fn serve_rapidoc() -> impl IntoApiResponse {
    Html(RAPIDOC).into_response()
}

/// Serve the generated OpenAPI document as JSON.
async fn serve_docs(Extension(api): Extension<Arc<OpenApi>>) -> impl IntoApiResponse {
    Json(api).into_response()
}

/// Creates a router for documentation endpoints.
pub(crate) fn docs_routes() -> ApiRouter {
    ApiRouter::new()
        .route("/", get(serve_rapidoc))
        .route("/api.json", get(serve_docs))
}

fn tag(name: &str, description: &str) -> Tag {
    Tag {
        name: name.into(),
        description: Some(description.into()),
        ..Default::default()
    }
}

/// Configure the OpenAPI documentation metadata.
pub(crate) fn api_docs(api: TransformOpenApi) -> TransformOpenApi {
    api.title("Finance API")
        .summary("Invoices, payments, allocations and an FX-aware ledger.")
        .description(
            "Record what partners owe and pay, settle invoices against payments in any \
             currency, and report partner balances in rubles using central bank rates.",
        )
        .version("0.2")
        .security_scheme(
            "jwt",
            SecurityScheme::Http {
                scheme: "bearer".into(),
                bearer_format: Some("JWT".into()),
                description: None,
                extensions: Default::default(),
            },
        )
        .tag(tag("currency", "The currency reference table"))
        .tag(tag("paymentType", "Ways a payment can be made"))
        .tag(tag("paymentStatus", "Payment processing states"))
        .tag(tag("invoiceStatus", "Invoice lifecycle states"))
        .tag(tag("serviceType", "Services an invoice can bill for"))
        .tag(tag("referenceType", "What a ledger row refers to"))
        .tag(tag("invoice", "Invoices issued to or received from partners"))
        .tag(tag("payment", "Money received from or paid to partners"))
        .tag(tag("allocation", "Settling invoices against payments"))
        .tag(tag("ledger", "The signed record of every money movement"))
        .tag(tag("exchangeRate", "Central bank rates and conversions"))
        .tag(tag("balance", "Partner balance reports"))
        .tag(tag(
            "admin",
            "Operations requiring the administrator permission",
        ))
}
