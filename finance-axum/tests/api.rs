use axum::http::StatusCode;
use axum_test::{TestResponse, TestServer};
use finance_api::models::{
    Amount, Conversion, Currency, CurrencyId, ExchangeRate, Invoice, InvoiceId, LedgerEntry,
    LedgerReference, PartnerBalanceReport, Payment,
};
use finance_axum::{ErrorBody, router};
use rstest::rstest;
use serde_json::{Value, json};

mod app;
use app::TestApp;

const RUB: CurrencyId = CurrencyId::RUB;
const USD: CurrencyId = CurrencyId(2);

fn server(app: TestApp) -> TestServer {
    TestServer::new(router(app)).unwrap()
}

fn amount(value: &str) -> Amount {
    value.parse().unwrap()
}

#[track_caller]
fn assert_error(response: &TestResponse, status: StatusCode, key: &str) {
    response.assert_status(status);
    assert_eq!(
        response.json::<ErrorBody>(),
        ErrorBody {
            messages: vec![key.to_owned()],
            status: status.as_u16(),
        }
    );
}

fn invoice_body(partner_id: i64, currency_id: CurrencyId, total: &str) -> Value {
    json!({
        "direction": "RECEIVABLE",
        "partnerId": partner_id,
        "serviceTypeId": 1,
        "totalAmount": total,
        "currencyId": currency_id,
        "issueDate": "2025-03-03",
        "shipmentId": 42,
    })
}

fn payment_body(partner_id: i64, currency_id: CurrencyId, value: &str) -> Value {
    json!({
        "partnerId": partner_id,
        "paymentDate": "2025-03-03",
        "currencyId": currency_id,
        "amount": value,
        "paymentTypeId": 1,
    })
}

async fn create_invoice(server: &TestServer, body: Value) -> Invoice {
    let response = server
        .post("/api/v1/invoices")
        .authorization_bearer("view,edit")
        .json(&body)
        .await;
    response.assert_status(StatusCode::CREATED);
    response.json()
}

async fn create_payment(server: &TestServer, body: Value) -> Payment {
    let response = server
        .post("/api/v1/payments")
        .authorization_bearer("view,edit")
        .json(&body)
        .await;
    response.assert_status(StatusCode::CREATED);
    response.json()
}

#[test_log::test(tokio::test)]
async fn health_and_docs_are_public() {
    let server = server(TestApp::new().await);

    let health = server.get("/health").await;
    health.assert_status_ok();
    health.assert_json(&json!({ "status": "ok" }));

    let docs = server.get("/docs/api.json").await;
    docs.assert_status_ok();
    let document: Value = docs.json();
    assert!(document["paths"]["/api/v1/invoices/{invoice_id}"].is_object());
    assert!(document["components"]["securitySchemes"]["jwt"].is_object());

    server.get("/docs").await.assert_status_ok();
}

#[test_log::test(tokio::test)]
async fn permissions_are_enforced() {
    let server = server(TestApp::new().await);

    // No bearer token at all is a malformed request
    server
        .get("/api/v1/currencies")
        .await
        .assert_status_bad_request();

    let response = server
        .get("/api/v1/currencies")
        .authorization_bearer("nothing")
        .await;
    assert_error(&response, StatusCode::UNAUTHORIZED, "error.unauthorized");

    // Editors cannot touch reference data
    let response = server
        .post("/api/v1/currencies")
        .authorization_bearer("view,edit")
        .json(&json!({ "code": "GBP", "okvCode": "826", "name": "Pound sterling" }))
        .await;
    assert_error(&response, StatusCode::UNAUTHORIZED, "error.unauthorized");

    // Viewers cannot record payments
    let response = server
        .post("/api/v1/payments")
        .authorization_bearer("view")
        .json(&payment_body(1, RUB, "100.00"))
        .await;
    assert_error(&response, StatusCode::UNAUTHORIZED, "error.unauthorized");
}

#[test_log::test(tokio::test)]
async fn currencies_are_managed_by_administrators() {
    let server = server(TestApp::new().await);

    let seeded: Vec<Currency> = server
        .get("/api/v1/currencies")
        .authorization_bearer("view")
        .await
        .json();
    let codes: Vec<_> = seeded.iter().map(|c| c.data.code.as_str()).collect();
    assert_eq!(codes, vec!["RUB", "USD", "EUR", "CNY"]);

    let body = json!({ "code": "GBP", "okvCode": "826", "name": "Pound sterling" });
    let response = server
        .post("/api/v1/currencies")
        .authorization_bearer("view,admin")
        .json(&body)
        .await;
    response.assert_status(StatusCode::CREATED);
    let pound: Currency = response.json();
    assert_eq!(pound.data.code, "GBP");
    assert!(pound.data.enabled);
    assert_eq!(pound.audit.created_by, "admin");

    let response = server
        .post("/api/v1/currencies")
        .authorization_bearer("admin")
        .json(&body)
        .await;
    assert_error(
        &response,
        StatusCode::CONFLICT,
        "error.database.uniqueConstraintViolation",
    );

    let response = server
        .post("/api/v1/currencies")
        .authorization_bearer("admin")
        .json(&json!({ "code": "gbp", "okvCode": "826", "name": "Pound sterling" }))
        .await;
    assert_error(
        &response,
        StatusCode::BAD_REQUEST,
        "validation.currency.code.pattern",
    );

    let path = format!("/api/v1/currencies/{}", pound.id);
    server
        .delete(&path)
        .authorization_bearer("admin")
        .await
        .assert_status(StatusCode::NO_CONTENT);
    let response = server.get(&path).authorization_bearer("view").await;
    assert_error(&response, StatusCode::NOT_FOUND, "error.currency.notFound");
    let response = server.delete(&path).authorization_bearer("admin").await;
    assert_error(&response, StatusCode::NOT_FOUND, "error.currency.notFound");
}

#[test_log::test(tokio::test)]
async fn catalogs_share_one_shape() {
    let server = server(TestApp::new().await);

    let statuses: Vec<Value> = server
        .get("/api/v1/paymentStatuses")
        .authorization_bearer("view")
        .await
        .json();
    assert_eq!(statuses.len(), 3);

    let cancelled: Value = server
        .get("/api/v1/invoiceStatuses/3")
        .authorization_bearer("view")
        .await
        .json();
    assert_eq!(cancelled["name"], "Cancelled");
    assert_eq!(cancelled["localizations"]["en"], "Cancelled");

    let response = server
        .post("/api/v1/serviceTypes")
        .authorization_bearer("admin")
        .json(&json!({ "name": "Warehousing" }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let created: Value = response.json();
    assert_eq!(created["name"], "Warehousing");

    let response = server
        .post("/api/v1/serviceTypes")
        .authorization_bearer("admin")
        .json(&json!({ "name": "X" }))
        .await;
    assert_error(
        &response,
        StatusCode::BAD_REQUEST,
        "validation.serviceType.name.size",
    );

    let response = server
        .get("/api/v1/referenceTypes/99")
        .authorization_bearer("view")
        .await;
    assert_error(&response, StatusCode::NOT_FOUND, "error.referenceType.notFound");

    // A payment type in use cannot be removed
    create_payment(&server, payment_body(1, RUB, "10.00")).await;
    let response = server
        .delete("/api/v1/paymentTypes/1")
        .authorization_bearer("admin")
        .await;
    assert_error(
        &response,
        StatusCode::CONFLICT,
        "error.database.foreignKeyConstraintViolation",
    );
}

#[test_log::test(tokio::test)]
async fn invoices_post_to_the_ledger() {
    let server = server(TestApp::new().await);

    let invoice = create_invoice(&server, invoice_body(1, RUB, "9000.00")).await;
    assert_eq!(invoice.outstanding_balance, amount("9000.00"));
    assert_eq!(invoice.audit.created_by, "editor");

    let rows: Vec<LedgerEntry> = server
        .get("/api/v1/ledger/partner/1")
        .authorization_bearer("view")
        .await
        .json();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].reference, LedgerReference::Invoice);
    assert_eq!(rows[0].amount, amount("-9000.00"));

    let balance: Value = server
        .get("/api/v1/ledger/partner/1/balance")
        .add_query_param("currencyId", 1)
        .authorization_bearer("view")
        .await
        .json();
    assert_eq!(balance["currencyId"], 1);
    assert_eq!(
        serde_json::from_value::<Amount>(balance["balance"].clone()).unwrap(),
        amount("-9000.00")
    );

    let listed: Vec<Invoice> = server
        .get("/api/v1/invoices/partner/1")
        .authorization_bearer("view")
        .await
        .json();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, invoice.id);
    let response = server
        .get("/api/v1/invoices/partner/2")
        .authorization_bearer("view")
        .await;
    assert_error(
        &response,
        StatusCode::NOT_FOUND,
        "error.invoice.partner.notFound",
    );

    // Cancelling reverses the ledger effect
    let path = format!("/api/v1/invoices/{}", invoice.id);
    server
        .delete(&path)
        .authorization_bearer("edit")
        .await
        .assert_status(StatusCode::NO_CONTENT);
    let cancelled: Invoice = server.get(&path).authorization_bearer("view").await.json();
    assert!(cancelled.is_cancelled());

    let balance: Value = server
        .get("/api/v1/ledger/partner/1/balance")
        .authorization_bearer("view")
        .await
        .json();
    assert!(
        serde_json::from_value::<Amount>(balance["balance"].clone())
            .unwrap()
            .is_zero()
    );

    let response = server.get("/api/v1/invoices/999").authorization_bearer("view").await;
    assert_error(&response, StatusCode::NOT_FOUND, "error.invoice.notFound");
}

#[test_log::test(tokio::test)]
async fn partners_are_checked_against_the_directory() {
    let server = server(TestApp::new().await);

    let response = server
        .post("/api/v1/invoices")
        .authorization_bearer("edit")
        .json(&invoice_body(7, RUB, "100.00"))
        .await;
    assert_error(&response, StatusCode::NOT_FOUND, "error.partner.notFound");

    let response = server
        .get("/api/v1/clientBalances/7")
        .authorization_bearer("view")
        .await;
    assert_error(&response, StatusCode::NOT_FOUND, "error.partner.notFound");

    let offline = self::server(TestApp::with(true, false).await);
    let response = offline
        .post("/api/v1/payments")
        .authorization_bearer("edit")
        .json(&payment_body(1, RUB, "100.00"))
        .await;
    assert_error(
        &response,
        StatusCode::SERVICE_UNAVAILABLE,
        "error.partner.unavailable",
    );
}

#[test_log::test(tokio::test)]
async fn allocations_settle_across_currencies() {
    let server = server(TestApp::new().await);

    let payment = create_payment(&server, payment_body(1, USD, "100.00")).await;
    let invoice = create_invoice(&server, invoice_body(1, RUB, "9000.00")).await;
    let request = json!({
        "paymentId": payment.id,
        "invoiceId": invoice.id,
        "allocatedAmount": "10.00",
    });

    let response = server
        .post("/api/v1/allocations/allocate")
        .authorization_bearer("edit")
        .json(&request)
        .await;
    response.assert_status(StatusCode::CREATED);
    let entry: LedgerEntry = response.json();
    assert_eq!(entry.reference, LedgerReference::Allocation);
    assert_eq!(entry.currency_id, RUB);
    assert_eq!(entry.amount, amount("900.00"));

    let legs: Vec<LedgerEntry> = server
        .get(&format!("/api/v1/allocations/payment/{}", payment.id))
        .authorization_bearer("view")
        .await
        .json();
    assert_eq!(legs.len(), 3);

    let report: PartnerBalanceReport = server
        .get("/api/v1/clientBalances/1")
        .add_query_param("reportDate", "2025-03-03")
        .authorization_bearer("view")
        .await
        .json();
    let dollars = report.row(USD).unwrap();
    assert_eq!(dollars.leftover, amount("90.00"));
    assert_eq!(dollars.leftover_rub, amount("8100.00"));
    let rubles = report.row(RUB).unwrap();
    assert_eq!(rubles.partially_paid, amount("8100.00"));
    assert_eq!(report.total_outstanding_rub, amount("8100.00"));

    // Taking it back restores both sides
    let response = server
        .post("/api/v1/allocations/deallocate")
        .authorization_bearer("edit")
        .json(&request)
        .await;
    response.assert_status_ok();
    let reversal: LedgerEntry = response.json();
    assert_eq!(reversal.amount, amount("-900.00"));

    let payment: Payment = server
        .get(&format!("/api/v1/payments/{}", payment.id))
        .authorization_bearer("view")
        .await
        .json();
    assert_eq!(payment.unallocated_amount, amount("100.00"));

    // Only one allocation's worth was ever made
    let response = server
        .post("/api/v1/allocations/deallocate")
        .authorization_bearer("edit")
        .json(&request)
        .await;
    assert_error(
        &response,
        StatusCode::BAD_REQUEST,
        "error.allocation.noExistingAllocationForPaymentInvoice",
    );
}

/// Which invoice an allocation request points at
#[derive(Debug, Clone, Copy)]
enum Target {
    Own,
    OtherPartner,
    Missing,
}

#[rstest]
#[case::zero(Target::Own, "0.00", StatusCode::BAD_REQUEST, "validation.paymentAllocation.allocatedAmount.min")]
#[case::over_outstanding(Target::Own, "60.00", StatusCode::BAD_REQUEST, "validation.paymentAllocation.allocatedAmount.exceedsOutstanding")]
#[case::over_unallocated(Target::Own, "150.00", StatusCode::BAD_REQUEST, "validation.paymentAllocation.allocatedAmount.exceedsUnallocated")]
#[case::oversized(Target::Own, "12345678901.00", StatusCode::BAD_REQUEST, "validation.paymentAllocation.allocatedAmount.format")]
#[case::partner_mismatch(Target::OtherPartner, "10.00", StatusCode::BAD_REQUEST, "error.paymentInvoice.paymentAndInvoiceClientMismatch")]
#[case::missing_invoice(Target::Missing, "10.00", StatusCode::NOT_FOUND, "error.invoice.notFound")]
#[test_log::test(tokio::test)]
async fn allocations_are_validated(
    #[case] target: Target,
    #[case] value: &str,
    #[case] status: StatusCode,
    #[case] key: &str,
) {
    let server = server(TestApp::new().await);

    let payment = create_payment(&server, payment_body(1, RUB, "100.00")).await;
    let own = create_invoice(&server, invoice_body(1, RUB, "50.00")).await;
    let other = create_invoice(&server, invoice_body(2, RUB, "50.00")).await;
    let invoice_id = match target {
        Target::Own => own.id,
        Target::OtherPartner => other.id,
        Target::Missing => InvoiceId(999),
    };

    let response = server
        .post("/api/v1/allocations/allocate")
        .authorization_bearer("edit")
        .json(&json!({
            "paymentId": payment.id,
            "invoiceId": invoice_id,
            "allocatedAmount": value,
        }))
        .await;
    assert_error(&response, status, key);

    // Nothing was allocated
    let response = server
        .get("/api/v1/allocations/client/1")
        .authorization_bearer("view")
        .await;
    assert_error(&response, StatusCode::NOT_FOUND, "error.paymentInvoice.client.notFound");
}

#[test_log::test(tokio::test)]
async fn settled_invoices_are_locked() {
    let server = server(TestApp::new().await);

    let payment = create_payment(&server, payment_body(1, RUB, "100.00")).await;
    let invoice = create_invoice(&server, invoice_body(1, RUB, "50.00")).await;
    let other = create_invoice(&server, invoice_body(2, RUB, "50.00")).await;

    let allocate = |invoice_id: InvoiceId, value: &str| {
        server
            .post("/api/v1/allocations/allocate")
            .authorization_bearer("edit")
            .json(&json!({
                "paymentId": payment.id,
                "invoiceId": invoice_id,
                "allocatedAmount": value,
            }))
    };

    allocate(invoice.id, "50.00")
        .await
        .assert_status(StatusCode::CREATED);

    let response = server
        .get(&format!("/api/v1/allocations/invoice/{}", other.id))
        .authorization_bearer("view")
        .await;
    assert_error(
        &response,
        StatusCode::NOT_FOUND,
        "error.paymentInvoice.invoice.notFound",
    );
    let rows: Vec<LedgerEntry> = server
        .get("/api/v1/allocations/client/1")
        .authorization_bearer("view")
        .await
        .json();
    assert_eq!(rows.len(), 1);

    // A settled invoice can no longer be cancelled
    let response = server
        .delete(&format!("/api/v1/invoices/{}", invoice.id))
        .authorization_bearer("edit")
        .await;
    assert_error(&response, StatusCode::BAD_REQUEST, "error.invoice.update");
}

#[test_log::test(tokio::test)]
async fn exchange_rates_are_fetched_on_demand() {
    let app = TestApp::new().await;
    let server = server(app.clone());

    let response = server
        .get("/api/v1/exchangeRates/convert")
        .add_query_param("from", 2)
        .add_query_param("to", 1)
        .add_query_param("amount", "10.00")
        .add_query_param("date", "2025-03-03")
        .authorization_bearer("view")
        .await;
    response.assert_status_ok();
    let conversion: Conversion = response.json();
    assert_eq!(conversion.converted, amount("900.00"));
    assert_eq!(app.rate_calls(), 1);

    let stored: Vec<ExchangeRate> = server
        .get("/api/v1/exchangeRates")
        .add_query_param("date", "2025-03-03")
        .authorization_bearer("view")
        .await
        .json();
    assert_eq!(stored.len(), 3);

    let response = server
        .post("/api/v1/exchangeRates/refresh")
        .add_query_param("date", "2025-03-04")
        .authorization_bearer("view")
        .await;
    assert_error(&response, StatusCode::UNAUTHORIZED, "error.unauthorized");

    let response = server
        .post("/api/v1/exchangeRates/refresh")
        .add_query_param("date", "2025-03-04")
        .authorization_bearer("admin")
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Vec<ExchangeRate>>().len(), 3);
    assert_eq!(app.rate_calls(), 2);
}

#[test_log::test(tokio::test)]
async fn unreachable_rate_source_is_a_bad_gateway() {
    let server = server(TestApp::with(false, true).await);

    let response = server
        .get("/api/v1/exchangeRates/convert")
        .add_query_param("from", 2)
        .add_query_param("to", 1)
        .add_query_param("amount", "10.00")
        .add_query_param("date", "2025-03-03")
        .authorization_bearer("view")
        .await;
    assert_error(
        &response,
        StatusCode::BAD_GATEWAY,
        "error.exchangeRate.retrievalFailed",
    );

    let response = server
        .post("/api/v1/exchangeRates/refresh")
        .authorization_bearer("admin")
        .await;
    assert_error(
        &response,
        StatusCode::BAD_GATEWAY,
        "error.exchangeRate.retrievalFailed",
    );

    // Ruble invoices never need a rate
    create_invoice(&server, invoice_body(1, RUB, "100.00")).await;
    let response = server
        .post("/api/v1/invoices")
        .authorization_bearer("edit")
        .json(&invoice_body(1, USD, "100.00"))
        .await;
    assert_error(
        &response,
        StatusCode::BAD_GATEWAY,
        "error.exchangeRate.retrievalFailed",
    );
}

#[test_log::test(tokio::test)]
async fn omitted_dates_use_the_business_date() {
    let today = time::macros::date!(2025 - 03 - 03);
    let app = TestApp::new().await.on(today);
    let server = server(app.clone());

    let response = server
        .get("/api/v1/exchangeRates/convert")
        .add_query_param("from", 2)
        .add_query_param("to", 1)
        .add_query_param("amount", "10.00")
        .authorization_bearer("view")
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Conversion>().date, today);

    let stored: Vec<ExchangeRate> = server
        .get("/api/v1/exchangeRates")
        .authorization_bearer("view")
        .await
        .json();
    assert_eq!(stored.len(), 3);
    assert!(stored.iter().all(|rate| rate.rate_date == today));

    create_invoice(&server, invoice_body(1, RUB, "100.00")).await;
    let report: PartnerBalanceReport = server
        .get("/api/v1/clientBalances/1")
        .authorization_bearer("view")
        .await
        .json();
    assert_eq!(report.report_date, today);

    // Payments may not be dated after the business date
    create_payment(&server, payment_body(1, RUB, "10.00")).await;
    let response = server
        .post("/api/v1/payments")
        .authorization_bearer("edit")
        .json(&json!({
            "partnerId": 1,
            "paymentDate": "2025-03-04",
            "currencyId": RUB,
            "amount": "10.00",
            "paymentTypeId": 1,
        }))
        .await;
    assert_error(
        &response,
        StatusCode::BAD_REQUEST,
        "validation.payment.paymentDate.pastOrPresent",
    );
}
