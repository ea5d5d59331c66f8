mod common;

use common::*;
use finance_api::{
    models::{
        CurrencyData, Failure, InvoiceDirection, InvoiceStatusId, InvoiceStatuses,
        InvoiceUpdateRefusal, LedgerReference, LocalizedData, NamedData, PaymentStatuses,
        PaymentTypeData, PaymentTypeId, PaymentTypes, PaymentUpdateRefusal, ReferenceTypes,
        ServiceTypes,
    },
    ports::{
        AsFailure as _, CatalogRepository, CurrencyRepository, InvoiceRepository,
        LedgerRepository, PaymentRepository,
    },
};
use rstest::rstest;
use time::macros::date;

const DAY: time::Date = date!(2025 - 03 - 03);

#[tokio::test]
async fn seeded_catalogs_are_present() -> anyhow::Result<()> {
    let db = open().await?;

    assert_eq!(db.list_currencies(false).await?.len(), 4);
    assert_eq!(
        CatalogRepository::<PaymentTypes>::list_entries(&db).await?.len(),
        3
    );
    assert_eq!(
        CatalogRepository::<PaymentStatuses>::list_entries(&db).await?.len(),
        3
    );
    assert_eq!(
        CatalogRepository::<ReferenceTypes>::list_entries(&db).await?.len(),
        8
    );

    let cancelled = CatalogRepository::<InvoiceStatuses>::get_entry(&db, InvoiceStatusId::CANCELLED)
        .await?
        .unwrap();
    assert_eq!(cancelled.data.name, "Cancelled");
    assert_eq!(cancelled.data.localizations["ru"], "Отменён");

    Ok(())
}

#[tokio::test]
async fn catalog_entries_round_trip() -> anyhow::Result<()> {
    let db = open().await?;
    let stamp = stamp();

    let created = CatalogRepository::<PaymentTypes>::create_entry(
        &db,
        PaymentTypeData {
            name: "Crypto".into(),
            description: Some("Stablecoin transfer".into()),
        },
        &stamp,
    )
    .await?;
    assert_eq!(created.id, PaymentTypeId(4));
    assert_eq!(created.audit.created_by, "tester");

    let updated = CatalogRepository::<PaymentTypes>::update_entry(
        &db,
        created.id,
        PaymentTypeData {
            name: "Crypto transfer".into(),
            description: None,
        },
        &stamp,
    )
    .await?
    .unwrap();
    assert_eq!(updated.data.name, "Crypto transfer");
    assert_eq!(updated.data.description, None);

    assert!(CatalogRepository::<PaymentTypes>::delete_entry(&db, created.id).await?);
    assert!(!CatalogRepository::<PaymentTypes>::delete_entry(&db, created.id).await?);

    let mut localizations = finance_api::models::Localizations::default();
    localizations.insert("en".into(), "Warehousing".into());
    let service = CatalogRepository::<ServiceTypes>::create_entry(
        &db,
        LocalizedData {
            name: "Warehousing".into(),
            localizations,
        },
        &stamp,
    )
    .await?;
    let fetched = CatalogRepository::<ServiceTypes>::get_entry(&db, service.id)
        .await?
        .unwrap();
    assert_eq!(fetched.data, service.data);

    Ok(())
}

#[rstest]
#[case("", "validation.paymentStatus.name.notBlank")]
#[case("X", "validation.paymentStatus.name.size")]
#[tokio::test]
async fn catalog_names_are_validated(#[case] name: &str, #[case] key: &str) -> anyhow::Result<()> {
    let db = open().await?;

    let err = CatalogRepository::<PaymentStatuses>::create_entry(
        &db,
        NamedData { name: name.into() },
        &stamp(),
    )
    .await
    .unwrap_err();
    assert_eq!(err.as_failure().map(Failure::key).as_deref(), Some(key));

    Ok(())
}

#[tokio::test]
async fn referenced_catalog_entries_cannot_be_deleted() -> anyhow::Result<()> {
    let db = open().await?;
    let rates = FixedRates::standard();

    db.create_payment(payment_data(RUB, "100.00", DAY), &stamp(), &rates)
        .await?;
    let err = CatalogRepository::<PaymentTypes>::delete_entry(&db, PaymentTypeId(1))
        .await
        .unwrap_err();
    assert_eq!(err.as_failure(), Some(&Failure::InUse));

    Ok(())
}

#[tokio::test]
async fn currency_codes_are_unique() -> anyhow::Result<()> {
    let db = open().await?;
    let stamp = stamp();

    let pound = db
        .create_currency(
            CurrencyData {
                code: "GBP".into(),
                okv_code: "826".into(),
                name: "Pound Sterling".into(),
                enabled: true,
            },
            &stamp,
        )
        .await?;
    assert_eq!(pound.data.code, "GBP");

    let err = db
        .create_currency(
            CurrencyData {
                code: "USD".into(),
                okv_code: "999".into(),
                name: "Another Dollar".into(),
                enabled: true,
            },
            &stamp,
        )
        .await
        .unwrap_err();
    assert_eq!(err.as_failure(), Some(&Failure::Duplicate));

    assert!(db.delete_currency(pound.id).await?);
    assert!(db.get_currency(pound.id).await?.is_none());

    let enabled = db.list_currencies(true).await?;
    assert!(enabled.iter().all(|currency| currency.data.enabled));

    Ok(())
}

#[tokio::test]
async fn currencies_in_use_cannot_be_deleted() -> anyhow::Result<()> {
    let db = open().await?;
    let rates = FixedRates::standard();

    db.create_invoice(
        invoice_data(InvoiceDirection::Receivable, USD, "10.00", DAY),
        &stamp(),
        &rates,
    )
    .await?;
    let err = db.delete_currency(USD).await.unwrap_err();
    assert_eq!(err.as_failure(), Some(&Failure::InUse));

    Ok(())
}

#[tokio::test]
async fn invoice_lifecycle_is_journaled() -> anyhow::Result<()> {
    let db = open().await?;
    let rates = FixedRates::standard();
    let stamp = stamp();

    let invoice = db
        .create_invoice(
            invoice_data(InvoiceDirection::Receivable, USD, "200.00", DAY),
            &stamp,
            &rates,
        )
        .await?;
    assert!(invoice.paid_amount.is_zero());
    assert_eq!(invoice.outstanding_balance, amount("200.00"));

    let mut bigger = invoice.data.clone();
    bigger.total_amount = amount("250.00");
    let updated = db
        .update_invoice(invoice.id, bigger, &stamp, &rates)
        .await?
        .unwrap();
    assert_eq!(updated.outstanding_balance, amount("250.00"));

    assert!(db.cancel_invoice(invoice.id, &stamp, &rates).await?);
    // Cancelling again changes nothing
    assert!(db.cancel_invoice(invoice.id, &stamp, &rates).await?);
    let cancelled = db.get_invoice(invoice.id).await?.unwrap();
    assert!(cancelled.is_cancelled());

    let rows = db.ledger_for_invoice(invoice.id).await?;
    let movements: Vec<_> = rows.iter().map(|row| (row.reference, row.amount)).collect();
    assert_eq!(
        movements,
        vec![
            (LedgerReference::Invoice, amount("-200.00")),
            (LedgerReference::InvoiceAdjustment, amount("-50.00")),
            (LedgerReference::InvoiceReversal, amount("250.00")),
        ]
    );
    assert_eq!(rows[0].base_amount, amount("-18000.00"));
    assert!(db.partner_balance(PARTNER, USD).await?.is_zero());

    let err = db
        .update_invoice(invoice.id, cancelled.data.clone(), &stamp, &rates)
        .await
        .unwrap_err();
    assert_eq!(
        err.as_failure(),
        Some(&Failure::InvoiceUpdate(InvoiceUpdateRefusal::Cancelled))
    );

    assert!(!db
        .cancel_invoice(finance_api::models::InvoiceId(999), &stamp, &rates)
        .await?);

    Ok(())
}

#[tokio::test]
async fn invoice_identity_fields_are_fixed() -> anyhow::Result<()> {
    let db = open().await?;
    let rates = FixedRates::standard();
    let stamp = stamp();

    let invoice = db
        .create_invoice(
            invoice_data(InvoiceDirection::Payable, RUB, "100.00", DAY),
            &stamp,
            &rates,
        )
        .await?;

    let mut recurrency = invoice.data.clone();
    recurrency.currency_id = EUR;
    let err = db
        .update_invoice(invoice.id, recurrency, &stamp, &rates)
        .await
        .unwrap_err();
    assert_eq!(
        err.as_failure(),
        Some(&Failure::InvoiceUpdate(InvoiceUpdateRefusal::CurrencyChanged))
    );

    let mut status = invoice.data.clone();
    status.status_id = InvoiceStatusId::CANCELLED;
    let err = db
        .update_invoice(invoice.id, status, &stamp, &rates)
        .await
        .unwrap_err();
    assert_eq!(
        err.as_failure().map(Failure::key).as_deref(),
        Some("validation.invoice.statusId.cancelled")
    );

    Ok(())
}

#[tokio::test]
async fn invoices_need_a_rate_for_their_issue_date() -> anyhow::Result<()> {
    let db = open().await?;

    let err = db
        .create_invoice(
            invoice_data(InvoiceDirection::Receivable, EUR, "10.00", DAY),
            &stamp(),
            &OfflineRates,
        )
        .await
        .unwrap_err();
    assert_eq!(
        err.as_failure(),
        Some(&Failure::ExchangeRateUnavailable {
            currency: "EUR".into(),
            date: DAY,
        })
    );
    assert!(db.list_invoices().await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn payment_lifecycle_is_journaled() -> anyhow::Result<()> {
    let db = open().await?;
    let rates = FixedRates::standard();
    let stamp = stamp();

    let mut data = payment_data(EUR, "100.00", DAY);
    data.processing_fees = amount("5.00");
    let payment = db.create_payment(data.clone(), &stamp, &rates).await?;
    assert_eq!(payment.total_amount, amount("95.00"));
    assert_eq!(payment.unallocated_amount, amount("95.00"));
    assert!(payment.allocated_amount.is_zero());

    data.amount = amount("120.00");
    let updated = db
        .update_payment(payment.id, data.clone(), &stamp, &rates)
        .await?
        .unwrap();
    assert_eq!(updated.total_amount, amount("115.00"));
    assert_eq!(updated.unallocated_amount, amount("115.00"));

    let mut moved = data.clone();
    moved.partner_id = finance_api::models::PartnerId(9);
    let err = db
        .update_payment(payment.id, moved, &stamp, &rates)
        .await
        .unwrap_err();
    assert_eq!(
        err.as_failure(),
        Some(&Failure::PaymentUpdate(PaymentUpdateRefusal::PartnerChanged))
    );

    assert!(db.delete_payment(payment.id, &stamp, &rates).await?);
    assert!(db.get_payment(payment.id).await?.is_none());
    assert!(!db.delete_payment(payment.id, &stamp, &rates).await?);

    // The ledger keeps the history of a deleted payment
    let rows = db.ledger_for_payment(payment.id).await?;
    let movements: Vec<_> = rows.iter().map(|row| (row.reference, row.amount)).collect();
    assert_eq!(
        movements,
        vec![
            (LedgerReference::Payment, amount("95.00")),
            (LedgerReference::PaymentAdjustment, amount("20.00")),
            (LedgerReference::PaymentReversal, amount("-115.00")),
        ]
    );
    assert_eq!(rows[0].base_amount, amount("9500.00"));
    assert!(db.partner_base_balance(PARTNER).await?.is_zero());

    Ok(())
}

#[tokio::test]
async fn future_payments_are_rejected() -> anyhow::Result<()> {
    let db = open().await?;
    let tomorrow = time::OffsetDateTime::now_utc().date().next_day().unwrap();

    let err = db
        .create_payment(payment_data(RUB, "10.00", tomorrow), &stamp(), &OfflineRates)
        .await
        .unwrap_err();
    assert_eq!(
        err.as_failure().map(Failure::key).as_deref(),
        Some("validation.payment.paymentDate.pastOrPresent")
    );

    Ok(())
}

#[tokio::test]
async fn partner_listings_refuse_empty_results() -> anyhow::Result<()> {
    let db = open().await?;
    let rates = FixedRates::standard();

    let err = db.invoices_for_partner(PARTNER).await.unwrap_err();
    assert_eq!(err.as_failure(), Some(&Failure::NoInvoicesForPartner(PARTNER)));
    let err = db.payments_for_partner(PARTNER).await.unwrap_err();
    assert_eq!(err.as_failure(), Some(&Failure::NoPaymentsForPartner(PARTNER)));

    db.create_payment(payment_data(RUB, "10.00", DAY), &stamp(), &rates)
        .await?;
    assert_eq!(db.payments_for_partner(PARTNER).await?.len(), 1);

    Ok(())
}
