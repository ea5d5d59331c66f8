//! Row types for the tables whose shape differs from the public models.
//!
//! Currencies, exchange rates and audit columns decode straight into the
//! `finance_api` models. Invoices, payments, ledger rows and catalog entries
//! need a little conversion (enums stored as text or integers, JSON payloads,
//! derived flags), which happens here.

use crate::Error;
use finance_api::models::{
    Amount, Audit, CatalogRecord, CurrencyId, Invoice, InvoiceData, InvoiceId, InvoiceStatusId,
    LedgerEntry, LedgerEntryId, LedgerReference, PartnerId, Payment, PaymentData, PaymentId,
    PaymentStatusId, PaymentTypeId, ServiceTypeId,
};

pub(crate) const INVOICE_COLUMNS: &str = "id, direction, partner_id, service_type_id, \
    total_amount, paid_amount, outstanding_balance, currency_id, issue_date, due_date, \
    commentary, shipment_id, status_id, created_at, modified_at, created_by, modified_by";

pub(crate) const PAYMENT_COLUMNS: &str = "id, payment_status_id, partner_id, payment_type_id, \
    amount, processing_fees, total_amount, allocated_amount, unallocated_amount, currency_id, \
    payment_date, commentary, created_at, modified_at, created_by, modified_by";

pub(crate) const LEDGER_COLUMNS: &str = "id, partner_id, currency_id, amount, base_amount, \
    reference_type_id, invoice_id, payment_id, transaction_date, created_at, modified_at, \
    created_by, modified_by";

pub(crate) const CURRENCY_COLUMNS: &str =
    "id, code, okv_code, name, enabled, created_at, modified_at, created_by, modified_by";

pub(crate) const RATE_COLUMNS: &str = "currency_from_id, currency_to_id, official_rate, \
    standard_rate, premium_client_rate, rate_date";

#[derive(sqlx::FromRow)]
pub(crate) struct InvoiceRow {
    id: InvoiceId,
    direction: String,
    partner_id: PartnerId,
    service_type_id: ServiceTypeId,
    total_amount: Amount,
    paid_amount: Amount,
    outstanding_balance: Amount,
    currency_id: CurrencyId,
    issue_date: time::Date,
    due_date: Option<time::Date>,
    commentary: Option<String>,
    shipment_id: Option<i64>,
    status_id: InvoiceStatusId,
    #[sqlx(flatten)]
    audit: Audit,
}

impl TryFrom<InvoiceRow> for Invoice {
    type Error = Error;

    fn try_from(row: InvoiceRow) -> Result<Self, Self::Error> {
        let direction = row
            .direction
            .parse()
            .map_err(|err: finance_api::models::UnknownDirection| Error::Corrupt(err.to_string()))?;
        Ok(Self {
            id: row.id,
            data: InvoiceData {
                direction,
                partner_id: row.partner_id,
                service_type_id: row.service_type_id,
                total_amount: row.total_amount,
                currency_id: row.currency_id,
                issue_date: row.issue_date,
                due_date: row.due_date,
                commentary: row.commentary,
                shipment_id: row.shipment_id,
                status_id: row.status_id,
            },
            paid_amount: row.paid_amount,
            outstanding_balance: row.outstanding_balance,
            audit: row.audit,
        })
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct PaymentRow {
    id: PaymentId,
    payment_status_id: PaymentStatusId,
    partner_id: PartnerId,
    payment_type_id: PaymentTypeId,
    amount: Amount,
    processing_fees: Amount,
    total_amount: Amount,
    allocated_amount: Amount,
    unallocated_amount: Amount,
    currency_id: CurrencyId,
    payment_date: time::Date,
    commentary: Option<String>,
    #[sqlx(flatten)]
    audit: Audit,
}

impl From<PaymentRow> for Payment {
    fn from(row: PaymentRow) -> Self {
        Self {
            id: row.id,
            data: PaymentData {
                partner_id: row.partner_id,
                payment_date: row.payment_date,
                currency_id: row.currency_id,
                amount: row.amount,
                processing_fees: row.processing_fees,
                payment_type_id: row.payment_type_id,
                payment_status_id: row.payment_status_id,
                commentary: row.commentary,
            },
            total_amount: row.total_amount,
            unallocated_amount: row.unallocated_amount,
            allocated_amount: row.allocated_amount,
            is_fully_allocated: row.unallocated_amount.is_zero(),
            audit: row.audit,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct LedgerRow {
    id: LedgerEntryId,
    partner_id: PartnerId,
    currency_id: CurrencyId,
    amount: Amount,
    base_amount: Amount,
    reference_type_id: i32,
    invoice_id: Option<InvoiceId>,
    payment_id: Option<PaymentId>,
    transaction_date: time::Date,
    #[sqlx(flatten)]
    audit: Audit,
}

impl TryFrom<LedgerRow> for LedgerEntry {
    type Error = Error;

    fn try_from(row: LedgerRow) -> Result<Self, Self::Error> {
        let reference = LedgerReference::try_from(row.reference_type_id)
            .map_err(|err| Error::Corrupt(err.to_string()))?;
        Ok(Self {
            id: row.id,
            partner_id: row.partner_id,
            currency_id: row.currency_id,
            amount: row.amount,
            base_amount: row.base_amount,
            reference,
            invoice_id: row.invoice_id,
            payment_id: row.payment_id,
            transaction_date: row.transaction_date,
            audit: row.audit,
        })
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct CatalogRow<Data> {
    id: i32,
    data: sqlx::types::Json<Data>,
    #[sqlx(flatten)]
    audit: Audit,
}

impl<Data> CatalogRow<Data> {
    pub(crate) fn into_record<Id: From<i32>>(self) -> CatalogRecord<Id, Data> {
        CatalogRecord {
            id: self.id.into(),
            data: self.data.0,
            audit: self.audit,
        }
    }
}

/// Convert a batch of rows, failing on the first that does not convert
pub(crate) fn convert_all<R, T>(rows: Vec<R>) -> Result<Vec<T>, Error>
where
    T: TryFrom<R, Error = Error>,
{
    rows.into_iter().map(T::try_from).collect()
}
