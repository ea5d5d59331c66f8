use super::{PricedDraft, insert_ledger_entry};
use crate::{
    Db, Error,
    rows::{INVOICE_COLUMNS, InvoiceRow, convert_all},
};
use finance_api::{
    models::{
        Failure, Invoice, InvoiceData, InvoiceId, InvoiceStatusId, InvoiceStatuses,
        InvoiceUpdateRefusal, LedgerDraft, PartnerId, ServiceTypes, Stamp,
    },
    ports::{InvoiceRepository, RateSource},
};
use sqlx::SqliteConnection;

impl InvoiceRepository for Db {
    async fn list_invoices(&self) -> Result<Vec<Invoice>, Self::Error> {
        let query = format!("select {INVOICE_COLUMNS} from invoice order by id");
        let rows = sqlx::query_as::<_, InvoiceRow>(&query)
            .fetch_all(&self.reader)
            .await?;
        convert_all(rows)
    }

    async fn get_invoice(&self, invoice_id: InvoiceId) -> Result<Option<Invoice>, Self::Error> {
        let query = format!("select {INVOICE_COLUMNS} from invoice where id = $1");
        sqlx::query_as::<_, InvoiceRow>(&query)
            .bind(invoice_id)
            .fetch_optional(&self.reader)
            .await?
            .map(Invoice::try_from)
            .transpose()
    }

    async fn invoices_for_partner(
        &self,
        partner_id: PartnerId,
    ) -> Result<Vec<Invoice>, Self::Error> {
        let query =
            format!("select {INVOICE_COLUMNS} from invoice where partner_id = $1 order by id");
        let rows = sqlx::query_as::<_, InvoiceRow>(&query)
            .bind(partner_id)
            .fetch_all(&self.reader)
            .await?;
        if rows.is_empty() {
            return Err(Failure::NoInvoicesForPartner(partner_id).into());
        }
        convert_all(rows)
    }

    async fn create_invoice(
        &self,
        data: InvoiceData,
        stamp: &Stamp,
        rates: &impl RateSource,
    ) -> Result<Invoice, Self::Error> {
        self.check_invoice_data(&data).await?;
        let to_rub = self
            .rate_to_rub(data.currency_id, data.issue_date, rates)
            .await?;

        let mut tx = self.writer.begin().await?;
        let query = format!(
            "insert into invoice (direction, partner_id, service_type_id, total_amount, \
             currency_id, issue_date, due_date, commentary, shipment_id, status_id, created_at, \
             modified_at, created_by, modified_by) \
             values ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $11, $12, $12) \
             returning {INVOICE_COLUMNS}"
        );
        let invoice: Invoice = sqlx::query_as::<_, InvoiceRow>(&query)
            .bind(data.direction.as_str())
            .bind(data.partner_id)
            .bind(data.service_type_id)
            .bind(data.total_amount)
            .bind(data.currency_id)
            .bind(data.issue_date)
            .bind(data.due_date)
            .bind(&data.commentary)
            .bind(data.shipment_id)
            .bind(data.status_id)
            .bind(stamp.as_of)
            .bind(&stamp.by)
            .fetch_one(&mut *tx)
            .await?
            .try_into()?;

        let entry = PricedDraft::new(LedgerDraft::for_invoice(&invoice), to_rub)?;
        insert_ledger_entry(&mut tx, &entry, stamp).await?;
        tx.commit().await?;

        Ok(invoice)
    }

    async fn update_invoice(
        &self,
        invoice_id: InvoiceId,
        data: InvoiceData,
        stamp: &Stamp,
        rates: &impl RateSource,
    ) -> Result<Option<Invoice>, Self::Error> {
        let Some(existing) = self.get_invoice(invoice_id).await? else {
            return Ok(None);
        };
        existing.check_update(&data)?;
        self.check_invoice_data(&data).await?;
        let to_rub = self
            .rate_to_rub(data.currency_id, data.issue_date, rates)
            .await?;

        let mut tx = self.writer.begin().await?;
        // The guard on paid_amount keeps an allocation that raced in between
        // the check above and this statement from being overwritten.
        let query = format!(
            "update invoice set direction = $2, service_type_id = $3, total_amount = $4, \
             due_date = $5, commentary = $6, shipment_id = $7, status_id = $8, \
             modified_at = $9, modified_by = $10 \
             where id = $1 and paid_amount = 0 and status_id != $11 \
             returning {INVOICE_COLUMNS}"
        );
        let updated = sqlx::query_as::<_, InvoiceRow>(&query)
            .bind(invoice_id)
            .bind(data.direction.as_str())
            .bind(data.service_type_id)
            .bind(data.total_amount)
            .bind(data.due_date)
            .bind(&data.commentary)
            .bind(data.shipment_id)
            .bind(data.status_id)
            .bind(stamp.as_of)
            .bind(&stamp.by)
            .bind(InvoiceStatusId::CANCELLED)
            .fetch_optional(&mut *tx)
            .await?;
        let Some(updated) = updated else {
            return Err(Failure::InvoiceUpdate(InvoiceUpdateRefusal::AlreadyPaid).into());
        };
        let invoice = Invoice::try_from(updated)?;

        if let Some(draft) =
            LedgerDraft::for_invoice_adjustment(&invoice, existing.data.total_amount)
        {
            insert_ledger_entry(&mut tx, &PricedDraft::new(draft, to_rub)?, stamp).await?;
        }
        tx.commit().await?;

        Ok(Some(invoice))
    }

    async fn cancel_invoice(
        &self,
        invoice_id: InvoiceId,
        stamp: &Stamp,
        rates: &impl RateSource,
    ) -> Result<bool, Self::Error> {
        let Some(existing) = self.get_invoice(invoice_id).await? else {
            return Ok(false);
        };
        if existing.is_cancelled() {
            return Ok(true);
        }
        if existing.is_paid() {
            return Err(Failure::InvoiceUpdate(InvoiceUpdateRefusal::AlreadyPaid).into());
        }
        let to_rub = self
            .rate_to_rub(existing.data.currency_id, existing.data.issue_date, rates)
            .await?;

        let mut tx = self.writer.begin().await?;
        let cancelled = cancel_unpaid(&mut tx, invoice_id, stamp).await?;
        if !cancelled {
            return Err(Failure::InvoiceUpdate(InvoiceUpdateRefusal::AlreadyPaid).into());
        }
        let entry = PricedDraft::new(LedgerDraft::for_invoice_reversal(&existing), to_rub)?;
        insert_ledger_entry(&mut tx, &entry, stamp).await?;
        tx.commit().await?;

        Ok(true)
    }
}

async fn cancel_unpaid(
    conn: &mut SqliteConnection,
    invoice_id: InvoiceId,
    stamp: &Stamp,
) -> Result<bool, Error> {
    let result = sqlx::query(
        "update invoice set status_id = $2, modified_at = $3, modified_by = $4 \
         where id = $1 and paid_amount = 0 and status_id != $2",
    )
    .bind(invoice_id)
    .bind(InvoiceStatusId::CANCELLED)
    .bind(stamp.as_of)
    .bind(&stamp.by)
    .execute(&mut *conn)
    .await?;
    Ok(result.rows_affected() == 1)
}

impl Db {
    /// Validate an invoice payload and the records it refers to.
    ///
    /// Cancellation has its own operation, so a payload may not set the
    /// cancelled status directly.
    async fn check_invoice_data(&self, data: &InvoiceData) -> Result<(), Error> {
        data.validate()?;
        if data.status_id == InvoiceStatusId::CANCELLED {
            return Err(Failure::invalid("validation.invoice.statusId.cancelled").into());
        }
        self.require_currency(data.currency_id).await?;
        self.require_entry::<ServiceTypes>(data.service_type_id).await?;
        self.require_entry::<InvoiceStatuses>(data.status_id).await?;
        Ok(())
    }
}
