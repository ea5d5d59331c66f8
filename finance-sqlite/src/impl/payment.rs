use super::{PricedDraft, insert_ledger_entry};
use crate::{
    Db, Error,
    rows::{PAYMENT_COLUMNS, PaymentRow},
};
use finance_api::{
    models::{
        Failure, LedgerDraft, PartnerId, Payment, PaymentData, PaymentId, PaymentStatuses,
        PaymentTypes, PaymentUpdateRefusal, Stamp,
    },
    ports::{PaymentRepository, RateSource},
};

impl PaymentRepository for Db {
    async fn list_payments(&self) -> Result<Vec<Payment>, Self::Error> {
        let query = format!("select {PAYMENT_COLUMNS} from payment order by id");
        let rows = sqlx::query_as::<_, PaymentRow>(&query)
            .fetch_all(&self.reader)
            .await?;
        Ok(rows.into_iter().map(Payment::from).collect())
    }

    async fn get_payment(&self, payment_id: PaymentId) -> Result<Option<Payment>, Self::Error> {
        let query = format!("select {PAYMENT_COLUMNS} from payment where id = $1");
        let row = sqlx::query_as::<_, PaymentRow>(&query)
            .bind(payment_id)
            .fetch_optional(&self.reader)
            .await?;
        Ok(row.map(Payment::from))
    }

    async fn payments_for_partner(
        &self,
        partner_id: PartnerId,
    ) -> Result<Vec<Payment>, Self::Error> {
        let query =
            format!("select {PAYMENT_COLUMNS} from payment where partner_id = $1 order by id");
        let rows = sqlx::query_as::<_, PaymentRow>(&query)
            .bind(partner_id)
            .fetch_all(&self.reader)
            .await?;
        if rows.is_empty() {
            return Err(Failure::NoPaymentsForPartner(partner_id).into());
        }
        Ok(rows.into_iter().map(Payment::from).collect())
    }

    async fn create_payment(
        &self,
        data: PaymentData,
        stamp: &Stamp,
        rates: &impl RateSource,
    ) -> Result<Payment, Self::Error> {
        self.check_payment_data(&data, stamp).await?;
        let to_rub = self
            .rate_to_rub(data.currency_id, data.payment_date, rates)
            .await?;

        let mut tx = self.writer.begin().await?;
        let query = format!(
            "insert into payment (payment_status_id, partner_id, payment_type_id, amount, \
             processing_fees, total_amount, currency_id, payment_date, commentary, created_at, \
             modified_at, created_by, modified_by) \
             values ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $10, $11, $11) \
             returning {PAYMENT_COLUMNS}"
        );
        let payment: Payment = sqlx::query_as::<_, PaymentRow>(&query)
            .bind(data.payment_status_id)
            .bind(data.partner_id)
            .bind(data.payment_type_id)
            .bind(data.amount)
            .bind(data.processing_fees)
            .bind(data.total())
            .bind(data.currency_id)
            .bind(data.payment_date)
            .bind(&data.commentary)
            .bind(stamp.as_of)
            .bind(&stamp.by)
            .fetch_one(&mut *tx)
            .await?
            .into();

        let entry = PricedDraft::new(LedgerDraft::for_payment(&payment), to_rub)?;
        insert_ledger_entry(&mut tx, &entry, stamp).await?;
        tx.commit().await?;

        Ok(payment)
    }

    async fn update_payment(
        &self,
        payment_id: PaymentId,
        data: PaymentData,
        stamp: &Stamp,
        rates: &impl RateSource,
    ) -> Result<Option<Payment>, Self::Error> {
        let Some(existing) = self.get_payment(payment_id).await? else {
            return Ok(None);
        };
        existing.check_update(&data)?;
        self.check_payment_data(&data, stamp).await?;
        let to_rub = self
            .rate_to_rub(data.currency_id, data.payment_date, rates)
            .await?;

        let mut tx = self.writer.begin().await?;
        // Allocations may have moved since the check above; the new total must
        // still cover whatever is allocated now.
        let query = format!(
            "update payment set payment_status_id = $2, payment_type_id = $3, amount = $4, \
             processing_fees = $5, total_amount = $6, payment_date = $7, commentary = $8, \
             modified_at = $9, modified_by = $10 \
             where id = $1 and allocated_amount <= $6 \
             returning {PAYMENT_COLUMNS}"
        );
        let updated = sqlx::query_as::<_, PaymentRow>(&query)
            .bind(payment_id)
            .bind(data.payment_status_id)
            .bind(data.payment_type_id)
            .bind(data.amount)
            .bind(data.processing_fees)
            .bind(data.total())
            .bind(data.payment_date)
            .bind(&data.commentary)
            .bind(stamp.as_of)
            .bind(&stamp.by)
            .fetch_optional(&mut *tx)
            .await?;
        let Some(updated) = updated else {
            return Err(Failure::PaymentUpdate(PaymentUpdateRefusal::BelowAllocated).into());
        };
        let payment = Payment::from(updated);

        if let Some(draft) = LedgerDraft::for_payment_adjustment(&payment, existing.total_amount) {
            insert_ledger_entry(&mut tx, &PricedDraft::new(draft, to_rub)?, stamp).await?;
        }
        tx.commit().await?;

        Ok(Some(payment))
    }

    async fn delete_payment(
        &self,
        payment_id: PaymentId,
        stamp: &Stamp,
        rates: &impl RateSource,
    ) -> Result<bool, Self::Error> {
        let Some(existing) = self.get_payment(payment_id).await? else {
            return Ok(false);
        };
        existing.check_delete()?;
        let to_rub = self
            .rate_to_rub(existing.data.currency_id, existing.data.payment_date, rates)
            .await?;

        let mut tx = self.writer.begin().await?;
        let result = sqlx::query("delete from payment where id = $1 and allocated_amount = 0")
            .bind(payment_id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(Failure::PaymentUpdate(PaymentUpdateRefusal::HasAllocations).into());
        }
        let entry = PricedDraft::new(LedgerDraft::for_payment_reversal(&existing), to_rub)?;
        insert_ledger_entry(&mut tx, &entry, stamp).await?;
        tx.commit().await?;

        Ok(true)
    }
}

impl Db {
    /// Validate a payment payload and the records it refers to
    async fn check_payment_data(&self, data: &PaymentData, stamp: &Stamp) -> Result<(), Error> {
        data.validate(stamp.today)?;
        self.require_currency(data.currency_id).await?;
        self.require_entry::<PaymentTypes>(data.payment_type_id).await?;
        self.require_entry::<PaymentStatuses>(data.payment_status_id).await?;
        Ok(())
    }
}
