use super::{PricedDraft, insert_ledger_entry};
use crate::{Db, Error};
use finance_api::{
    models::{
        AllocationRequest, Amount, Failure, Invoice, InvoiceId, InvoiceStatusId, LedgerDraft,
        LedgerEntry, LedgerReference, PartnerId, Payment, PaymentId, Rate, Stamp,
    },
    ports::{
        AllocationRepository, ExchangeRateRepository as _, InvoiceRepository as _,
        PaymentRepository as _, RateSource,
    },
};
use sqlx::SqliteConnection;

impl AllocationRepository for Db {
    async fn allocate(
        &self,
        request: AllocationRequest,
        stamp: &Stamp,
        rates: &impl RateSource,
    ) -> Result<LedgerEntry, Self::Error> {
        let plan = self.plan(&request, rates).await?;
        if plan.invoice.is_cancelled() {
            return Err(Failure::InvoiceCancelled(plan.invoice.id).into());
        }

        let mut tx = self.writer.begin().await?;
        take_from_payment(&mut tx, plan.payment.id, plan.amount, stamp).await?;
        add_to_invoice(&mut tx, plan.invoice.id, plan.invoice_amount, stamp).await?;
        let entry = plan.write_ledger(&mut tx, Direction::Forward, stamp).await?;
        tx.commit().await?;

        Ok(entry)
    }

    async fn deallocate(
        &self,
        request: AllocationRequest,
        stamp: &Stamp,
        rates: &impl RateSource,
    ) -> Result<LedgerEntry, Self::Error> {
        let plan = self.plan(&request, rates).await?;

        let mut tx = self.writer.begin().await?;
        let allocated = sqlx::query_scalar::<_, Amount>(
            "select coalesce(sum(amount), 0) from ledger_entry \
             where payment_id = $1 and invoice_id = $2 and reference_type_id = $3",
        )
        .bind(plan.payment.id)
        .bind(plan.invoice.id)
        .bind(i32::from(LedgerReference::Allocation))
        .fetch_one(&mut *tx)
        .await?;
        // Payable allocations are stored negative
        if allocated.abs() < plan.invoice_amount {
            return Err(Failure::NoExistingAllocation.into());
        }

        return_to_payment(&mut tx, plan.payment.id, plan.amount, stamp).await?;
        remove_from_invoice(&mut tx, plan.invoice.id, plan.invoice_amount, stamp).await?;
        let entry = plan.write_ledger(&mut tx, Direction::Reverse, stamp).await?;
        tx.commit().await?;

        Ok(entry)
    }

    async fn allocations_for_partner(
        &self,
        partner_id: PartnerId,
    ) -> Result<Vec<LedgerEntry>, Self::Error> {
        let filter = format!(
            "partner_id = $1 and reference_type_id = {}",
            i32::from(LedgerReference::Allocation)
        );
        let entries = self.ledger_where(&filter, partner_id).await?;
        if entries.is_empty() {
            return Err(Failure::NoAllocationsForPartner(partner_id).into());
        }
        Ok(entries)
    }

    async fn allocations_for_invoice(
        &self,
        invoice_id: InvoiceId,
    ) -> Result<Vec<LedgerEntry>, Self::Error> {
        let filter = format!(
            "invoice_id = $1 and reference_type_id = {}",
            i32::from(LedgerReference::Allocation)
        );
        let entries = self.ledger_where(&filter, invoice_id).await?;
        if entries.is_empty() {
            return Err(Failure::NoAllocationsForInvoice(invoice_id).into());
        }
        Ok(entries)
    }

    async fn allocations_for_payment(
        &self,
        payment_id: PaymentId,
    ) -> Result<Vec<LedgerEntry>, Self::Error> {
        let filter = format!(
            "payment_id = $1 and reference_type_id in ({}, {})",
            i32::from(LedgerReference::Allocation),
            i32::from(LedgerReference::Conversion)
        );
        let entries = self.ledger_where(&filter, payment_id).await?;
        if entries.is_empty() {
            return Err(Failure::NoAllocationsForPayment(payment_id).into());
        }
        Ok(entries)
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Direction {
    Forward,
    Reverse,
}

/// Everything an allocation needs, resolved before the write transaction
/// opens.
struct Plan {
    payment: Payment,
    invoice: Invoice,
    /// In the payment's currency
    amount: Amount,
    /// In the invoice's currency, unsigned
    invoice_amount: Amount,
    payment_to_rub: Rate,
    invoice_to_rub: Rate,
}

impl Plan {
    fn is_cross_currency(&self) -> bool {
        self.payment.data.currency_id != self.invoice.data.currency_id
    }

    /// Write the ledger rows for the move and return the ALLOCATION row
    async fn write_ledger(
        &self,
        conn: &mut SqliteConnection,
        direction: Direction,
        stamp: &Stamp,
    ) -> Result<LedgerEntry, Error> {
        let flip = |amount: Amount| match direction {
            Direction::Forward => amount,
            Direction::Reverse => -amount,
        };
        let signed = self.invoice.data.direction.signed(self.invoice_amount);

        if self.is_cross_currency() {
            let paid_out = LedgerDraft::for_conversion(
                &self.invoice,
                self.payment.id,
                self.payment.data.currency_id,
                flip(-self.amount),
            );
            let paid_in = LedgerDraft::for_conversion(
                &self.invoice,
                self.payment.id,
                self.invoice.data.currency_id,
                flip(signed),
            );
            insert_ledger_entry(conn, &PricedDraft::new(paid_out, self.payment_to_rub)?, stamp)
                .await?;
            insert_ledger_entry(conn, &PricedDraft::new(paid_in, self.invoice_to_rub)?, stamp)
                .await?;
        }

        let allocation = LedgerDraft::for_allocation(&self.invoice, self.payment.id, flip(signed));
        insert_ledger_entry(conn, &PricedDraft::new(allocation, self.invoice_to_rub)?, stamp).await
    }
}

impl Db {
    /// Validate a request and price it.
    ///
    /// Cross-currency amounts convert at the invoice's issue date, so the same
    /// request always moves the same invoice-side amount.
    async fn plan(
        &self,
        request: &AllocationRequest,
        rates: &impl RateSource,
    ) -> Result<Plan, Error> {
        if request.allocated_amount < Amount::CENT {
            return Err(Failure::AllocatedAmountTooSmall.into());
        }
        if !request.allocated_amount.within_limit() {
            return Err(Failure::invalid("validation.paymentAllocation.allocatedAmount.format").into());
        }
        let payment = self
            .get_payment(request.payment_id)
            .await?
            .ok_or(Failure::PaymentNotFound(request.payment_id))?;
        let invoice = self
            .get_invoice(request.invoice_id)
            .await?
            .ok_or(Failure::InvoiceNotFound(request.invoice_id))?;
        if payment.data.partner_id != invoice.data.partner_id {
            return Err(Failure::PartnerMismatch {
                payment: payment.data.partner_id,
                invoice: invoice.data.partner_id,
            }
            .into());
        }

        let date = invoice.data.issue_date;
        let invoice_amount = if payment.data.currency_id == invoice.data.currency_id {
            request.allocated_amount
        } else {
            self.convert(
                payment.data.currency_id,
                invoice.data.currency_id,
                request.allocated_amount,
                date,
                rates,
            )
            .await?
            .converted
        };
        let payment_to_rub = self.rate_to_rub(payment.data.currency_id, date, rates).await?;
        let invoice_to_rub = self.rate_to_rub(invoice.data.currency_id, date, rates).await?;

        Ok(Plan {
            payment,
            invoice,
            amount: request.allocated_amount,
            invoice_amount,
            payment_to_rub,
            invoice_to_rub,
        })
    }
}

async fn take_from_payment(
    conn: &mut SqliteConnection,
    payment_id: PaymentId,
    amount: Amount,
    stamp: &Stamp,
) -> Result<(), Error> {
    let result = sqlx::query(
        "update payment set allocated_amount = allocated_amount + $2, \
         modified_at = $3, modified_by = $4 \
         where id = $1 and unallocated_amount >= $2",
    )
    .bind(payment_id)
    .bind(amount)
    .bind(stamp.as_of)
    .bind(&stamp.by)
    .execute(&mut *conn)
    .await?;
    if result.rows_affected() == 1 {
        return Ok(());
    }

    let available =
        sqlx::query_scalar::<_, Amount>("select unallocated_amount from payment where id = $1")
            .bind(payment_id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or(Failure::PaymentNotFound(payment_id))?;
    Err(Failure::InsufficientUnallocated {
        available,
        requested: amount,
    }
    .into())
}

async fn add_to_invoice(
    conn: &mut SqliteConnection,
    invoice_id: InvoiceId,
    amount: Amount,
    stamp: &Stamp,
) -> Result<(), Error> {
    let result = sqlx::query(
        "update invoice set paid_amount = paid_amount + $2, modified_at = $3, modified_by = $4 \
         where id = $1 and outstanding_balance >= $2 and status_id != $5",
    )
    .bind(invoice_id)
    .bind(amount)
    .bind(stamp.as_of)
    .bind(&stamp.by)
    .bind(InvoiceStatusId::CANCELLED)
    .execute(&mut *conn)
    .await?;
    if result.rows_affected() == 1 {
        return Ok(());
    }

    let current = sqlx::query_as::<_, (Amount, InvoiceStatusId)>(
        "select outstanding_balance, status_id from invoice where id = $1",
    )
    .bind(invoice_id)
    .fetch_optional(&mut *conn)
    .await?;
    match current {
        None => Err(Failure::InvoiceNotFound(invoice_id).into()),
        Some((_, status)) if status == InvoiceStatusId::CANCELLED => {
            Err(Failure::InvoiceCancelled(invoice_id).into())
        }
        Some((outstanding, _)) => Err(Failure::ExceedsOutstanding {
            outstanding,
            requested: amount,
        }
        .into()),
    }
}

async fn return_to_payment(
    conn: &mut SqliteConnection,
    payment_id: PaymentId,
    amount: Amount,
    stamp: &Stamp,
) -> Result<(), Error> {
    let result = sqlx::query(
        "update payment set allocated_amount = allocated_amount - $2, \
         modified_at = $3, modified_by = $4 \
         where id = $1 and allocated_amount >= $2",
    )
    .bind(payment_id)
    .bind(amount)
    .bind(stamp.as_of)
    .bind(&stamp.by)
    .execute(&mut *conn)
    .await?;
    if result.rows_affected() == 1 {
        Ok(())
    } else {
        Err(Failure::NoExistingAllocation.into())
    }
}

async fn remove_from_invoice(
    conn: &mut SqliteConnection,
    invoice_id: InvoiceId,
    amount: Amount,
    stamp: &Stamp,
) -> Result<(), Error> {
    let result = sqlx::query(
        "update invoice set paid_amount = paid_amount - $2, modified_at = $3, modified_by = $4 \
         where id = $1 and paid_amount >= $2",
    )
    .bind(invoice_id)
    .bind(amount)
    .bind(stamp.as_of)
    .bind(&stamp.by)
    .execute(&mut *conn)
    .await?;
    if result.rows_affected() == 1 {
        Ok(())
    } else {
        Err(Failure::NoExistingAllocation.into())
    }
}
