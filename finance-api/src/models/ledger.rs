//! The partner ledger.
//!
//! Every event that moves a partner's balance (a payment arriving, an invoice
//! being issued, an allocation between the two) is recorded as an append-only
//! [`LedgerEntry`]. The sign convention is from our side: money received and
//! payables issued push the balance up, receivables issued push it down.
//!
//! Entries are built as [`LedgerDraft`]s by the factory functions below. The
//! repository then prices each draft in the base currency and stores it.

use crate::models::{
    Amount, Audit, CurrencyId, Invoice, InvoiceId, LedgerEntryId, PartnerId, Payment, PaymentId,
};
use std::fmt::Display;

/// The kind of event a ledger row records.
///
/// The discriminants are the keys of the seeded `referenceType` catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "SCREAMING_SNAKE_CASE")
)]
#[repr(i32)]
pub enum LedgerReference {
    /// A payment was recorded
    Payment = 1,
    /// An invoice was issued
    Invoice = 2,
    /// Part of a payment was applied to an invoice
    Allocation = 3,
    /// One leg of a cross-currency allocation
    Conversion = 4,
    /// A payment's total was edited
    PaymentAdjustment = 5,
    /// A payment was deleted
    PaymentReversal = 6,
    /// An invoice's total was edited
    InvoiceAdjustment = 7,
    /// An invoice was cancelled
    InvoiceReversal = 8,
}

impl From<LedgerReference> for i32 {
    fn from(value: LedgerReference) -> Self {
        value as i32
    }
}

/// The error returned for an integer that names no reference kind
#[derive(Debug, thiserror::Error)]
#[error("unknown ledger reference type {0}")]
pub struct UnknownReference(pub i32);

impl TryFrom<i32> for LedgerReference {
    type Error = UnknownReference;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Ok(match value {
            1 => Self::Payment,
            2 => Self::Invoice,
            3 => Self::Allocation,
            4 => Self::Conversion,
            5 => Self::PaymentAdjustment,
            6 => Self::PaymentReversal,
            7 => Self::InvoiceAdjustment,
            8 => Self::InvoiceReversal,
            other => return Err(UnknownReference(other)),
        })
    }
}

impl Display for LedgerReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}

/// A stored ledger row
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct LedgerEntry {
    /// The database key
    pub id: LedgerEntryId,
    /// The partner whose balance moved
    pub partner_id: PartnerId,
    /// The currency of `amount`
    pub currency_id: CurrencyId,
    /// The signed movement in `currency_id`
    pub amount: Amount,
    /// The signed movement in rubles, priced on `transaction_date`
    pub base_amount: Amount,
    /// What kind of event this row records
    pub reference: LedgerReference,
    /// The invoice involved, if any
    pub invoice_id: Option<InvoiceId>,
    /// The payment involved, if any
    pub payment_id: Option<PaymentId>,
    /// The business date of the event
    #[cfg_attr(feature = "schemars", schemars(with = "String"))]
    pub transaction_date: time::Date,
    /// Who wrote the record, and when
    pub audit: Audit,
}

/// A ledger row that has not yet been priced or stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerDraft {
    /// The partner whose balance moves
    pub partner_id: PartnerId,
    /// The currency of `amount`
    pub currency_id: CurrencyId,
    /// The signed movement
    pub amount: Amount,
    /// What kind of event this row records
    pub reference: LedgerReference,
    /// The invoice involved, if any
    pub invoice_id: Option<InvoiceId>,
    /// The payment involved, if any
    pub payment_id: Option<PaymentId>,
    /// The business date, which also selects the pricing rate
    pub transaction_date: time::Date,
}

impl LedgerDraft {
    fn payment_row(payment: &Payment, amount: Amount, reference: LedgerReference) -> Self {
        Self {
            partner_id: payment.data.partner_id,
            currency_id: payment.data.currency_id,
            amount,
            reference,
            invoice_id: None,
            payment_id: Some(payment.id),
            transaction_date: payment.data.payment_date,
        }
    }

    fn invoice_row(invoice: &Invoice, amount: Amount, reference: LedgerReference) -> Self {
        Self {
            partner_id: invoice.data.partner_id,
            currency_id: invoice.data.currency_id,
            amount,
            reference,
            invoice_id: Some(invoice.id),
            payment_id: None,
            transaction_date: invoice.data.issue_date,
        }
    }

    /// A newly recorded payment
    pub fn for_payment(payment: &Payment) -> Self {
        Self::payment_row(payment, payment.total_amount, LedgerReference::Payment)
    }

    /// An edit that moved a payment's total from `old_total`, if it did move
    pub fn for_payment_adjustment(payment: &Payment, old_total: Amount) -> Option<Self> {
        let delta = payment.total_amount - old_total;
        (!delta.is_zero())
            .then(|| Self::payment_row(payment, delta, LedgerReference::PaymentAdjustment))
    }

    /// A deleted payment
    pub fn for_payment_reversal(payment: &Payment) -> Self {
        Self::payment_row(payment, -payment.total_amount, LedgerReference::PaymentReversal)
    }

    /// A newly issued invoice
    pub fn for_invoice(invoice: &Invoice) -> Self {
        Self::invoice_row(invoice, -invoice.data.total_amount, LedgerReference::Invoice)
    }

    /// An edit that moved an invoice's total from `old_total`, if it did move
    pub fn for_invoice_adjustment(invoice: &Invoice, old_total: Amount) -> Option<Self> {
        let delta = invoice.data.total_amount - old_total;
        (!delta.is_zero())
            .then(|| Self::invoice_row(invoice, -delta, LedgerReference::InvoiceAdjustment))
    }

    /// A cancelled invoice
    pub fn for_invoice_reversal(invoice: &Invoice) -> Self {
        Self::invoice_row(
            invoice,
            invoice.data.total_amount,
            LedgerReference::InvoiceReversal,
        )
    }

    /// An allocation of `payment_id` against `invoice`, with `signed_amount`
    /// already in the invoice's currency and carrying the direction's sign
    pub fn for_allocation(invoice: &Invoice, payment_id: PaymentId, signed_amount: Amount) -> Self {
        Self {
            payment_id: Some(payment_id),
            ..Self::invoice_row(invoice, signed_amount, LedgerReference::Allocation)
        }
    }

    /// One leg of a cross-currency allocation, dated by the invoice
    pub fn for_conversion(
        invoice: &Invoice,
        payment_id: PaymentId,
        currency_id: CurrencyId,
        amount: Amount,
    ) -> Self {
        Self {
            currency_id,
            payment_id: Some(payment_id),
            ..Self::invoice_row(invoice, amount, LedgerReference::Conversion)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        Audit, DateTime, InvoiceData, InvoiceDirection, InvoiceStatusId, PaymentData,
        PaymentStatusId, PaymentTypeId, ServiceTypeId, Stamp,
    };
    use time::macros::{date, datetime};

    fn audit() -> Audit {
        Audit::created(&Stamp::new(
            DateTime::from(datetime!(2025-03-01 10:00 UTC)),
            "tester",
        ))
    }

    fn invoice(total: &str) -> Invoice {
        let total: Amount = total.parse().unwrap();
        Invoice {
            id: InvoiceId(3),
            data: InvoiceData {
                direction: InvoiceDirection::Receivable,
                partner_id: PartnerId(7),
                service_type_id: ServiceTypeId(1),
                total_amount: total,
                currency_id: CurrencyId(2),
                issue_date: date!(2025 - 03 - 01),
                due_date: None,
                commentary: None,
                shipment_id: None,
                status_id: InvoiceStatusId::DRAFT,
            },
            paid_amount: Amount::ZERO,
            outstanding_balance: total,
            audit: audit(),
        }
    }

    fn payment(total: &str) -> Payment {
        let total: Amount = total.parse().unwrap();
        Payment {
            id: PaymentId(5),
            data: PaymentData {
                partner_id: PartnerId(7),
                payment_date: date!(2025 - 02 - 27),
                currency_id: CurrencyId::RUB,
                amount: total,
                processing_fees: Amount::ZERO,
                payment_type_id: PaymentTypeId(1),
                payment_status_id: PaymentStatusId::COMPLETED,
                commentary: None,
            },
            total_amount: total,
            unallocated_amount: total,
            allocated_amount: Amount::ZERO,
            is_fully_allocated: false,
            audit: audit(),
        }
    }

    #[test]
    fn payment_rows() {
        let p = payment("95.00");
        let row = LedgerDraft::for_payment(&p);
        assert_eq!(row.amount, "95.00".parse().unwrap());
        assert_eq!(row.reference, LedgerReference::Payment);
        assert_eq!(row.payment_id, Some(PaymentId(5)));
        assert_eq!(row.transaction_date, date!(2025 - 02 - 27));

        let reversal = LedgerDraft::for_payment_reversal(&p);
        assert_eq!(reversal.amount, "-95.00".parse().unwrap());

        let adj = LedgerDraft::for_payment_adjustment(&p, "100.00".parse().unwrap()).unwrap();
        assert_eq!(adj.amount, "-5.00".parse().unwrap());
        assert!(LedgerDraft::for_payment_adjustment(&p, p.total_amount).is_none());
    }

    #[test]
    fn invoice_rows() {
        let inv = invoice("250.00");
        let row = LedgerDraft::for_invoice(&inv);
        assert_eq!(row.amount, "-250.00".parse().unwrap());
        assert_eq!(row.invoice_id, Some(InvoiceId(3)));
        assert_eq!(row.payment_id, None);

        let adj = LedgerDraft::for_invoice_adjustment(&inv, "200.00".parse().unwrap()).unwrap();
        assert_eq!(adj.amount, "-50.00".parse().unwrap());
        assert_eq!(adj.reference, LedgerReference::InvoiceAdjustment);

        let reversal = LedgerDraft::for_invoice_reversal(&inv);
        assert_eq!(reversal.amount, "250.00".parse().unwrap());
    }

    #[test]
    fn allocation_rows_link_both_sides() {
        let inv = invoice("250.00");
        let row = LedgerDraft::for_allocation(&inv, PaymentId(5), "-40.00".parse().unwrap());
        assert_eq!(row.reference, LedgerReference::Allocation);
        assert_eq!(row.invoice_id, Some(InvoiceId(3)));
        assert_eq!(row.payment_id, Some(PaymentId(5)));
        assert_eq!(row.currency_id, CurrencyId(2));

        let leg = LedgerDraft::for_conversion(
            &inv,
            PaymentId(5),
            CurrencyId::RUB,
            "-3600.00".parse().unwrap(),
        );
        assert_eq!(leg.reference, LedgerReference::Conversion);
        assert_eq!(leg.currency_id, CurrencyId::RUB);
        assert_eq!(leg.transaction_date, date!(2025 - 03 - 01));
    }

    #[test]
    fn reference_ids() {
        for id in 1..=8 {
            let reference = LedgerReference::try_from(id).unwrap();
            assert_eq!(i32::from(reference), id);
        }
        assert!(LedgerReference::try_from(9).is_err());
    }
}
