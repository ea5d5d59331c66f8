use crate::models::{Amount, CurrencyId, InvoiceId, PartnerId, PaymentId};
use std::borrow::Cow;
use thiserror::Error;

/// A domain-level refusal.
///
/// Failures are expected outcomes (a missing record, an invariant that would
/// be broken) as opposed to infrastructure errors. Each carries a stable
/// message key which is what API clients receive.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Failure {
    /// No currency has the given id
    #[error("currency {0} not found")]
    CurrencyNotFound(CurrencyId),
    /// A lookup table has no entry with the given id
    #[error("{catalog} {id} not found")]
    CatalogEntryNotFound { catalog: &'static str, id: i32 },
    /// No invoice has the given id
    #[error("invoice {0} not found")]
    InvoiceNotFound(InvoiceId),
    /// The partner has no invoices
    #[error("no invoices for partner {0}")]
    NoInvoicesForPartner(PartnerId),
    /// No payment has the given id
    #[error("payment {0} not found")]
    PaymentNotFound(PaymentId),
    /// The partner has no payments
    #[error("no payments for partner {0}")]
    NoPaymentsForPartner(PartnerId),
    /// The partner has no allocations
    #[error("no allocations for partner {0}")]
    NoAllocationsForPartner(PartnerId),
    /// Nothing has been allocated to the invoice
    #[error("no allocations for invoice {0}")]
    NoAllocationsForInvoice(InvoiceId),
    /// Nothing has been allocated from the payment
    #[error("no allocations for payment {0}")]
    NoAllocationsForPayment(PaymentId),
    /// The partner directory does not know the partner
    #[error("partner {0} not found")]
    PartnerNotFound(PartnerId),
    /// The partner directory could not be reached
    #[error("partner directory unavailable")]
    PartnerUnavailable,
    /// A payment and an invoice belong to different partners
    #[error("payment belongs to partner {payment}, invoice to partner {invoice}")]
    PartnerMismatch {
        payment: PartnerId,
        invoice: PartnerId,
    },
    /// An allocation amount below one cent
    #[error("allocated amount must be at least 0.01")]
    AllocatedAmountTooSmall,
    /// A conversion that rounds to less than one cent
    #[error("converted amount must be at least 0.01")]
    ConvertedAmountTooSmall,
    /// A conversion whose result cannot be represented
    #[error("converted amount is too large")]
    ConvertedAmountTooLarge,
    /// The payment does not have enough unallocated money
    #[error("requested {requested} but only {available} is unallocated")]
    InsufficientUnallocated { available: Amount, requested: Amount },
    /// The invoice does not have that much outstanding
    #[error("requested {requested} but only {outstanding} is outstanding")]
    ExceedsOutstanding {
        outstanding: Amount,
        requested: Amount,
    },
    /// A deallocation larger than what was allocated
    #[error("no existing allocation covers the requested amount")]
    NoExistingAllocation,
    /// The invoice is cancelled and cannot take allocations
    #[error("invoice {0} is cancelled")]
    InvoiceCancelled(InvoiceId),
    /// An invoice edit or cancellation was refused
    #[error("invoice cannot be updated: {0}")]
    InvoiceUpdate(InvoiceUpdateRefusal),
    /// A payment edit or deletion was refused
    #[error("payment cannot be updated: {0}")]
    PaymentUpdate(PaymentUpdateRefusal),
    /// A field constraint was violated; carries the message key
    #[error("validation failed: {0}")]
    Invalid(Cow<'static, str>),
    /// No rate could be found or fetched for the currency and date
    #[error("no {currency} exchange rate available for {date}")]
    ExchangeRateUnavailable { currency: String, date: time::Date },
    /// A unique constraint would be violated
    #[error("a record with the same unique key already exists")]
    Duplicate,
    /// The record is still referenced
    #[error("the record is referenced elsewhere")]
    InUse,
}

/// A coarse classification of failures, used to pick a response status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The addressed resource does not exist
    NotFound,
    /// The request is well-formed but breaks a rule
    Invalid,
    /// The request conflicts with stored state
    Conflict,
    /// A collaborating service could not be reached
    Unavailable,
    /// A collaborating service did not produce what was needed
    Upstream,
}

impl Failure {
    /// Construct a validation failure from its message key
    pub fn invalid(key: impl Into<Cow<'static, str>>) -> Self {
        Self::Invalid(key.into())
    }

    /// The message key reported to clients
    pub fn key(&self) -> Cow<'static, str> {
        match self {
            Self::CurrencyNotFound(_) => "error.currency.notFound".into(),
            Self::CatalogEntryNotFound { catalog, .. } => format!("error.{catalog}.notFound").into(),
            Self::InvoiceNotFound(_) => "error.invoice.notFound".into(),
            Self::NoInvoicesForPartner(_) => "error.invoice.partner.notFound".into(),
            Self::PaymentNotFound(_) => "error.payment.notFound".into(),
            Self::NoPaymentsForPartner(_) => "error.payment.partner.notFound".into(),
            Self::NoAllocationsForPartner(_) => "error.paymentInvoice.client.notFound".into(),
            Self::NoAllocationsForInvoice(_) => "error.paymentInvoice.invoice.notFound".into(),
            Self::NoAllocationsForPayment(_) => "error.paymentInvoice.payment.notFound".into(),
            Self::PartnerNotFound(_) => "error.partner.notFound".into(),
            Self::PartnerUnavailable => "error.partner.unavailable".into(),
            Self::PartnerMismatch { .. } => {
                "error.paymentInvoice.paymentAndInvoiceClientMismatch".into()
            }
            Self::AllocatedAmountTooSmall => "validation.paymentAllocation.allocatedAmount.min".into(),
            Self::ConvertedAmountTooSmall => {
                "validation.paymentAllocation.convertedAmount.min".into()
            }
            Self::ConvertedAmountTooLarge => "validation.convertedAmount.max".into(),
            Self::InsufficientUnallocated { .. } => {
                "validation.paymentAllocation.allocatedAmount.exceedsUnallocated".into()
            }
            Self::ExceedsOutstanding { .. } => {
                "validation.paymentAllocation.allocatedAmount.exceedsOutstanding".into()
            }
            Self::NoExistingAllocation => {
                "error.allocation.noExistingAllocationForPaymentInvoice".into()
            }
            Self::InvoiceCancelled(_) => "error.invoice.cancelled".into(),
            Self::InvoiceUpdate(_) => "error.invoice.update".into(),
            Self::PaymentUpdate(_) => "error.payment.update".into(),
            Self::Invalid(key) => key.clone(),
            Self::ExchangeRateUnavailable { .. } => "error.exchangeRate.retrievalFailed".into(),
            Self::Duplicate => "error.database.uniqueConstraintViolation".into(),
            Self::InUse => "error.database.foreignKeyConstraintViolation".into(),
        }
    }

    /// Classify the failure
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::CurrencyNotFound(_)
            | Self::CatalogEntryNotFound { .. }
            | Self::InvoiceNotFound(_)
            | Self::NoInvoicesForPartner(_)
            | Self::PaymentNotFound(_)
            | Self::NoPaymentsForPartner(_)
            | Self::NoAllocationsForPartner(_)
            | Self::NoAllocationsForInvoice(_)
            | Self::NoAllocationsForPayment(_)
            | Self::PartnerNotFound(_) => FailureKind::NotFound,
            Self::Duplicate | Self::InUse => FailureKind::Conflict,
            Self::PartnerUnavailable => FailureKind::Unavailable,
            Self::ExchangeRateUnavailable { .. } => FailureKind::Upstream,
            _ => FailureKind::Invalid,
        }
    }
}

/// Why an invoice update was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InvoiceUpdateRefusal {
    /// The partner differs from the stored one
    #[error("the partner cannot change")]
    PartnerChanged,
    /// The currency differs from the stored one
    #[error("the currency cannot change")]
    CurrencyChanged,
    /// The issue date differs from the stored one
    #[error("the issue date cannot change")]
    IssueDateChanged,
    /// The invoice is cancelled
    #[error("the invoice is cancelled")]
    Cancelled,
    /// Something has been allocated to the invoice
    #[error("payments have already been allocated to the invoice")]
    AlreadyPaid,
}

/// Why a payment update (or deletion) was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PaymentUpdateRefusal {
    /// The partner differs from the stored one
    #[error("the partner cannot change")]
    PartnerChanged,
    /// The currency differs from the stored one
    #[error("the currency cannot change")]
    CurrencyChanged,
    /// The new total would not cover existing allocations
    #[error("the new total is below the amount already allocated")]
    BelowAllocated,
    /// Something has been allocated from the payment
    #[error("the payment has allocations")]
    HasAllocations,
}
