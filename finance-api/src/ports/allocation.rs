use crate::{
    models::{AllocationRequest, InvoiceId, LedgerEntry, PartnerId, PaymentId, Stamp},
    ports::RateSource,
};
use std::future::Future;

/// Repository interface for applying payments to invoices.
///
/// An allocation moves money from a payment's unallocated balance onto an
/// invoice's paid amount. When the currencies differ the amount is converted
/// at the invoice's issue date and the conversion is recorded in the ledger.
pub trait AllocationRepository: super::Repository {
    /// Allocate part of a payment to an invoice.
    ///
    /// Concurrent allocations against one payment never drive its unallocated
    /// amount below zero.
    ///
    /// # Returns
    ///
    /// The ALLOCATION ledger row that was written.
    fn allocate(
        &self,
        request: AllocationRequest,
        stamp: &Stamp,
        rates: &impl RateSource,
    ) -> impl Future<Output = Result<LedgerEntry, Self::Error>> + Send;

    /// Undo (part of) an earlier allocation
    fn deallocate(
        &self,
        request: AllocationRequest,
        stamp: &Stamp,
        rates: &impl RateSource,
    ) -> impl Future<Output = Result<LedgerEntry, Self::Error>> + Send;

    /// A partner's ALLOCATION rows; empty is refused with `NoAllocationsForPartner`
    fn allocations_for_partner(
        &self,
        partner_id: PartnerId,
    ) -> impl Future<Output = Result<Vec<LedgerEntry>, Self::Error>> + Send;

    /// An invoice's ALLOCATION rows; empty is refused with `NoAllocationsForInvoice`
    fn allocations_for_invoice(
        &self,
        invoice_id: InvoiceId,
    ) -> impl Future<Output = Result<Vec<LedgerEntry>, Self::Error>> + Send;

    /// A payment's ALLOCATION and CONVERSION rows; empty is refused with
    /// `NoAllocationsForPayment`
    fn allocations_for_payment(
        &self,
        payment_id: PaymentId,
    ) -> impl Future<Output = Result<Vec<LedgerEntry>, Self::Error>> + Send;
}
