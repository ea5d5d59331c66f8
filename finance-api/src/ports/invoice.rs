use crate::{
    models::{Invoice, InvoiceData, InvoiceId, PartnerId, Stamp},
    ports::RateSource,
};
use std::future::Future;

/// Repository interface for invoices.
///
/// Every mutation also writes the matching ledger row in the same transaction,
/// which is why mutations take a rate source: a row in a foreign currency is
/// priced in rubles as of the invoice's issue date.
pub trait InvoiceRepository: super::Repository {
    /// List all invoices ordered by id
    fn list_invoices(&self) -> impl Future<Output = Result<Vec<Invoice>, Self::Error>> + Send;

    /// Get an invoice by id
    fn get_invoice(
        &self,
        invoice_id: InvoiceId,
    ) -> impl Future<Output = Result<Option<Invoice>, Self::Error>> + Send;

    /// List a partner's invoices.
    ///
    /// An empty result is refused with `NoInvoicesForPartner`.
    fn invoices_for_partner(
        &self,
        partner_id: PartnerId,
    ) -> impl Future<Output = Result<Vec<Invoice>, Self::Error>> + Send;

    /// Issue an invoice and record it in the ledger
    fn create_invoice(
        &self,
        data: InvoiceData,
        stamp: &Stamp,
        rates: &impl RateSource,
    ) -> impl Future<Output = Result<Invoice, Self::Error>> + Send;

    /// Edit an invoice, recording any change of total in the ledger.
    ///
    /// # Returns
    ///
    /// - Ok(Some(invoice)) with the updated invoice
    /// - Ok(None) if the invoice does not exist
    /// - Err(InvoiceUpdate) if the edit is not allowed
    fn update_invoice(
        &self,
        invoice_id: InvoiceId,
        data: InvoiceData,
        stamp: &Stamp,
        rates: &impl RateSource,
    ) -> impl Future<Output = Result<Option<Invoice>, Self::Error>> + Send;

    /// Cancel an invoice and reverse it in the ledger.
    ///
    /// Returns false if the invoice does not exist. Cancelling an already
    /// cancelled invoice succeeds without writing anything.
    fn cancel_invoice(
        &self,
        invoice_id: InvoiceId,
        stamp: &Stamp,
        rates: &impl RateSource,
    ) -> impl Future<Output = Result<bool, Self::Error>> + Send;
}
