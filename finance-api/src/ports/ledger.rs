use crate::models::{Amount, CurrencyId, InvoiceId, LedgerEntry, PartnerId, PaymentId};
use std::future::Future;

/// Read access to the partner ledger.
///
/// Rows are only ever written as a side effect of invoice, payment and
/// allocation operations.
pub trait LedgerRepository: super::Repository {
    /// Every row for a partner, in insertion order
    fn ledger_for_partner(
        &self,
        partner_id: PartnerId,
    ) -> impl Future<Output = Result<Vec<LedgerEntry>, Self::Error>> + Send;

    /// Every row that references an invoice
    fn ledger_for_invoice(
        &self,
        invoice_id: InvoiceId,
    ) -> impl Future<Output = Result<Vec<LedgerEntry>, Self::Error>> + Send;

    /// Every row that references a payment
    fn ledger_for_payment(
        &self,
        payment_id: PaymentId,
    ) -> impl Future<Output = Result<Vec<LedgerEntry>, Self::Error>> + Send;

    /// The signed sum of a partner's rows in one currency
    fn partner_balance(
        &self,
        partner_id: PartnerId,
        currency_id: CurrencyId,
    ) -> impl Future<Output = Result<Amount, Self::Error>> + Send;

    /// The signed sum of a partner's rows, in rubles
    fn partner_base_balance(
        &self,
        partner_id: PartnerId,
    ) -> impl Future<Output = Result<Amount, Self::Error>> + Send;
}
