use crate::{
    models::{PartnerId, Payment, PaymentData, PaymentId, Stamp},
    ports::RateSource,
};
use std::future::Future;

/// Repository interface for payments.
///
/// As with invoices, each mutation writes its ledger row in the same
/// transaction.
pub trait PaymentRepository: super::Repository {
    /// List all payments ordered by id
    fn list_payments(&self) -> impl Future<Output = Result<Vec<Payment>, Self::Error>> + Send;

    /// Get a payment by id
    fn get_payment(
        &self,
        payment_id: PaymentId,
    ) -> impl Future<Output = Result<Option<Payment>, Self::Error>> + Send;

    /// List a partner's payments; an empty result is refused with `NoPaymentsForPartner`
    fn payments_for_partner(
        &self,
        partner_id: PartnerId,
    ) -> impl Future<Output = Result<Vec<Payment>, Self::Error>> + Send;

    /// Record a payment; all of it starts out unallocated
    fn create_payment(
        &self,
        data: PaymentData,
        stamp: &Stamp,
        rates: &impl RateSource,
    ) -> impl Future<Output = Result<Payment, Self::Error>> + Send;

    /// Edit a payment, returning Ok(None) if it does not exist
    fn update_payment(
        &self,
        payment_id: PaymentId,
        data: PaymentData,
        stamp: &Stamp,
        rates: &impl RateSource,
    ) -> impl Future<Output = Result<Option<Payment>, Self::Error>> + Send;

    /// Delete an unallocated payment, reversing it in the ledger.
    ///
    /// Returns false if the payment does not exist.
    fn delete_payment(
        &self,
        payment_id: PaymentId,
        stamp: &Stamp,
        rates: &impl RateSource,
    ) -> impl Future<Output = Result<bool, Self::Error>> + Send;
}
