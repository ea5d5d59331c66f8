use crate::models::{Amount, InvoiceId, PaymentId};

/// A request to move money between a payment and an invoice.
///
/// Used both to allocate and to deallocate.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct AllocationRequest {
    /// The payment supplying the money
    pub payment_id: PaymentId,
    /// The invoice being settled
    pub invoice_id: InvoiceId,
    /// The amount, in the payment's currency
    pub allocated_amount: Amount,
}
