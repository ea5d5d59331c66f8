use crate::models::{
    Amount, Audit, CurrencyId, Failure, PartnerId, PaymentId, PaymentStatusId, PaymentTypeId,
    PaymentUpdateRefusal,
};

/// The writable fields of a payment
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct PaymentData {
    /// The partner that paid, or was paid
    pub partner_id: PartnerId,
    /// When the money moved
    #[cfg_attr(feature = "schemars", schemars(with = "String"))]
    pub payment_date: time::Date,
    /// The currency of `amount` and `processing_fees`
    pub currency_id: CurrencyId,
    /// The gross amount
    pub amount: Amount,
    /// Bank or processor fees withheld from `amount`
    #[cfg_attr(feature = "serde", serde(default))]
    pub processing_fees: Amount,
    /// How the payment was made
    pub payment_type_id: PaymentTypeId,
    /// The lifecycle state; only completed payments count towards balances
    #[cfg_attr(feature = "serde", serde(default = "completed"))]
    pub payment_status_id: PaymentStatusId,
    /// Free text, at most 255 characters
    #[cfg_attr(feature = "serde", serde(default))]
    pub commentary: Option<String>,
}

#[cfg(feature = "serde")]
fn completed() -> PaymentStatusId {
    PaymentStatusId::COMPLETED
}

impl PaymentData {
    /// The amount available for allocation: `amount - processing_fees`
    pub fn total(&self) -> Amount {
        self.amount - self.processing_fees
    }

    /// Check the field constraints against the current date, reporting the
    /// first violation
    pub fn validate(&self, today: time::Date) -> Result<(), Failure> {
        if self.amount < Amount::CENT {
            return Err(Failure::invalid("validation.payment.amount.minimum"));
        }
        if !self.amount.within_limit() {
            return Err(Failure::invalid("validation.payment.amount.format"));
        }
        if self.processing_fees < Amount::ZERO || self.processing_fees >= self.amount {
            return Err(Failure::invalid("validation.payment.processingFees.min"));
        }
        if self.payment_date > today {
            return Err(Failure::invalid("validation.payment.paymentDate.pastOrPresent"));
        }
        if self
            .commentary
            .as_ref()
            .is_some_and(|text| text.chars().count() > 255)
        {
            return Err(Failure::invalid("validation.payment.commentary.size"));
        }
        Ok(())
    }
}

/// A stored payment
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct Payment {
    /// The database key
    pub id: PaymentId,
    /// The payment's writable fields
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub data: PaymentData,
    /// `amount - processing_fees`
    pub total_amount: Amount,
    /// The part of `total_amount` not yet allocated to invoices
    pub unallocated_amount: Amount,
    /// The part of `total_amount` allocated to invoices
    pub allocated_amount: Amount,
    /// Whether nothing remains to allocate
    pub is_fully_allocated: bool,
    /// Who wrote the record, and when
    pub audit: Audit,
}

impl Payment {
    /// Decide whether `update` may replace this payment's fields
    pub fn check_update(&self, update: &PaymentData) -> Result<(), Failure> {
        let refusal = if update.partner_id != self.data.partner_id {
            Some(PaymentUpdateRefusal::PartnerChanged)
        } else if update.currency_id != self.data.currency_id {
            Some(PaymentUpdateRefusal::CurrencyChanged)
        } else if update.total() < self.allocated_amount {
            Some(PaymentUpdateRefusal::BelowAllocated)
        } else {
            None
        };

        match refusal {
            Some(reason) => Err(Failure::PaymentUpdate(reason)),
            None => Ok(()),
        }
    }

    /// Decide whether the payment may be deleted
    pub fn check_delete(&self) -> Result<(), Failure> {
        if self.allocated_amount.is_positive() {
            Err(Failure::PaymentUpdate(PaymentUpdateRefusal::HasAllocations))
        } else {
            Ok(())
        }
    }
}
