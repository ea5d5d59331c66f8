use crate::models::{
    Amount, Audit, CurrencyId, Failure, InvoiceId, InvoiceStatusId, InvoiceUpdateRefusal,
    PartnerId, ServiceTypeId,
};
use std::{fmt::Display, str::FromStr};

/// Whether the partner owes us or we owe the partner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "SCREAMING_SNAKE_CASE")
)]
pub enum InvoiceDirection {
    /// Issued to the partner; they pay us
    Receivable,
    /// Issued by the partner; we pay them
    Payable,
}

impl InvoiceDirection {
    /// The textual form used in storage and on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Receivable => "RECEIVABLE",
            Self::Payable => "PAYABLE",
        }
    }

    /// Apply the direction's sign to an allocation amount.
    ///
    /// Settling a receivable moves the partner's ledger balance up, settling a
    /// payable moves it down.
    pub fn signed(&self, amount: Amount) -> Amount {
        match self {
            Self::Receivable => amount,
            Self::Payable => -amount,
        }
    }
}

impl Display for InvoiceDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The error returned when parsing an unknown direction
#[derive(Debug, thiserror::Error)]
#[error("unknown invoice direction: {0}")]
pub struct UnknownDirection(String);

impl FromStr for InvoiceDirection {
    type Err = UnknownDirection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "RECEIVABLE" => Ok(Self::Receivable),
            "PAYABLE" => Ok(Self::Payable),
            other => Err(UnknownDirection(other.to_owned())),
        }
    }
}

/// The writable fields of an invoice
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct InvoiceData {
    /// Who owes whom
    pub direction: InvoiceDirection,
    /// The partner the invoice is issued to or by
    pub partner_id: PartnerId,
    /// What the invoice bills for
    pub service_type_id: ServiceTypeId,
    /// The invoiced amount, in `currency_id`
    pub total_amount: Amount,
    /// The currency of the invoice
    pub currency_id: CurrencyId,
    /// The date of issue; also the date used to convert allocations
    #[cfg_attr(feature = "schemars", schemars(with = "String"))]
    pub issue_date: time::Date,
    /// When payment is due
    #[cfg_attr(feature = "serde", serde(default))]
    #[cfg_attr(feature = "schemars", schemars(with = "Option<String>"))]
    pub due_date: Option<time::Date>,
    /// Free text, at most 255 characters
    #[cfg_attr(feature = "serde", serde(default))]
    pub commentary: Option<String>,
    /// The shipment being billed, if any
    #[cfg_attr(feature = "serde", serde(default))]
    pub shipment_id: Option<i64>,
    /// The lifecycle state
    #[cfg_attr(feature = "serde", serde(default = "draft"))]
    pub status_id: InvoiceStatusId,
}

#[cfg(feature = "serde")]
fn draft() -> InvoiceStatusId {
    InvoiceStatusId::DRAFT
}

impl InvoiceData {
    /// Check the field constraints, reporting the first violation
    pub fn validate(&self) -> Result<(), Failure> {
        if self.total_amount < Amount::CENT {
            return Err(Failure::invalid("validation.invoice.totalAmount.min"));
        }
        if !self.total_amount.within_limit() {
            return Err(Failure::invalid("validation.invoice.totalAmount.format"));
        }
        if self.due_date.is_some_and(|due| due < self.issue_date) {
            return Err(Failure::invalid("validation.invoice.dueDate.beforeIssueDate"));
        }
        if self
            .commentary
            .as_ref()
            .is_some_and(|text| text.chars().count() > 255)
        {
            return Err(Failure::invalid("validation.invoice.commentary.size"));
        }
        Ok(())
    }
}

/// A stored invoice
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct Invoice {
    /// The database key
    pub id: InvoiceId,
    /// The invoice's writable fields
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub data: InvoiceData,
    /// How much has been settled by allocations
    pub paid_amount: Amount,
    /// Always `total_amount - paid_amount`
    pub outstanding_balance: Amount,
    /// Who wrote the record, and when
    pub audit: Audit,
}

impl Invoice {
    /// Whether the invoice has been cancelled
    pub fn is_cancelled(&self) -> bool {
        self.data.status_id == InvoiceStatusId::CANCELLED
    }

    /// Whether any payment has been allocated to the invoice
    pub fn is_paid(&self) -> bool {
        self.paid_amount.is_positive()
    }

    /// Decide whether `update` may replace this invoice's fields
    pub fn check_update(&self, update: &InvoiceData) -> Result<(), Failure> {
        let refusal = if update.partner_id != self.data.partner_id {
            Some(InvoiceUpdateRefusal::PartnerChanged)
        } else if update.currency_id != self.data.currency_id {
            Some(InvoiceUpdateRefusal::CurrencyChanged)
        } else if update.issue_date != self.data.issue_date {
            Some(InvoiceUpdateRefusal::IssueDateChanged)
        } else if self.is_cancelled() {
            Some(InvoiceUpdateRefusal::Cancelled)
        } else if self.is_paid() {
            Some(InvoiceUpdateRefusal::AlreadyPaid)
        } else {
            None
        };

        match refusal {
            Some(reason) => Err(Failure::InvoiceUpdate(reason)),
            None => Ok(()),
        }
    }
}
