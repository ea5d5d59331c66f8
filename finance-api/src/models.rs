mod allocation;
mod audit;
mod balance;
mod catalog;
mod currency;
mod datetime;
mod failure;
mod ids;
mod invoice;
mod ledger;
mod money;
mod partner;
mod payment;
mod rate;

pub use allocation::AllocationRequest;
pub use audit::{Audit, Stamp};
pub use balance::{BalanceSums, PartnerBalanceReport, PartnerBalanceRow};
pub use catalog::{
    Catalog, CatalogData, CatalogRecord, InvoiceStatus, InvoiceStatuses, LocalizedData,
    Localizations, NamedData, PaymentStatus, PaymentStatuses, PaymentType, PaymentTypeData,
    PaymentTypes, ReferenceType, ReferenceTypes, ServiceType, ServiceTypes,
};
pub use currency::{Currency, CurrencyData};
pub use datetime::DateTime;
pub use failure::{Failure, FailureKind, InvoiceUpdateRefusal, PaymentUpdateRefusal};
pub use ids::{
    CurrencyId, InvoiceId, InvoiceStatusId, LedgerEntryId, PartnerId, PaymentId, PaymentStatusId,
    PaymentTypeId, ReferenceTypeId, ServiceTypeId,
};
pub use invoice::{Invoice, InvoiceData, InvoiceDirection, UnknownDirection};
pub use ledger::{LedgerDraft, LedgerEntry, LedgerReference, UnknownReference};
pub use money::{Amount, ParseDecimalError, Rate};
pub use partner::Partner;
pub use payment::{Payment, PaymentData};
pub use rate::{Conversion, ExchangeRate, OfficialQuote, RateMarkup, RateUpdateLog};
