use crate::models::{
    DateTime, Failure, InvoiceStatuses, OfficialQuote, Partner, PartnerId, PaymentStatuses,
    PaymentTypes, ReferenceTypes, ServiceTypes,
};
use std::future::Future;

mod allocation;
mod balance;
mod catalog;
mod currency;
mod invoice;
mod ledger;
mod payment;
mod rate;

pub use allocation::AllocationRepository;
pub use balance::BalanceRepository;
pub use catalog::CatalogRepository;
pub use currency::CurrencyRepository;
pub use invoice::InvoiceRepository;
pub use ledger::LedgerRepository;
pub use payment::PaymentRepository;
pub use rate::ExchangeRateRepository;

/// The base trait for a storage backend.
///
/// Domain refusals travel inside the backend's error type, so every error type
/// must be constructible from a [`Failure`] and must be able to hand it back.
pub trait Repository: Clone + Send + Sync + 'static {
    /// The error type for infrastructure failures and domain refusals alike
    type Error: std::error::Error + From<Failure> + AsFailure + Send + Sync + 'static;
}

/// Access to the domain refusal carried by an error, if it carries one
pub trait AsFailure {
    /// The [`Failure`] wrapped by this error, or `None` for infrastructure errors
    fn as_failure(&self) -> Option<&Failure>;
}

/// A backend implementing every repository the finance service needs
pub trait FinanceRepository:
    CurrencyRepository
    + CatalogRepository<PaymentTypes>
    + CatalogRepository<PaymentStatuses>
    + CatalogRepository<InvoiceStatuses>
    + CatalogRepository<ServiceTypes>
    + CatalogRepository<ReferenceTypes>
    + InvoiceRepository
    + PaymentRepository
    + LedgerRepository
    + ExchangeRateRepository
    + AllocationRepository
    + BalanceRepository
{
}

impl<T> FinanceRepository for T where
    T: CurrencyRepository
        + CatalogRepository<PaymentTypes>
        + CatalogRepository<PaymentStatuses>
        + CatalogRepository<InvoiceStatuses>
        + CatalogRepository<ServiceTypes>
        + CatalogRepository<ReferenceTypes>
        + InvoiceRepository
        + PaymentRepository
        + LedgerRepository
        + ExchangeRateRepository
        + AllocationRepository
        + BalanceRepository
{
}

/// An outbound source of official daily exchange rates.
///
/// Repository operations that may need a rate they do not have yet take a
/// `&impl RateSource` and fetch the missing day on demand.
pub trait RateSource: Send + Sync {
    /// The error raised when the source cannot be read
    type Error: std::error::Error + Send + Sync + 'static;

    /// Every quote the source publishes for `date`, each against the ruble
    fn daily_rates(
        &self,
        date: time::Date,
    ) -> impl Future<Output = Result<Vec<OfficialQuote>, Self::Error>> + Send;
}

/// An outbound lookup into the service that owns partner records
pub trait PartnerDirectory: Send + Sync {
    /// The error raised when the directory cannot answer
    type Error: std::error::Error + Send + Sync + 'static;

    /// Look up a partner.
    ///
    /// # Returns
    ///
    /// - Ok(Some(partner)) if the directory knows the partner
    /// - Ok(None) if it does not
    /// - Err(error) if the directory could not be asked
    fn find_partner(
        &self,
        partner_id: PartnerId,
    ) -> impl Future<Output = Result<Option<Partner>, Self::Error>> + Send;
}

/// The composition root consumed by an API layer.
///
/// An implementation ties a storage backend to the outbound services and
/// decides who may do what. Authorization checks receive an opaque request
/// context (e.g. a bearer token) and interpret it however they like.
pub trait Application: Send + Sync {
    /// Request-scoped data used for authorization
    type Context: Send + Sync;
    /// The storage backend
    type Repository: FinanceRepository;
    /// The source of official exchange rates
    type Rates: RateSource;
    /// The partner directory client
    type Partners: PartnerDirectory;

    /// Get the storage backend
    fn database(&self) -> &Self::Repository;

    /// Get the exchange rate source
    fn rates(&self) -> &Self::Rates;

    /// Get the partner directory
    fn partners(&self) -> &Self::Partners;

    /// The current time, used to stamp mutations
    fn now(&self) -> DateTime;

    /// The current business date. Requests that omit a date use it, and
    /// payments may not be dated after it.
    fn today(&self) -> time::Date;

    /// Whether the context may read finance data
    fn can_view(&self, context: &Self::Context) -> impl Future<Output = bool> + Send;

    /// Whether the context may create and modify invoices, payments and
    /// allocations; returns the acting principal if so
    fn can_edit(&self, context: &Self::Context) -> impl Future<Output = Option<String>> + Send;

    /// Whether the context may manage currencies, catalogs and exchange rates;
    /// returns the acting principal if so
    fn can_administer(
        &self,
        context: &Self::Context,
    ) -> impl Future<Output = Option<String>> + Send;
}
