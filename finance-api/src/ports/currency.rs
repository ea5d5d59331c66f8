use crate::models::{Currency, CurrencyData, CurrencyId, Stamp};
use std::future::Future;

/// Repository interface for the currency table
pub trait CurrencyRepository: super::Repository {
    /// List currencies ordered by id, optionally only the enabled ones
    fn list_currencies(
        &self,
        enabled_only: bool,
    ) -> impl Future<Output = Result<Vec<Currency>, Self::Error>> + Send;

    /// Get a currency by id
    fn get_currency(
        &self,
        currency_id: CurrencyId,
    ) -> impl Future<Output = Result<Option<Currency>, Self::Error>> + Send;

    /// Create a currency.
    ///
    /// A duplicate `code` is refused with [`Failure::Duplicate`](crate::models::Failure::Duplicate).
    fn create_currency(
        &self,
        data: CurrencyData,
        stamp: &Stamp,
    ) -> impl Future<Output = Result<Currency, Self::Error>> + Send;

    /// Replace a currency's fields.
    ///
    /// # Returns
    ///
    /// Ok(None) if the currency does not exist.
    fn update_currency(
        &self,
        currency_id: CurrencyId,
        data: CurrencyData,
        stamp: &Stamp,
    ) -> impl Future<Output = Result<Option<Currency>, Self::Error>> + Send;

    /// Delete a currency, returning whether a row was removed.
    ///
    /// A currency still referenced by invoices, payments, ledger rows or rates
    /// is refused with [`Failure::InUse`](crate::models::Failure::InUse).
    fn delete_currency(
        &self,
        currency_id: CurrencyId,
    ) -> impl Future<Output = Result<bool, Self::Error>> + Send;
}
