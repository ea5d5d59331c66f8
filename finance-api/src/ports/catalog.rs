use crate::models::{Catalog, CatalogRecord, Stamp};
use std::future::Future;

/// Repository interface for a lookup table.
///
/// A backend implements this once per [`Catalog`] marker. Callers usually
/// name the catalog explicitly, e.g. `CatalogRepository::<PaymentTypes>::list_entries(&db)`.
pub trait CatalogRepository<C: Catalog>: super::Repository {
    /// List all entries ordered by id
    fn list_entries(
        &self,
    ) -> impl Future<Output = Result<Vec<CatalogRecord<C::Id, C::Data>>, Self::Error>> + Send;

    /// Get an entry by id
    fn get_entry(
        &self,
        id: C::Id,
    ) -> impl Future<Output = Result<Option<CatalogRecord<C::Id, C::Data>>, Self::Error>> + Send;

    /// Create an entry
    fn create_entry(
        &self,
        data: C::Data,
        stamp: &Stamp,
    ) -> impl Future<Output = Result<CatalogRecord<C::Id, C::Data>, Self::Error>> + Send;

    /// Replace an entry's payload, returning Ok(None) if it does not exist
    fn update_entry(
        &self,
        id: C::Id,
        data: C::Data,
        stamp: &Stamp,
    ) -> impl Future<Output = Result<Option<CatalogRecord<C::Id, C::Data>>, Self::Error>> + Send;

    /// Delete an entry, returning whether a row was removed
    fn delete_entry(&self, id: C::Id) -> impl Future<Output = Result<bool, Self::Error>> + Send;
}
