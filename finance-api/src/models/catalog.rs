//! Lookup tables.
//!
//! Payment types, payment statuses, invoice statuses, service types and
//! reference types all share one shape: an integer key, a small data payload
//! and audit fields. Rather than spelling out five near-identical record types,
//! each table is described by a zero-sized marker implementing [`Catalog`],
//! and the stored row is a [`CatalogRecord`].

use crate::models::{
    Audit, Failure, InvoiceStatusId, PaymentStatusId, PaymentTypeId, ReferenceTypeId,
    ServiceTypeId,
};
use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;

/// Display names keyed by locale, in insertion order
pub type Localizations = IndexMap<String, String, FxBuildHasher>;

/// Describes one lookup table
pub trait Catalog: Send + Sync + 'static {
    /// The table's key type
    type Id: Copy + Send + Sync + Eq + Into<i32> + From<i32> + std::fmt::Debug + 'static;
    /// The table's payload
    type Data: CatalogData;

    /// The camelCase name used in message keys, e.g. `paymentType`
    const KEY: &'static str;

    /// Check the payload, reporting the first violation
    fn validate(data: &Self::Data) -> Result<(), Failure> {
        let name = data.name().trim();
        if name.is_empty() {
            return Err(Failure::invalid(format!("validation.{}.name.notBlank", Self::KEY)));
        }
        if !(2..=100).contains(&name.chars().count()) {
            return Err(Failure::invalid(format!("validation.{}.name.size", Self::KEY)));
        }
        Ok(())
    }

    /// The failure reported when `id` does not exist
    fn not_found(id: Self::Id) -> Failure {
        Failure::CatalogEntryNotFound {
            catalog: Self::KEY,
            id: id.into(),
        }
    }
}

/// Every catalog payload has a display name
pub trait CatalogData: Clone + Send + Sync + 'static {
    /// The entry's display name
    fn name(&self) -> &str;
}

/// A stored catalog entry
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct CatalogRecord<Id, Data> {
    /// The database key
    pub id: Id,
    /// The entry's fields
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub data: Data,
    /// Who wrote the record, and when
    pub audit: Audit,
}

/// The payload of a payment type
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PaymentTypeData {
    /// The display name
    pub name: String,
    /// An optional longer description
    #[cfg_attr(feature = "serde", serde(default))]
    pub description: Option<String>,
}

/// A payload consisting of only a name
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NamedData {
    /// The display name
    pub name: String,
}

/// A payload with a default name and per-locale alternatives
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LocalizedData {
    /// The default display name
    pub name: String,
    /// Display names by locale
    #[cfg_attr(feature = "serde", serde(default))]
    pub localizations: Localizations,
}

impl CatalogData for PaymentTypeData {
    fn name(&self) -> &str {
        &self.name
    }
}

impl CatalogData for NamedData {
    fn name(&self) -> &str {
        &self.name
    }
}

impl CatalogData for LocalizedData {
    fn name(&self) -> &str {
        &self.name
    }
}

macro_rules! catalog {
    ($marker:ident, $id:ty, $data:ty, $key:literal, $doc:literal) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy)]
        pub struct $marker;

        impl Catalog for $marker {
            type Id = $id;
            type Data = $data;
            const KEY: &'static str = $key;
        }
    };
}

catalog!(
    PaymentTypes,
    PaymentTypeId,
    PaymentTypeData,
    "paymentType",
    "Ways a payment can be made, e.g. wire transfer"
);
catalog!(
    PaymentStatuses,
    PaymentStatusId,
    NamedData,
    "paymentStatus",
    "Lifecycle states of a payment"
);
catalog!(
    InvoiceStatuses,
    InvoiceStatusId,
    LocalizedData,
    "invoiceStatus",
    "Lifecycle states of an invoice"
);
catalog!(
    ServiceTypes,
    ServiceTypeId,
    LocalizedData,
    "serviceType",
    "Kinds of service an invoice can bill for"
);
catalog!(
    ReferenceTypes,
    ReferenceTypeId,
    NamedData,
    "referenceType",
    "Kinds of event a ledger row can record"
);

/// A stored payment type
pub type PaymentType = CatalogRecord<PaymentTypeId, PaymentTypeData>;
/// A stored payment status
pub type PaymentStatus = CatalogRecord<PaymentStatusId, NamedData>;
/// A stored invoice status
pub type InvoiceStatus = CatalogRecord<InvoiceStatusId, LocalizedData>;
/// A stored service type
pub type ServiceType = CatalogRecord<ServiceTypeId, LocalizedData>;
/// A stored reference type
pub type ReferenceType = CatalogRecord<ReferenceTypeId, NamedData>;
