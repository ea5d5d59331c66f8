//! Strongly-typed identifiers for finance entities.
//!
//! Every entity is keyed by a database-assigned integer. Wrapping each key in
//! its own newtype keeps a payment id from being passed where an invoice id is
//! expected, at no runtime cost.

macro_rules! new_id {
    ($struct:ident, $inner:ty) => {
        new_id!($struct, $inner, "A newtype wrapper around an integer key");
    };
    ($struct:ident, $inner:ty, $doc:literal) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
        #[cfg_attr(
            feature = "serde",
            derive(serde::Serialize, serde::Deserialize),
            serde(transparent)
        )]
        #[cfg_attr(feature = "sqlx", derive(sqlx::Type), sqlx(transparent))]
        pub struct $struct(pub $inner);

        impl From<$inner> for $struct {
            fn from(value: $inner) -> Self {
                Self(value)
            }
        }

        impl From<$struct> for $inner {
            fn from(value: $struct) -> Self {
                value.0
            }
        }

        impl std::fmt::Display for $struct {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                self.0.fmt(f)
            }
        }

        impl std::str::FromStr for $struct {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(s.parse()?))
            }
        }
    };
}

new_id!(CurrencyId, i32, "Unique identifier for a currency");
new_id!(
    PartnerId,
    i64,
    "Unique identifier for a partner (client or supplier) owned by the partner directory"
);
new_id!(InvoiceId, i64, "Unique identifier for an invoice");
new_id!(PaymentId, i64, "Unique identifier for a payment");
new_id!(LedgerEntryId, i64, "Unique identifier for a ledger row");
new_id!(PaymentTypeId, i32);
new_id!(PaymentStatusId, i32);
new_id!(InvoiceStatusId, i32);
new_id!(ServiceTypeId, i32);
new_id!(ReferenceTypeId, i32);

impl CurrencyId {
    /// The base currency (Russian ruble). All ledger base amounts and all
    /// stored exchange rates are expressed against it.
    pub const RUB: Self = Self(1);
}

impl PaymentStatusId {
    /// Payments in this status count towards a partner's leftover balance.
    pub const COMPLETED: Self = Self(1);
}

impl InvoiceStatusId {
    /// The status assigned to newly drafted invoices.
    pub const DRAFT: Self = Self(1);
    /// The status assigned to an invoice when it is cancelled.
    pub const CANCELLED: Self = Self(3);
}
