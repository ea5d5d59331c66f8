//! Timestamps for audit trails.
//!
//! [`DateTime`] represents a UTC instant with subsecond precision. It wraps
//! `time::PrimitiveDateTime` so that it maps onto a plain SQL datetime column,
//! and always (de)serializes as RFC3339.

use std::{borrow::Borrow, fmt::Display};
use time::format_description::well_known::Rfc3339;

/// A UTC timestamp with subsecond precision.
///
/// ```
/// # use finance_api::models::DateTime;
/// # use time::macros::datetime;
/// let stamp = DateTime::from(datetime!(2025-01-01 12:00 +3));
/// assert_eq!(stamp.to_string(), "2025-01-01T09:00:00Z");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(from = "DateTimeDto", into = "DateTimeDto")
)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type), sqlx(transparent))]
pub struct DateTime(time::PrimitiveDateTime);

impl DateTime {
    /// The calendar date of this instant, in UTC
    pub fn date(&self) -> time::Date {
        self.0.date()
    }
}

impl Display for DateTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let value: time::OffsetDateTime = (*self).into();
        let formatted = value.format(&Rfc3339).map_err(|_| std::fmt::Error)?;
        f.write_str(&formatted)
    }
}

impl<T: Borrow<time::OffsetDateTime>> From<T> for DateTime {
    fn from(value: T) -> Self {
        let utc = value.borrow().to_offset(time::UtcOffset::UTC);
        Self(time::PrimitiveDateTime::new(utc.date(), utc.time()))
    }
}

impl From<DateTime> for time::OffsetDateTime {
    fn from(value: DateTime) -> Self {
        value.0.assume_utc()
    }
}

// Helper type that pins (de)serialization to RFC3339

#[cfg(feature = "serde")]
#[derive(serde::Serialize, serde::Deserialize)]
struct DateTimeDto(#[serde(with = "time::serde::rfc3339")] time::OffsetDateTime);

#[cfg(feature = "serde")]
impl From<DateTimeDto> for DateTime {
    fn from(value: DateTimeDto) -> Self {
        value.0.into()
    }
}

#[cfg(feature = "serde")]
impl From<DateTime> for DateTimeDto {
    fn from(value: DateTime) -> Self {
        DateTimeDto(value.into())
    }
}

#[cfg(feature = "schemars")]
impl schemars::JsonSchema for DateTime {
    fn inline_schema() -> bool {
        true
    }

    fn schema_name() -> std::borrow::Cow<'static, str> {
        "DateTime".into()
    }

    fn json_schema(_: &mut schemars::SchemaGenerator) -> schemars::Schema {
        schemars::json_schema!({
            "type": "string",
            "format": "date-time",
        })
    }
}
