use crate::models::DateTime;

/// Creation and modification metadata carried by every stored record
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase")
)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Audit {
    /// When the record was first written
    pub created_at: DateTime,
    /// When the record was last written
    pub modified_at: DateTime,
    /// The principal that created the record
    pub created_by: String,
    /// The principal that last modified the record
    pub modified_by: String,
}

impl Audit {
    /// Audit data for a record written for the first time
    pub fn created(stamp: &Stamp) -> Self {
        Self {
            created_at: stamp.as_of,
            modified_at: stamp.as_of,
            created_by: stamp.by.clone(),
            modified_by: stamp.by.clone(),
        }
    }
}

/// The instant, business date and principal attached to a mutation.
///
/// Repository operations that write take a `Stamp` rather than reading a clock
/// or a session themselves, which keeps them deterministic under test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stamp {
    /// The time of the mutation
    pub as_of: DateTime,
    /// The business date of the mutation
    pub today: time::Date,
    /// The acting principal
    pub by: String,
}

impl Stamp {
    /// Construct a stamp for `by` acting at `as_of`, on the UTC date of `as_of`
    pub fn new(as_of: impl Into<DateTime>, by: impl Into<String>) -> Self {
        let as_of = as_of.into();
        Self {
            as_of,
            today: as_of.date(),
            by: by.into(),
        }
    }

    /// Use `today` as the business date
    pub fn on(self, today: time::Date) -> Self {
        Self { today, ..self }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime};

    #[test]
    fn business_date_defaults_to_the_utc_date() {
        let stamp = Stamp::new(DateTime::from(datetime!(2025-03-03 22:30 UTC)), "tester");
        assert_eq!(stamp.today, date!(2025 - 03 - 03));

        let stamp = stamp.on(date!(2025 - 03 - 04));
        assert_eq!(stamp.today, date!(2025 - 03 - 04));
        assert_eq!(stamp.as_of.date(), date!(2025 - 03 - 03));
    }
}
