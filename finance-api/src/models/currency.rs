use crate::models::{Audit, CurrencyId, Failure};

/// The writable fields of a currency
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase")
)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct CurrencyData {
    /// The alphabetic code, e.g. `USD`
    pub code: String,
    /// The three-digit numeric code from the all-Russian classifier of currencies
    pub okv_code: String,
    /// A human-readable name
    pub name: String,
    /// Only enabled currencies receive exchange rates
    #[cfg_attr(feature = "serde", serde(default = "enabled_by_default"))]
    pub enabled: bool,
}

#[cfg(feature = "serde")]
fn enabled_by_default() -> bool {
    true
}

impl CurrencyData {
    /// Check the field constraints, reporting the first violation
    pub fn validate(&self) -> Result<(), Failure> {
        let code_ok = (3..=4).contains(&self.code.len())
            && self.code.chars().all(|c| c.is_ascii_uppercase());
        if !code_ok {
            return Err(Failure::invalid("validation.currency.code.pattern"));
        }

        let okv_ok = self.okv_code.len() == 3 && self.okv_code.chars().all(|c| c.is_ascii_digit());
        if !okv_ok {
            return Err(Failure::invalid("validation.currency.okvCode.pattern"));
        }

        let name = self.name.trim();
        if name.is_empty() {
            return Err(Failure::invalid("validation.currency.name.notBlank"));
        }
        if !(2..=50).contains(&name.chars().count()) {
            return Err(Failure::invalid("validation.currency.name.size"));
        }

        Ok(())
    }
}

/// A stored currency
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase")
)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Currency {
    /// The database key
    pub id: CurrencyId,
    /// The currency's fields
    #[cfg_attr(feature = "serde", serde(flatten))]
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    pub data: CurrencyData,
    /// Who wrote the record, and when
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    pub audit: Audit,
}
