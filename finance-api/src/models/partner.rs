use crate::models::PartnerId;

/// A client or supplier, as known to the partner directory
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Partner {
    /// The directory's key for the partner
    pub id: PartnerId,
    /// The partner's display name
    #[cfg_attr(feature = "serde", serde(default))]
    pub name: Option<String>,
}
