use crate::models::{Amount, CurrencyId, Failure, PartnerId, Rate};

/// Per-currency sums feeding one row of a balance report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BalanceSums {
    /// Unallocated money on completed payments
    pub leftover: Amount,
    /// Outstanding on invoices nothing has been allocated to
    pub unpaid: Amount,
    /// Outstanding on invoices that are partly settled
    pub partially_paid: Amount,
    /// Outstanding on every live invoice
    pub outstanding: Amount,
}

/// One currency's line in a partner balance report
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct PartnerBalanceRow {
    /// The currency of the row
    pub currency_id: CurrencyId,
    /// The currency's code, or `???` if it is unknown
    pub currency_code: String,
    /// Unallocated money on completed payments
    pub leftover: Amount,
    /// Outstanding on unpaid invoices
    pub unpaid: Amount,
    /// Outstanding on partially paid invoices
    pub partially_paid: Amount,
    /// Outstanding on all live invoices
    pub outstanding: Amount,
    /// `leftover` in rubles
    pub leftover_rub: Amount,
    /// `outstanding` in rubles
    pub outstanding_rub: Amount,
}

impl PartnerBalanceRow {
    /// Build a row, pricing the ruble columns with `to_rub`
    pub fn new(
        currency_id: CurrencyId,
        currency_code: impl Into<String>,
        sums: BalanceSums,
        to_rub: Rate,
    ) -> Result<Self, Failure> {
        let in_rubles = |amount: Amount| {
            amount
                .convert(to_rub)
                .ok_or(Failure::ConvertedAmountTooLarge)
        };
        Ok(Self {
            currency_id,
            currency_code: currency_code.into(),
            leftover: sums.leftover,
            unpaid: sums.unpaid,
            partially_paid: sums.partially_paid,
            outstanding: sums.outstanding,
            leftover_rub: in_rubles(sums.leftover)?,
            outstanding_rub: in_rubles(sums.outstanding)?,
        })
    }
}

/// What a partner has in hand and what they still owe, by currency
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct PartnerBalanceReport {
    /// The partner reported on
    pub partner_id: PartnerId,
    /// The day whose rates price the ruble columns
    #[cfg_attr(feature = "schemars", schemars(with = "String"))]
    pub report_date: time::Date,
    /// One row per currency, ordered by currency id
    pub rows: Vec<PartnerBalanceRow>,
    /// The sum of `leftover_rub` over all rows
    pub total_leftover_rub: Amount,
    /// The sum of `outstanding_rub` over all rows
    pub total_outstanding_rub: Amount,
}

impl PartnerBalanceReport {
    /// Assemble a report, computing the totals from `rows`
    pub fn new(partner_id: PartnerId, report_date: time::Date, rows: Vec<PartnerBalanceRow>) -> Self {
        let total_leftover_rub = rows.iter().map(|row| row.leftover_rub).sum();
        let total_outstanding_rub = rows.iter().map(|row| row.outstanding_rub).sum();
        Self {
            partner_id,
            report_date,
            rows,
            total_leftover_rub,
            total_outstanding_rub,
        }
    }

    /// The row for `currency_id`, if the partner has activity in it
    pub fn row(&self, currency_id: CurrencyId) -> Option<&PartnerBalanceRow> {
        self.rows.iter().find(|row| row.currency_id == currency_id)
    }
}
