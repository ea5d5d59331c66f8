use crate::{
    models::{PartnerBalanceReport, PartnerId},
    ports::RateSource,
};
use std::future::Future;

/// Reporting over payments and invoices
pub trait BalanceRepository: super::Repository {
    /// What a partner has in hand and still owes, per currency, with ruble
    /// totals priced at `report_date`
    fn partner_balance_report(
        &self,
        partner_id: PartnerId,
        report_date: time::Date,
        rates: &impl RateSource,
    ) -> impl Future<Output = Result<PartnerBalanceReport, Self::Error>> + Send;
}
