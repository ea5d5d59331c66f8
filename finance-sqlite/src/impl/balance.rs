use crate::Db;
use finance_api::{
    models::{
        Amount, BalanceSums, CurrencyId, InvoiceStatusId, PartnerBalanceReport,
        PartnerBalanceRow, PartnerId, PaymentStatusId,
    },
    ports::{BalanceRepository, RateSource},
};
use std::collections::BTreeMap;

impl BalanceRepository for Db {
    async fn partner_balance_report(
        &self,
        partner_id: PartnerId,
        report_date: time::Date,
        rates: &impl RateSource,
    ) -> Result<PartnerBalanceReport, Self::Error> {
        let leftovers = sqlx::query_as::<_, (CurrencyId, Amount)>(
            "select currency_id, sum(unallocated_amount) from payment \
             where partner_id = $1 and payment_status_id = $2 \
             group by currency_id",
        )
        .bind(partner_id)
        .bind(PaymentStatusId::COMPLETED)
        .fetch_all(&self.reader)
        .await?;

        let owed = sqlx::query_as::<_, (CurrencyId, Amount, Amount, Amount)>(
            "select currency_id, \
             sum(case when paid_amount = 0 then outstanding_balance else 0 end), \
             sum(case when paid_amount > 0 and paid_amount < total_amount \
                 then outstanding_balance else 0 end), \
             sum(outstanding_balance) \
             from invoice where partner_id = $1 and status_id != $2 \
             group by currency_id",
        )
        .bind(partner_id)
        .bind(InvoiceStatusId::CANCELLED)
        .fetch_all(&self.reader)
        .await?;

        let mut sums: BTreeMap<CurrencyId, BalanceSums> = BTreeMap::new();
        for (currency_id, leftover) in leftovers {
            sums.entry(currency_id).or_default().leftover = leftover;
        }
        for (currency_id, unpaid, partially_paid, outstanding) in owed {
            let row = sums.entry(currency_id).or_default();
            row.unpaid = unpaid;
            row.partially_paid = partially_paid;
            row.outstanding = outstanding;
        }

        let mut rows = Vec::with_capacity(sums.len());
        for (currency_id, sums) in sums {
            let code = self
                .currency_code(currency_id)
                .await?
                .unwrap_or_else(|| "???".to_owned());
            let to_rub = self.rate_to_rub(currency_id, report_date, rates).await?;
            rows.push(PartnerBalanceRow::new(currency_id, code, sums, to_rub)?);
        }

        Ok(PartnerBalanceReport::new(partner_id, report_date, rows))
    }
}
