use crate::{
    Db, Error,
    rows::{LEDGER_COLUMNS, LedgerRow, convert_all},
};
use finance_api::{
    models::{Amount, CurrencyId, InvoiceId, LedgerEntry, PartnerId, PaymentId},
    ports::LedgerRepository,
};

impl LedgerRepository for Db {
    async fn ledger_for_partner(
        &self,
        partner_id: PartnerId,
    ) -> Result<Vec<LedgerEntry>, Self::Error> {
        self.ledger_where("partner_id = $1", partner_id).await
    }

    async fn ledger_for_invoice(
        &self,
        invoice_id: InvoiceId,
    ) -> Result<Vec<LedgerEntry>, Self::Error> {
        self.ledger_where("invoice_id = $1", invoice_id).await
    }

    async fn ledger_for_payment(
        &self,
        payment_id: PaymentId,
    ) -> Result<Vec<LedgerEntry>, Self::Error> {
        self.ledger_where("payment_id = $1", payment_id).await
    }

    async fn partner_balance(
        &self,
        partner_id: PartnerId,
        currency_id: CurrencyId,
    ) -> Result<Amount, Self::Error> {
        Ok(sqlx::query_scalar::<_, Amount>(
            "select coalesce(sum(amount), 0) from ledger_entry \
             where partner_id = $1 and currency_id = $2",
        )
        .bind(partner_id)
        .bind(currency_id)
        .fetch_one(&self.reader)
        .await?)
    }

    async fn partner_base_balance(&self, partner_id: PartnerId) -> Result<Amount, Self::Error> {
        Ok(sqlx::query_scalar::<_, Amount>(
            "select coalesce(sum(base_amount), 0) from ledger_entry where partner_id = $1",
        )
        .bind(partner_id)
        .fetch_one(&self.reader)
        .await?)
    }
}

impl Db {
    /// Ledger rows matching a single-parameter filter, in insertion order
    pub(crate) async fn ledger_where<T>(
        &self,
        filter: &str,
        value: T,
    ) -> Result<Vec<LedgerEntry>, Error>
    where
        T: for<'q> sqlx::Encode<'q, sqlx::Sqlite> + sqlx::Type<sqlx::Sqlite> + Send + 'static,
    {
        let query = format!("select {LEDGER_COLUMNS} from ledger_entry where {filter} order by id");
        let rows = sqlx::query_as::<_, LedgerRow>(&query)
            .bind(value)
            .fetch_all(&self.reader)
            .await?;
        convert_all(rows)
    }
}
