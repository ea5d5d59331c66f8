use crate::{Db, Error, rows::CURRENCY_COLUMNS};
use finance_api::{
    models::{Currency, CurrencyData, CurrencyId, Stamp},
    ports::CurrencyRepository,
};

impl CurrencyRepository for Db {
    async fn list_currencies(&self, enabled_only: bool) -> Result<Vec<Currency>, Self::Error> {
        let query = format!(
            "select {CURRENCY_COLUMNS} from currency where enabled = 1 or $1 = 0 order by id"
        );
        Ok(sqlx::query_as::<_, Currency>(&query)
            .bind(enabled_only)
            .fetch_all(&self.reader)
            .await?)
    }

    async fn get_currency(&self, currency_id: CurrencyId) -> Result<Option<Currency>, Self::Error> {
        let query = format!("select {CURRENCY_COLUMNS} from currency where id = $1");
        Ok(sqlx::query_as::<_, Currency>(&query)
            .bind(currency_id)
            .fetch_optional(&self.reader)
            .await?)
    }

    async fn create_currency(
        &self,
        data: CurrencyData,
        stamp: &Stamp,
    ) -> Result<Currency, Self::Error> {
        data.validate()?;
        let query = format!(
            "insert into currency (code, okv_code, name, enabled, created_at, modified_at, \
             created_by, modified_by) values ($1, $2, $3, $4, $5, $5, $6, $6) \
             returning {CURRENCY_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Currency>(&query)
            .bind(&data.code)
            .bind(&data.okv_code)
            .bind(data.name.trim())
            .bind(data.enabled)
            .bind(stamp.as_of)
            .bind(&stamp.by)
            .fetch_one(&self.writer)
            .await?)
    }

    async fn update_currency(
        &self,
        currency_id: CurrencyId,
        data: CurrencyData,
        stamp: &Stamp,
    ) -> Result<Option<Currency>, Self::Error> {
        data.validate()?;
        let query = format!(
            "update currency set code = $2, okv_code = $3, name = $4, enabled = $5, \
             modified_at = $6, modified_by = $7 where id = $1 returning {CURRENCY_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Currency>(&query)
            .bind(currency_id)
            .bind(&data.code)
            .bind(&data.okv_code)
            .bind(data.name.trim())
            .bind(data.enabled)
            .bind(stamp.as_of)
            .bind(&stamp.by)
            .fetch_optional(&self.writer)
            .await?)
    }

    async fn delete_currency(&self, currency_id: CurrencyId) -> Result<bool, Self::Error> {
        let result = sqlx::query("delete from currency where id = $1")
            .bind(currency_id)
            .execute(&self.writer)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

impl Db {
    /// The code of a currency, if it exists
    pub(crate) async fn currency_code(
        &self,
        currency_id: CurrencyId,
    ) -> Result<Option<String>, Error> {
        Ok(sqlx::query_scalar::<_, String>("select code from currency where id = $1")
            .bind(currency_id)
            .fetch_optional(&self.reader)
            .await?)
    }

    /// Refuse with `CurrencyNotFound` unless the currency exists
    pub(crate) async fn require_currency(&self, currency_id: CurrencyId) -> Result<(), Error> {
        match self.currency_code(currency_id).await? {
            Some(_) => Ok(()),
            None => Err(finance_api::models::Failure::CurrencyNotFound(currency_id).into()),
        }
    }
}
