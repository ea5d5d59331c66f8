use crate::{Db, Error, rows::CatalogRow};
use finance_api::{
    models::{
        Catalog, CatalogRecord, InvoiceStatuses, PaymentStatuses, PaymentTypes, ReferenceTypes,
        ServiceTypes, Stamp,
    },
    ports::CatalogRepository,
};
use serde::{Serialize, de::DeserializeOwned};

/// Maps each catalog onto the table that stores it
pub(crate) trait CatalogTable: Catalog {
    const TABLE: &'static str;
}

impl CatalogTable for PaymentTypes {
    const TABLE: &'static str = "payment_type";
}

impl CatalogTable for PaymentStatuses {
    const TABLE: &'static str = "payment_status";
}

impl CatalogTable for InvoiceStatuses {
    const TABLE: &'static str = "invoice_status";
}

impl CatalogTable for ServiceTypes {
    const TABLE: &'static str = "service_type";
}

impl CatalogTable for ReferenceTypes {
    const TABLE: &'static str = "reference_type";
}

const CATALOG_COLUMNS: &str =
    "id, json(data) as data, created_at, modified_at, created_by, modified_by";

impl<C> CatalogRepository<C> for Db
where
    C: CatalogTable,
    C::Data: Serialize + DeserializeOwned + Unpin,
{
    async fn list_entries(&self) -> Result<Vec<CatalogRecord<C::Id, C::Data>>, Self::Error> {
        let query = format!("select {CATALOG_COLUMNS} from {} order by id", C::TABLE);
        let rows = sqlx::query_as::<_, CatalogRow<C::Data>>(&query)
            .fetch_all(&self.reader)
            .await?;
        Ok(rows.into_iter().map(CatalogRow::into_record).collect())
    }

    async fn get_entry(
        &self,
        id: C::Id,
    ) -> Result<Option<CatalogRecord<C::Id, C::Data>>, Self::Error> {
        let query = format!("select {CATALOG_COLUMNS} from {} where id = $1", C::TABLE);
        let row = sqlx::query_as::<_, CatalogRow<C::Data>>(&query)
            .bind(Into::<i32>::into(id))
            .fetch_optional(&self.reader)
            .await?;
        Ok(row.map(CatalogRow::into_record))
    }

    async fn create_entry(
        &self,
        data: C::Data,
        stamp: &Stamp,
    ) -> Result<CatalogRecord<C::Id, C::Data>, Self::Error> {
        C::validate(&data)?;
        let query = format!(
            "insert into {} (data, created_at, modified_at, created_by, modified_by) \
             values ($1, $2, $2, $3, $3) returning {CATALOG_COLUMNS}",
            C::TABLE
        );
        let row = sqlx::query_as::<_, CatalogRow<C::Data>>(&query)
            .bind(encode(&data)?)
            .bind(stamp.as_of)
            .bind(&stamp.by)
            .fetch_one(&self.writer)
            .await?;
        Ok(row.into_record())
    }

    async fn update_entry(
        &self,
        id: C::Id,
        data: C::Data,
        stamp: &Stamp,
    ) -> Result<Option<CatalogRecord<C::Id, C::Data>>, Self::Error> {
        C::validate(&data)?;
        let query = format!(
            "update {} set data = $2, modified_at = $3, modified_by = $4 \
             where id = $1 returning {CATALOG_COLUMNS}",
            C::TABLE
        );
        let row = sqlx::query_as::<_, CatalogRow<C::Data>>(&query)
            .bind(Into::<i32>::into(id))
            .bind(encode(&data)?)
            .bind(stamp.as_of)
            .bind(&stamp.by)
            .fetch_optional(&self.writer)
            .await?;
        Ok(row.map(CatalogRow::into_record))
    }

    async fn delete_entry(&self, id: C::Id) -> Result<bool, Self::Error> {
        let query = format!("delete from {} where id = $1", C::TABLE);
        let result = sqlx::query(&query)
            .bind(Into::<i32>::into(id))
            .execute(&self.writer)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

fn encode<T: Serialize>(data: &T) -> Result<String, Error> {
    Ok(serde_json::to_string(data)?)
}

impl Db {
    /// Refuse with the catalog's not-found failure unless `id` exists
    pub(crate) async fn require_entry<C: CatalogTable>(&self, id: C::Id) -> Result<(), Error> {
        let query = format!("select exists(select 1 from {} where id = $1)", C::TABLE);
        let found = sqlx::query_scalar::<_, bool>(&query)
            .bind(Into::<i32>::into(id))
            .fetch_one(&self.reader)
            .await?;
        if found {
            Ok(())
        } else {
            Err(C::not_found(id).into())
        }
    }
}
