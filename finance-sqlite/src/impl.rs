//! Repository trait implementations for the SQLite database.

use crate::{
    Db, Error,
    rows::{LEDGER_COLUMNS, LedgerRow},
};
use finance_api::{
    models::{Amount, Failure, LedgerDraft, LedgerEntry, Stamp},
    ports::Repository,
};
use sqlx::SqliteConnection;

mod allocation;
mod balance;
mod catalog;
mod currency;
mod invoice;
mod ledger;
mod payment;
mod rate;

impl Repository for Db {
    type Error = Error;
}

/// A ledger draft together with the rate that prices it in rubles
pub(crate) struct PricedDraft {
    pub draft: LedgerDraft,
    pub base_amount: Amount,
}

impl PricedDraft {
    pub fn new(draft: LedgerDraft, to_rub: finance_api::models::Rate) -> Result<Self, Failure> {
        let base_amount = draft
            .amount
            .convert(to_rub)
            .ok_or(Failure::ConvertedAmountTooLarge)?;
        Ok(Self { draft, base_amount })
    }
}

/// Append a ledger row inside the caller's transaction
pub(crate) async fn insert_ledger_entry(
    conn: &mut SqliteConnection,
    priced: &PricedDraft,
    stamp: &Stamp,
) -> Result<LedgerEntry, Error> {
    let draft = &priced.draft;
    let query = format!(
        "insert into ledger_entry (partner_id, currency_id, amount, base_amount, \
         reference_type_id, invoice_id, payment_id, transaction_date, created_at, modified_at, \
         created_by, modified_by) \
         values ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9, $10, $10) \
         returning {LEDGER_COLUMNS}"
    );
    let row = sqlx::query_as::<_, LedgerRow>(&query)
        .bind(draft.partner_id)
        .bind(draft.currency_id)
        .bind(draft.amount)
        .bind(priced.base_amount)
        .bind(i32::from(draft.reference))
        .bind(draft.invoice_id)
        .bind(draft.payment_id)
        .bind(draft.transaction_date)
        .bind(stamp.as_of)
        .bind(&stamp.by)
        .fetch_one(&mut *conn)
        .await?;
    row.try_into()
}
