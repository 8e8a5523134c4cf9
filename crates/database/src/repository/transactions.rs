use super::DbRepository;
use crate::DbError;
use analytics::{AnalyticsError, TransactionFetcher};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use core_types::{require, AccountId, CoreError, TransactionRecord};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

const TRANSACTION_COLUMNS: &str = "id, account_id, broker_transaction_id, transaction_datetime, value, \
     shared_transaction, internal_transaction, include_in_performance";

/// The last instant Postgres can store on a calendar day (microsecond resolution).
const END_OF_DAY: NaiveTime = match NaiveTime::from_hms_micro_opt(23, 59, 59, 999_999) {
    Some(t) => t,
    None => NaiveTime::MIN,
};

/// A row of `account_transactions`, as listed through the API.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct StoredTransaction {
    pub id: i32,
    pub account_id: Option<AccountId>,
    pub broker_transaction_id: i64,
    pub transaction_datetime: Option<NaiveDateTime>,
    pub value: Option<Decimal>,
    pub shared_transaction: bool,
    pub internal_transaction: bool,
    pub include_in_performance: bool,
}

impl TryFrom<StoredTransaction> for TransactionRecord {
    type Error = CoreError;

    fn try_from(row: StoredTransaction) -> Result<Self, Self::Error> {
        Ok(TransactionRecord {
            account_id: require(row.account_id, "transaction", "account_id")?,
            transaction_datetime: require(
                row.transaction_datetime,
                "transaction",
                "transaction_datetime",
            )?,
            value: require(row.value, "transaction", "value")?,
            internal: row.internal_transaction,
            shared: row.shared_transaction,
            include_in_performance: row.include_in_performance,
        })
    }
}

/// A transaction reported by the broker. Posting the same
/// `broker_transaction_id` again for the account updates it in place.
#[derive(Debug, Clone, Deserialize)]
pub struct NewTransaction {
    pub broker_transaction_id: i64,
    pub transaction_datetime: NaiveDateTime,
    pub value: Decimal,
    #[serde(default)]
    pub internal: bool,
    #[serde(default)]
    pub shared: bool,
    #[serde(default = "include_by_default")]
    pub include_in_performance: bool,
}

fn include_by_default() -> bool {
    true
}

/// Inclusive timestamp bounds covering every instant of `[start_date, end_date]`.
pub(crate) fn day_window(start_date: NaiveDate, end_date: NaiveDate) -> (NaiveDateTime, NaiveDateTime) {
    (start_date.and_time(NaiveTime::MIN), end_date.and_time(END_OF_DAY))
}

impl DbRepository {
    /// Fetches all transactions of the accounts that fall on a day within the range.
    pub async fn get_transactions_for_period(
        &self,
        account_ids: &[AccountId],
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<TransactionRecord>, DbError> {
        if account_ids.is_empty() {
            return Ok(Vec::new());
        }
        let (from, to) = day_window(start_date, end_date);

        let rows = sqlx::query_as::<_, StoredTransaction>(&format!(
            r#"
            SELECT {TRANSACTION_COLUMNS}
            FROM account_transactions
            WHERE account_id = ANY($1)
              AND transaction_datetime >= $2
              AND transaction_datetime <= $3
            ORDER BY transaction_datetime ASC
            "#
        ))
        .bind(account_ids)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(TransactionRecord::try_from)
            .collect::<Result<Vec<_>, _>>()?)
    }

    /// Lists an account's transactions, newest first. Missing bounds leave the range open.
    pub async fn list_transactions(
        &self,
        account_id: AccountId,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<StoredTransaction>, DbError> {
        let from = start_date.map(|d| d.and_time(NaiveTime::MIN));
        let to = end_date.map(|d| d.and_time(END_OF_DAY));

        let rows = sqlx::query_as::<_, StoredTransaction>(&format!(
            r#"
            SELECT {TRANSACTION_COLUMNS}
            FROM account_transactions
            WHERE account_id = $1
              AND ($2::TIMESTAMP IS NULL OR transaction_datetime >= $2)
              AND ($3::TIMESTAMP IS NULL OR transaction_datetime <= $3)
            ORDER BY transaction_datetime DESC
            "#
        ))
        .bind(account_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Inserts or updates a transaction keyed by the broker's id, and stamps the
    /// account's `last_transaction_update`.
    pub async fn upsert_transaction(
        &self,
        account_id: AccountId,
        transaction: &NewTransaction,
    ) -> Result<StoredTransaction, DbError> {
        let mut tx = self.pool.begin().await?;

        let stored = sqlx::query_as::<_, StoredTransaction>(&format!(
            r#"
            INSERT INTO account_transactions (
                account_id, broker_transaction_id, transaction_datetime, value,
                internal_transaction, shared_transaction, include_in_performance
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (account_id, broker_transaction_id) DO UPDATE SET
                transaction_datetime = EXCLUDED.transaction_datetime,
                value = EXCLUDED.value,
                internal_transaction = EXCLUDED.internal_transaction,
                shared_transaction = EXCLUDED.shared_transaction,
                include_in_performance = EXCLUDED.include_in_performance
            RETURNING {TRANSACTION_COLUMNS}
            "#
        ))
        .bind(account_id)
        .bind(transaction.broker_transaction_id)
        .bind(transaction.transaction_datetime)
        .bind(transaction.value)
        .bind(transaction.internal)
        .bind(transaction.shared)
        .bind(transaction.include_in_performance)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE accounts SET last_transaction_update = NOW() WHERE id = $1")
            .bind(account_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(stored)
    }
}

#[async_trait]
impl TransactionFetcher for DbRepository {
    async fn fetch_transactions(
        &self,
        account_ids: &[AccountId],
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<TransactionRecord>, AnalyticsError> {
        self.get_transactions_for_period(account_ids, start_date, end_date)
            .await
            .map_err(|e| match e {
                DbError::MalformedRow(core) => AnalyticsError::Record(core),
                other => AnalyticsError::TransactionFetch(Box::new(other)),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn stored() -> StoredTransaction {
        StoredTransaction {
            id: 1,
            account_id: Some(2),
            broker_transaction_id: 90817,
            transaction_datetime: date(2024, 1, 2).and_hms_opt(9, 15, 0),
            value: Some(dec!(-500)),
            shared_transaction: false,
            internal_transaction: true,
            include_in_performance: true,
        }
    }

    #[test]
    fn window_covers_both_end_days_completely() {
        let (from, to) = day_window(date(2024, 1, 1), date(2024, 1, 31));
        assert_eq!(from, date(2024, 1, 1).and_hms_opt(0, 0, 0).unwrap());
        assert_eq!(to, date(2024, 1, 31).and_hms_micro_opt(23, 59, 59, 999_999).unwrap());
    }

    #[test]
    fn stored_rows_keep_their_flags() {
        let record = TransactionRecord::try_from(stored()).unwrap();
        assert!(record.internal);
        assert!(!record.shared);
        assert!(!record.counts_toward_performance());
        assert_eq!(record.value, dec!(-500));
    }

    #[test]
    fn rows_without_a_datetime_are_rejected() {
        let row = StoredTransaction {
            transaction_datetime: None,
            ..stored()
        };
        assert!(matches!(
            TransactionRecord::try_from(row),
            Err(CoreError::MalformedRecord {
                field: "transaction_datetime",
                ..
            })
        ));
    }

    #[test]
    fn posted_transactions_count_unless_told_otherwise() {
        let json = r#"{"broker_transaction_id": 5, "transaction_datetime": "2024-01-02T10:00:00", "value": 250.0}"#;
        let parsed: NewTransaction = serde_json::from_str(json).unwrap();
        assert!(parsed.include_in_performance);
        assert!(!parsed.internal);
        assert!(!parsed.shared);
    }
}
