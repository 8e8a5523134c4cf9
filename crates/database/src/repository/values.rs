use super::DbRepository;
use crate::DbError;
use chrono::NaiveDate;
use core_types::{require, AccountId, CoreError, StrategyId, UserId, ValuationRecord};
use rust_decimal::Decimal;
use sqlx::FromRow;

/// A row of `account_values` as stored. Columns the schema allows to be null
/// are optional here and checked when converting to a `ValuationRecord`.
#[derive(Debug, Clone, FromRow)]
pub(crate) struct DbAccountValue {
    pub account_id: Option<AccountId>,
    pub value_date: Option<NaiveDate>,
    pub value: Option<Decimal>,
    pub executed_strategy_id: Option<StrategyId>,
}

impl TryFrom<DbAccountValue> for ValuationRecord {
    type Error = CoreError;

    fn try_from(row: DbAccountValue) -> Result<Self, Self::Error> {
        Ok(ValuationRecord {
            account_id: require(row.account_id, "valuation", "account_id")?,
            value_date: require(row.value_date, "valuation", "value_date")?,
            value: require(row.value, "valuation", "value")?,
            strategy_id: row.executed_strategy_id,
        })
    }
}

/// `$1` strategy, `$2`/`$3` optional date bounds, and `$4` the user when
/// the result is restricted to that user's linked accounts.
fn strategy_values_query(visible_to_user: bool) -> String {
    let user_scope = if visible_to_user {
        "JOIN user_account_links AS l
              ON l.account_id = v.account_id AND l.user_id = $4 AND l.is_active"
    } else {
        ""
    };
    format!(
        r#"
            SELECT v.account_id, v.value_date, v.value, v.executed_strategy_id
            FROM account_values AS v
            {user_scope}
            WHERE v.executed_strategy_id = $1
              AND ($2::DATE IS NULL OR v.value_date >= $2)
              AND ($3::DATE IS NULL OR v.value_date <= $3)
            ORDER BY v.value_date ASC, v.account_id ASC
            "#
    )
}

fn into_records(rows: Vec<DbAccountValue>) -> Result<Vec<ValuationRecord>, DbError> {
    Ok(rows
        .into_iter()
        .map(ValuationRecord::try_from)
        .collect::<Result<Vec<_>, _>>()?)
}

impl DbRepository {
    /// Fetches an account's valuations within the inclusive date range.
    /// A missing bound leaves that side of the range open.
    pub async fn get_account_values_for_period(
        &self,
        account_id: AccountId,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<ValuationRecord>, DbError> {
        let rows = sqlx::query_as::<_, DbAccountValue>(
            r#"
            SELECT account_id, value_date, value, executed_strategy_id
            FROM account_values
            WHERE account_id = $1
              AND ($2::DATE IS NULL OR value_date >= $2)
              AND ($3::DATE IS NULL OR value_date <= $3)
            ORDER BY value_date ASC
            "#,
        )
        .bind(account_id)
        .bind(start_date)
        .bind(end_date)
        .fetch_all(&self.pool)
        .await?;
        into_records(rows)
    }

    /// Fetches every valuation recorded while the strategy was executing.
    ///
    /// With `visible_to` set, only accounts the user holds an active link to
    /// are included; `None` spans every account that ran the strategy.
    pub async fn get_account_values_for_strategy(
        &self,
        strategy_id: StrategyId,
        visible_to: Option<UserId>,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<ValuationRecord>, DbError> {
        let sql = strategy_values_query(visible_to.is_some());
        let mut query = sqlx::query_as::<_, DbAccountValue>(&sql)
            .bind(strategy_id)
            .bind(start_date)
            .bind(end_date);
        if let Some(user_id) = visible_to {
            query = query.bind(user_id);
        }
        let rows = query.fetch_all(&self.pool).await?;
        into_records(rows)
    }

    /// Records the account's value for a date, replacing any earlier value for that date.
    pub async fn upsert_account_value(
        &self,
        account_id: AccountId,
        value_date: NaiveDate,
        value: Decimal,
        executed_strategy_id: Option<StrategyId>,
    ) -> Result<ValuationRecord, DbError> {
        let row = sqlx::query_as::<_, DbAccountValue>(
            r#"
            INSERT INTO account_values (account_id, value_date, value, executed_strategy_id)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (account_id, value_date)
            DO UPDATE SET value = EXCLUDED.value, executed_strategy_id = EXCLUDED.executed_strategy_id
            RETURNING account_id, value_date, value, executed_strategy_id
            "#,
        )
        .bind(account_id)
        .bind(value_date)
        .bind(value)
        .bind(executed_strategy_id)
        .fetch_one(&self.pool)
        .await?;
        tracing::debug!(account_id, %value_date, %value, "Account value recorded.");
        Ok(ValuationRecord::try_from(row)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn row() -> DbAccountValue {
        DbAccountValue {
            account_id: Some(4),
            value_date: NaiveDate::from_ymd_opt(2024, 5, 17),
            value: Some(dec!(1520.75)),
            executed_strategy_id: None,
        }
    }

    #[test]
    fn complete_rows_convert() {
        let record = ValuationRecord::try_from(row()).unwrap();
        assert_eq!(record.account_id, 4);
        assert_eq!(record.value, dec!(1520.75));
        assert_eq!(record.strategy_id, None);
    }

    #[test]
    fn rows_without_a_value_are_rejected_not_zeroed() {
        let err = ValuationRecord::try_from(DbAccountValue { value: None, ..row() }).unwrap_err();
        assert_eq!(
            err,
            CoreError::MalformedRecord {
                record: "valuation",
                field: "value"
            }
        );
    }

    #[test]
    fn one_bad_row_fails_the_batch() {
        let rows = vec![row(), DbAccountValue { value_date: None, ..row() }];
        assert!(matches!(into_records(rows), Err(DbError::MalformedRow(_))));
    }

    #[test]
    fn strategy_values_for_a_user_are_limited_to_linked_accounts() {
        let sql = strategy_values_query(true);
        assert!(sql.contains("JOIN user_account_links AS l"));
        assert!(sql.contains("l.account_id = v.account_id"));
        assert!(sql.contains("l.user_id = $4"));
        assert!(sql.contains("l.is_active"));
        assert!(sql.contains("v.executed_strategy_id = $1"));
    }

    #[test]
    fn unscoped_strategy_values_span_every_account() {
        let sql = strategy_values_query(false);
        assert!(!sql.contains("user_account_links"));
        assert!(!sql.contains("$4"));
        assert!(sql.contains("v.executed_strategy_id = $1"));
    }
}
