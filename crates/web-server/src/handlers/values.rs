use super::{authorize_account, ApiJson, ApiPath, ApiQuery, DateRange};
use crate::{error::AppError, identity::CurrentUser, AppState};
use analytics::PerformancePoint;
use axum::{
    extract::{Path, Query, State},
    Json,
};
use axum_extra::extract::WithRejection;
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use core_types::{AccessLevel, AccountId, CoreError, ValuationRecord};
use database::DbError;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct NewAccountValue {
    pub value: Decimal,
}

/// The calendar date of `now` in the account's timezone. Accounts stored
/// without one are treated as UTC.
pub fn today_in_timezone(timezone: Option<&str>, now: DateTime<Utc>) -> Result<NaiveDate, AppError> {
    let tz = match timezone.map(str::trim).filter(|tz| !tz.is_empty()) {
        Some(name) => name.parse::<Tz>().map_err(|_| {
            tracing::error!(timezone = name, "Account carries an unknown timezone.");
            AppError::Database(DbError::MalformedRow(CoreError::MalformedRecord {
                record: "account",
                field: "timezone",
            }))
        })?,
        None => Tz::UTC,
    };
    Ok(now.with_timezone(&tz).date_naive())
}

/// # GET /api/accounts/:account_id/values
/// The account's valuations with the cumulative return since the first date in range.
pub async fn get_account_values(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    WithRejection(Path(account_id), _): ApiPath<AccountId>,
    WithRejection(Query(range), _): ApiQuery<DateRange>,
) -> Result<Json<Vec<PerformancePoint>>, AppError> {
    range.validate()?;
    authorize_account(&state, user_id, account_id, AccessLevel::Read).await?;

    let values = state
        .db_repo
        .get_account_values_for_period(account_id, range.start_date, range.end_date)
        .await?;
    let series = state.engine.compute_performance(&values, &state.db_repo).await?;
    Ok(Json(PerformancePoint::from_series(&series)))
}

/// # POST /api/accounts/:account_id/values
/// Records today's value, attributed to the strategy the account is executing.
pub async fn post_account_value(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    WithRejection(Path(account_id), _): ApiPath<AccountId>,
    WithRejection(Json(request), _): ApiJson<NewAccountValue>,
) -> Result<Json<ValuationRecord>, AppError> {
    let account = authorize_account(&state, user_id, account_id, AccessLevel::Edit).await?;
    let value_date = today_in_timezone(account.timezone.as_deref(), Utc::now())?;

    let stored = state
        .db_repo
        .upsert_account_value(account_id, value_date, request.value, account.executing_strategy_id)
        .await?;
    tracing::info!(account_id, %value_date, value = %stored.value, "Account value recorded.");
    Ok(Json(stored))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn date_follows_the_account_timezone() {
        // 23:30 UTC on Jan 1st is already Jan 2nd in Amsterdam.
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 23, 30, 0).unwrap();
        assert_eq!(
            today_in_timezone(Some("Europe/Amsterdam"), now).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()
        );
        assert_eq!(
            today_in_timezone(Some("America/New_York"), now).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
        );
    }

    #[test]
    fn missing_timezone_means_utc() {
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 0, 15, 0).unwrap();
        assert_eq!(
            today_in_timezone(None, now).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 10).unwrap()
        );
    }

    #[test]
    fn unknown_timezone_is_rejected() {
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 0, 15, 0).unwrap();
        assert!(matches!(
            today_in_timezone(Some("Nowhere/Special"), now),
            Err(AppError::Database(DbError::MalformedRow(_)))
        ));
    }

    #[test]
    fn value_bodies_accept_plain_numbers() {
        let body: NewAccountValue = serde_json::from_str(r#"{"value": 10450.25}"#).unwrap();
        assert_eq!(body.value, Decimal::new(1045025, 2));
    }
}
