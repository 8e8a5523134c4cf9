use crate::{error::AppError, AppState};
use axum::{
    extract::{Path, Query, State},
    Json,
};
use axum_extra::extract::WithRejection;
use chrono::NaiveDate;
use core_types::{AccessLevel, Account, AccountId, StrategyId, StrategyLink, UserId};
use serde::Deserialize;
use std::sync::Arc;

pub mod accounts;
pub mod positions;
pub mod strategies;
pub mod transactions;
pub mod values;

// Extractors whose failures are reported through `AppError`, so every 4xx
// carries the same JSON body.
pub type ApiJson<T> = WithRejection<Json<T>, AppError>;
pub type ApiQuery<T> = WithRejection<Query<T>, AppError>;
pub type ApiPath<T> = WithRejection<Path<T>, AppError>;

/// Optional inclusive `start_date`/`end_date` query bounds (`YYYY-MM-DD`).
#[derive(Debug, Default, Clone, Copy, Deserialize)]
pub struct DateRange {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl DateRange {
    pub fn validate(&self) -> Result<(), AppError> {
        match (self.start_date, self.end_date) {
            (Some(start), Some(end)) if start > end => Err(AppError::BadRequest(format!(
                "start_date {start} is after end_date {end}"
            ))),
            _ => Ok(()),
        }
    }
}

/// # GET /api/ready
/// Succeeds only while the database answers.
pub async fn readiness(State(state): State<Arc<AppState>>) -> Result<&'static str, AppError> {
    state.db_repo.ping().await?;
    Ok("READY")
}

/// Loads the account if `user_id` holds an active link granting `level`.
///
/// Accounts the user cannot see at all are reported as missing.
pub(crate) async fn authorize_account(
    state: &AppState,
    user_id: UserId,
    account_id: AccountId,
    level: AccessLevel,
) -> Result<Account, AppError> {
    let link = state
        .db_repo
        .get_account_link(user_id, account_id)
        .await?
        .filter(|link| link.can_read())
        .ok_or_else(|| AppError::NotFound(format!("account {account_id} not found")))?;

    if !level.is_read_only() && !link.can_edit() {
        tracing::warn!(user_id, account_id, "Edit refused on a read-only account link.");
        return Err(AppError::Forbidden(format!(
            "no edit rights on account {account_id}"
        )));
    }

    Ok(state.db_repo.get_account(account_id).await?)
}

/// Returns the user's active link to the strategy; a missing or inactive link is a 404.
pub(crate) async fn strategy_link(
    state: &AppState,
    user_id: UserId,
    strategy_id: StrategyId,
) -> Result<StrategyLink, AppError> {
    state
        .db_repo
        .get_strategy_link(user_id, strategy_id)
        .await?
        .filter(|link| link.can_use())
        .ok_or_else(|| AppError::NotFound(format!("strategy {strategy_id} not found")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn open_and_single_day_ranges_are_valid() {
        assert!(DateRange::default().validate().is_ok());
        let same_day = DateRange {
            start_date: Some(date(2024, 1, 5)),
            end_date: Some(date(2024, 1, 5)),
        };
        assert!(same_day.validate().is_ok());
        let open_end = DateRange {
            start_date: Some(date(2024, 1, 5)),
            end_date: None,
        };
        assert!(open_end.validate().is_ok());
    }

    #[test]
    fn inverted_range_is_a_bad_request() {
        let range = DateRange {
            start_date: Some(date(2024, 2, 1)),
            end_date: Some(date(2024, 1, 1)),
        };
        assert!(matches!(range.validate(), Err(AppError::BadRequest(_))));
    }
}
