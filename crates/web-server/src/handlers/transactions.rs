use super::{authorize_account, ApiJson, ApiPath, ApiQuery, DateRange};
use crate::{error::AppError, identity::CurrentUser, AppState};
use axum::{
    extract::{Path, Query, State},
    Json,
};
use axum_extra::extract::WithRejection;
use core_types::{AccessLevel, AccountId};
use database::{NewTransaction, StoredTransaction};
use std::sync::Arc;

/// # GET /api/accounts/:account_id/transactions
pub async fn list_transactions(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    WithRejection(Path(account_id), _): ApiPath<AccountId>,
    WithRejection(Query(range), _): ApiQuery<DateRange>,
) -> Result<Json<Vec<StoredTransaction>>, AppError> {
    range.validate()?;
    authorize_account(&state, user_id, account_id, AccessLevel::Read).await?;

    let transactions = state
        .db_repo
        .list_transactions(account_id, range.start_date, range.end_date)
        .await?;
    Ok(Json(transactions))
}

/// # POST /api/accounts/:account_id/transactions
/// Re-posting a known `broker_transaction_id` updates the stored transaction.
pub async fn post_transaction(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    WithRejection(Path(account_id), _): ApiPath<AccountId>,
    WithRejection(Json(transaction), _): ApiJson<NewTransaction>,
) -> Result<Json<StoredTransaction>, AppError> {
    authorize_account(&state, user_id, account_id, AccessLevel::Edit).await?;

    let stored = state.db_repo.upsert_transaction(account_id, &transaction).await?;
    tracing::info!(
        account_id,
        broker_transaction_id = stored.broker_transaction_id,
        "Transaction recorded."
    );
    Ok(Json(stored))
}
