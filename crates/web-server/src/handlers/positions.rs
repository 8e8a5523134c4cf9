use super::{authorize_account, ApiJson, ApiPath, ApiQuery};
use crate::{error::AppError, identity::CurrentUser, AppState};
use axum::{
    extract::{Path, Query, State},
    Json,
};
use axum_extra::extract::WithRejection;
use core_types::{AccessLevel, AccountId, Position};
use database::PositionUpsert;
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Default, Deserialize)]
pub struct PositionFilter {
    #[serde(default)]
    pub only_open: bool,
}

/// # GET /api/accounts/:account_id/positions
pub async fn list_positions(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    WithRejection(Path(account_id), _): ApiPath<AccountId>,
    WithRejection(Query(filter), _): ApiQuery<PositionFilter>,
) -> Result<Json<Vec<Position>>, AppError> {
    authorize_account(&state, user_id, account_id, AccessLevel::Read).await?;

    let positions = state
        .db_repo
        .get_positions_for_account(account_id, filter.only_open)
        .await?;
    Ok(Json(positions))
}

/// # POST /api/accounts/:account_id/positions
pub async fn post_position(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    WithRejection(Path(account_id), _): ApiPath<AccountId>,
    WithRejection(Json(position), _): ApiJson<PositionUpsert>,
) -> Result<Json<Position>, AppError> {
    if position.broker_position_id.trim().is_empty() {
        return Err(AppError::BadRequest(
            "broker_position_id must not be empty".to_string(),
        ));
    }
    authorize_account(&state, user_id, account_id, AccessLevel::Edit).await?;

    let stored = state.db_repo.upsert_position(account_id, &position).await?;
    tracing::info!(
        account_id,
        broker_position_id = %stored.broker_position_id,
        open = stored.is_open(),
        "Position recorded."
    );
    Ok(Json(stored))
}
