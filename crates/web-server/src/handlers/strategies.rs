use super::{strategy_link, ApiJson, ApiPath, ApiQuery, DateRange};
use crate::{error::AppError, identity::CurrentUser, AppState};
use analytics::PerformancePoint;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::WithRejection;
use chrono::Utc;
use core_types::{Strategy, StrategyId};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct NewStrategy {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct StrategyChanges {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// # GET /api/strategies
pub async fn list_strategies(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Json<Vec<Strategy>>, AppError> {
    let strategies = state.db_repo.get_strategies_for_user(user_id).await?;
    Ok(Json(strategies))
}

/// # POST /api/strategies
/// The strategy starts today (UTC) and is owned by the caller.
pub async fn create_strategy(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    WithRejection(Json(request), _): ApiJson<NewStrategy>,
) -> Result<(StatusCode, Json<Strategy>), AppError> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("name must not be empty".to_string()));
    }

    let start_date = Utc::now().date_naive();
    let strategy = state
        .db_repo
        .create_strategy(user_id, name, request.description.trim(), start_date)
        .await?;
    Ok((StatusCode::CREATED, Json(strategy)))
}

/// # PUT /api/strategies/:strategy_id
/// Only admins and owners of the strategy may change it.
pub async fn update_strategy(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    WithRejection(Path(strategy_id), _): ApiPath<StrategyId>,
    WithRejection(Json(changes), _): ApiJson<StrategyChanges>,
) -> Result<Json<Strategy>, AppError> {
    let name = changes.name.as_deref().map(str::trim);
    if name.is_some_and(str::is_empty) {
        return Err(AppError::BadRequest("name must not be empty".to_string()));
    }

    let link = strategy_link(&state, user_id, strategy_id).await?;
    if !link.can_edit() {
        return Err(AppError::Forbidden(format!(
            "no edit rights on strategy {strategy_id}"
        )));
    }

    let strategy = state
        .db_repo
        .update_strategy(strategy_id, name, changes.description.as_deref())
        .await?;
    tracing::info!(strategy_id, user_id, "Strategy updated.");
    Ok(Json(strategy))
}

/// # GET /api/strategies/:strategy_id/performance
/// Combined performance of the caller's linked accounts while they executed the strategy.
pub async fn strategy_performance(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    WithRejection(Path(strategy_id), _): ApiPath<StrategyId>,
    WithRejection(Query(range), _): ApiQuery<DateRange>,
) -> Result<Json<Vec<PerformancePoint>>, AppError> {
    range.validate()?;
    strategy_link(&state, user_id, strategy_id).await?;

    let values = state
        .db_repo
        .get_account_values_for_strategy(
            strategy_id,
            Some(user_id),
            range.start_date,
            range.end_date,
        )
        .await?;
    let series = state.engine.compute_performance(&values, &state.db_repo).await?;
    Ok(Json(PerformancePoint::from_series(&series)))
}
