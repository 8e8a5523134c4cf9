use super::{authorize_account, strategy_link, ApiJson, ApiPath};
use crate::{error::AppError, identity::CurrentUser, AppState};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::WithRejection;
use chrono_tz::Tz;
use core_types::{AccessLevel, AccountId};
use database::{AccountChanges, AccountSummary, NewAccount};
use std::sync::Arc;

/// Normalizes an ISO 4217 code: three ASCII letters, stored upper case.
pub fn validate_currency(currency: &str) -> Result<String, AppError> {
    let trimmed = currency.trim();
    if trimmed.len() == 3 && trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
        Ok(trimmed.to_ascii_uppercase())
    } else {
        Err(AppError::BadRequest(format!(
            "currency must be a three-letter code, got {currency:?}"
        )))
    }
}

/// Checks an IANA timezone name; no timezone means UTC.
pub fn validate_timezone(timezone: Option<&str>) -> Result<String, AppError> {
    match timezone.map(str::trim).filter(|tz| !tz.is_empty()) {
        None => Ok("UTC".to_string()),
        Some(name) => name
            .parse::<Tz>()
            .map(|tz| tz.name().to_string())
            .map_err(|_| AppError::BadRequest(format!("unknown timezone {name:?}"))),
    }
}

fn validate_name(name: &str) -> Result<String, AppError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(AppError::BadRequest("account_name must not be empty".to_string()));
    }
    Ok(trimmed.to_string())
}

/// # GET /api/accounts
pub async fn list_accounts(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Json<Vec<AccountSummary>>, AppError> {
    let accounts = state.db_repo.get_accounts_for_user(user_id).await?;
    Ok(Json(accounts))
}

/// # POST /api/accounts
/// Creates the account with the caller as its owner.
pub async fn create_account(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    WithRejection(Json(request), _): ApiJson<NewAccount>,
) -> Result<(StatusCode, Json<AccountSummary>), AppError> {
    let broker_account_id = request.broker_account_id.trim();
    if broker_account_id.is_empty() {
        return Err(AppError::BadRequest(
            "broker_account_id must not be empty".to_string(),
        ));
    }
    let account = NewAccount {
        account_name: validate_name(&request.account_name)?,
        broker_account_id: broker_account_id.to_string(),
        currency: validate_currency(&request.currency)?,
        timezone: Some(validate_timezone(request.timezone.as_deref())?),
        executing_strategy_id: request.executing_strategy_id,
    };

    if let Some(strategy_id) = account.executing_strategy_id {
        strategy_link(&state, user_id, strategy_id).await?;
    }

    let created = state.db_repo.create_account(user_id, &account).await?;
    let summary = state.db_repo.get_account_summary(created.id).await?;
    Ok((StatusCode::CREATED, Json(summary)))
}

/// # PUT /api/accounts/:account_id
pub async fn update_account(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    WithRejection(Path(account_id), _): ApiPath<AccountId>,
    WithRejection(Json(changes), _): ApiJson<AccountChanges>,
) -> Result<Json<AccountSummary>, AppError> {
    let changes = AccountChanges {
        account_name: changes.account_name.as_deref().map(validate_name).transpose()?,
        ..changes
    };

    authorize_account(&state, user_id, account_id, AccessLevel::Edit).await?;
    if let Some(strategy_id) = changes.executing_strategy_id {
        strategy_link(&state, user_id, strategy_id).await?;
    }

    state.db_repo.update_account(account_id, &changes).await?;
    tracing::info!(account_id, user_id, "Account updated.");
    let summary = state.db_repo.get_account_summary(account_id).await?;
    Ok(Json(summary))
}
