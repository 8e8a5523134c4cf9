use super::{not_found, DbRepository};
use crate::DbError;
use chrono::NaiveDateTime;
use core_types::{Account, AccountId, AccountLink, StrategyId, UserId};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

const ACCOUNT_COLUMNS: &str = "id, broker_account_id, name, currency, timezone, executing_strategy_id, \
     is_active, last_trade_update, last_transaction_update";

/// An account as listed to a user, joined with the name of the strategy it runs.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct AccountSummary {
    pub id: AccountId,
    pub broker_account_id: String,
    pub name: Option<String>,
    pub currency: Option<String>,
    pub timezone: Option<String>,
    pub executing_strategy_id: Option<StrategyId>,
    pub executing_strategy_name: Option<String>,
    pub is_active: bool,
    pub last_trade_update: Option<NaiveDateTime>,
    pub last_transaction_update: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewAccount {
    pub account_name: String,
    pub broker_account_id: String,
    pub currency: String,
    pub timezone: Option<String>,
    pub executing_strategy_id: Option<StrategyId>,
}

/// Fields left as `None` keep their stored value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccountChanges {
    pub account_name: Option<String>,
    pub executing_strategy_id: Option<StrategyId>,
    pub is_active: Option<bool>,
}

impl DbRepository {
    /// Fetches every account the user holds an active link to.
    pub async fn get_accounts_for_user(&self, user_id: UserId) -> Result<Vec<AccountSummary>, DbError> {
        let accounts = sqlx::query_as::<_, AccountSummary>(
            r#"
            SELECT
                a.id, a.broker_account_id, a.name, a.currency, a.timezone,
                a.executing_strategy_id, s.name AS executing_strategy_name,
                a.is_active, a.last_trade_update, a.last_transaction_update
            FROM
                accounts AS a
            JOIN
                user_account_links AS l ON l.account_id = a.id
            LEFT JOIN
                strategies AS s ON s.id = a.executing_strategy_id
            WHERE
                l.user_id = $1 AND l.is_active
            ORDER BY
                a.id ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(accounts)
    }

    /// Fetches a single account summary by id.
    pub async fn get_account_summary(&self, account_id: AccountId) -> Result<AccountSummary, DbError> {
        sqlx::query_as::<_, AccountSummary>(
            r#"
            SELECT
                a.id, a.broker_account_id, a.name, a.currency, a.timezone,
                a.executing_strategy_id, s.name AS executing_strategy_name,
                a.is_active, a.last_trade_update, a.last_transaction_update
            FROM accounts AS a
            LEFT JOIN strategies AS s ON s.id = a.executing_strategy_id
            WHERE a.id = $1
            "#,
        )
        .bind(account_id)
        .fetch_one(&self.pool)
        .await
        .map_err(not_found)
    }

    pub async fn get_account(&self, account_id: AccountId) -> Result<Account, DbError> {
        sqlx::query_as::<_, Account>(&format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = $1"))
            .bind(account_id)
            .fetch_one(&self.pool)
            .await
            .map_err(not_found)
    }

    /// Returns the user's link to the account, if any.
    pub async fn get_account_link(
        &self,
        user_id: UserId,
        account_id: AccountId,
    ) -> Result<Option<AccountLink>, DbError> {
        let link = sqlx::query_as::<_, AccountLink>(
            r#"
            SELECT user_id, account_id, is_active, is_admin, is_owner, is_read_only, is_read_write
            FROM user_account_links
            WHERE user_id = $1 AND account_id = $2
            "#,
        )
        .bind(user_id)
        .bind(account_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(link)
    }

    /// Creates the account and makes `owner` its owner, atomically.
    pub async fn create_account(&self, owner: UserId, account: &NewAccount) -> Result<Account, DbError> {
        let mut tx = self.pool.begin().await?;

        let created = sqlx::query_as::<_, Account>(&format!(
            r#"
            INSERT INTO accounts (broker_account_id, name, currency, timezone, executing_strategy_id, is_active)
            VALUES ($1, $2, $3, $4, $5, TRUE)
            RETURNING {ACCOUNT_COLUMNS}
            "#
        ))
        .bind(&account.broker_account_id)
        .bind(&account.account_name)
        .bind(&account.currency)
        .bind(account.timezone.as_deref().unwrap_or("UTC"))
        .bind(account.executing_strategy_id)
        .fetch_one(&mut *tx) // Note: must use the transaction object `tx` here
        .await?;

        sqlx::query(
            "INSERT INTO user_account_links (user_id, account_id, is_active, is_owner) VALUES ($1, $2, TRUE, TRUE)",
        )
        .bind(owner)
        .bind(created.id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::info!(account_id = created.id, user_id = owner, "Account created.");
        Ok(created)
    }

    pub async fn update_account(
        &self,
        account_id: AccountId,
        changes: &AccountChanges,
    ) -> Result<Account, DbError> {
        sqlx::query_as::<_, Account>(&format!(
            r#"
            UPDATE accounts SET
                name = COALESCE($2, name),
                executing_strategy_id = COALESCE($3, executing_strategy_id),
                is_active = COALESCE($4, is_active)
            WHERE id = $1
            RETURNING {ACCOUNT_COLUMNS}
            "#
        ))
        .bind(account_id)
        .bind(changes.account_name.as_deref())
        .bind(changes.executing_strategy_id)
        .bind(changes.is_active)
        .fetch_one(&self.pool)
        .await
        .map_err(not_found)
    }
}
