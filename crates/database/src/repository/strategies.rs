use super::{not_found, DbRepository};
use crate::DbError;
use chrono::NaiveDate;
use core_types::{Strategy, StrategyId, StrategyLink, UserId};

impl DbRepository {
    /// Fetches the strategies the user holds an active link to.
    pub async fn get_strategies_for_user(&self, user_id: UserId) -> Result<Vec<Strategy>, DbError> {
        let strategies = sqlx::query_as::<_, Strategy>(
            r#"
            SELECT s.id, s.name, s.description, s.start_date
            FROM strategies AS s
            JOIN strategy_user_links AS l ON l.strategy_id = s.id
            WHERE l.user_id = $1 AND l.is_active
            ORDER BY s.id ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(strategies)
    }

    pub async fn get_strategy(&self, strategy_id: StrategyId) -> Result<Strategy, DbError> {
        sqlx::query_as::<_, Strategy>(
            "SELECT id, name, description, start_date FROM strategies WHERE id = $1",
        )
        .bind(strategy_id)
        .fetch_one(&self.pool)
        .await
        .map_err(not_found)
    }

    pub async fn get_strategy_link(
        &self,
        user_id: UserId,
        strategy_id: StrategyId,
    ) -> Result<Option<StrategyLink>, DbError> {
        let link = sqlx::query_as::<_, StrategyLink>(
            r#"
            SELECT user_id, strategy_id, is_active, is_admin, is_owner
            FROM strategy_user_links
            WHERE user_id = $1 AND strategy_id = $2
            "#,
        )
        .bind(user_id)
        .bind(strategy_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(link)
    }

    /// Creates the strategy and makes `owner` its owner, atomically.
    pub async fn create_strategy(
        &self,
        owner: UserId,
        name: &str,
        description: &str,
        start_date: NaiveDate,
    ) -> Result<Strategy, DbError> {
        let mut tx = self.pool.begin().await?;

        let created = sqlx::query_as::<_, Strategy>(
            r#"
            INSERT INTO strategies (name, description, start_date)
            VALUES ($1, $2, $3)
            RETURNING id, name, description, start_date
            "#,
        )
        .bind(name)
        .bind(description)
        .bind(start_date)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO strategy_user_links (user_id, strategy_id, is_active, is_owner) VALUES ($1, $2, TRUE, TRUE)",
        )
        .bind(owner)
        .bind(created.id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::info!(strategy_id = created.id, user_id = owner, "Strategy created.");
        Ok(created)
    }

    /// Updates name and/or description; `None` keeps the stored value.
    pub async fn update_strategy(
        &self,
        strategy_id: StrategyId,
        name: Option<&str>,
        description: Option<&str>,
    ) -> Result<Strategy, DbError> {
        sqlx::query_as::<_, Strategy>(
            r#"
            UPDATE strategies SET
                name = COALESCE($2, name),
                description = COALESCE($3, description)
            WHERE id = $1
            RETURNING id, name, description, start_date
            "#,
        )
        .bind(strategy_id)
        .bind(name)
        .bind(description)
        .fetch_one(&self.pool)
        .await
        .map_err(not_found)
    }
}
