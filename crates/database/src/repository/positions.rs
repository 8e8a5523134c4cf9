use super::DbRepository;
use crate::DbError;
use chrono::NaiveDateTime;
use core_types::{AccountId, Position};
use rust_decimal::Decimal;
use serde::Deserialize;

const POSITION_COLUMNS: &str = "id, account_id, broker_position_id, broker_instrument_identifier, \
     instrument_name, status, expiry_date, size, entry_datetime, entry_price, stop_loss_price, \
     take_profit_price, exit_datetime, exit_price, profit";

/// A position as reported by the bot trading the account. Every post carries
/// the full state; the stored row is overwritten with it.
#[derive(Debug, Clone, Deserialize)]
pub struct PositionUpsert {
    pub broker_position_id: String,
    pub broker_instrument_identifier: String,
    pub instrument_name: String,
    pub status: String,
    pub expiry_date: Option<NaiveDateTime>,
    pub size: Decimal,
    pub entry_datetime: NaiveDateTime,
    pub entry_price: Decimal,
    pub stop_loss_price: Decimal,
    pub take_profit_price: Decimal,
    pub exit_datetime: Option<NaiveDateTime>,
    pub exit_price: Option<Decimal>,
    pub profit: Option<Decimal>,
}

impl DbRepository {
    /// Lists the account's positions; `only_open` restricts to positions without an exit.
    pub async fn get_positions_for_account(
        &self,
        account_id: AccountId,
        only_open: bool,
    ) -> Result<Vec<Position>, DbError> {
        let positions = sqlx::query_as::<_, Position>(&format!(
            r#"
            SELECT {POSITION_COLUMNS}
            FROM positions
            WHERE account_id = $1
              AND (NOT $2 OR exit_datetime IS NULL)
            ORDER BY entry_datetime DESC NULLS LAST, id DESC
            "#
        ))
        .bind(account_id)
        .bind(only_open)
        .fetch_all(&self.pool)
        .await?;
        Ok(positions)
    }

    /// Inserts or overwrites the position keyed by `(account, broker_position_id)`,
    /// and stamps the account's `last_trade_update`.
    pub async fn upsert_position(
        &self,
        account_id: AccountId,
        position: &PositionUpsert,
    ) -> Result<Position, DbError> {
        let mut tx = self.pool.begin().await?;

        let stored = sqlx::query_as::<_, Position>(&format!(
            r#"
            INSERT INTO positions (
                account_id, broker_position_id, broker_instrument_identifier, instrument_name,
                status, expiry_date, size, entry_datetime, entry_price, stop_loss_price,
                take_profit_price, exit_datetime, exit_price, profit
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            ON CONFLICT (account_id, broker_position_id) DO UPDATE SET
                broker_instrument_identifier = EXCLUDED.broker_instrument_identifier,
                instrument_name = EXCLUDED.instrument_name,
                status = EXCLUDED.status,
                expiry_date = EXCLUDED.expiry_date,
                size = EXCLUDED.size,
                entry_datetime = EXCLUDED.entry_datetime,
                entry_price = EXCLUDED.entry_price,
                stop_loss_price = EXCLUDED.stop_loss_price,
                take_profit_price = EXCLUDED.take_profit_price,
                exit_datetime = EXCLUDED.exit_datetime,
                exit_price = EXCLUDED.exit_price,
                profit = EXCLUDED.profit
            RETURNING {POSITION_COLUMNS}
            "#
        ))
        .bind(account_id)
        .bind(&position.broker_position_id)
        .bind(&position.broker_instrument_identifier)
        .bind(&position.instrument_name)
        .bind(&position.status)
        .bind(position.expiry_date)
        .bind(position.size)
        .bind(position.entry_datetime)
        .bind(position.entry_price)
        .bind(position.stop_loss_price)
        .bind(position.take_profit_price)
        .bind(position.exit_datetime)
        .bind(position.exit_price)
        .bind(position.profit)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE accounts SET last_trade_update = NOW() WHERE id = $1")
            .bind(account_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(stored)
    }
}
