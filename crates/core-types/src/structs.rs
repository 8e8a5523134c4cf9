use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub type AccountId = i32;
pub type StrategyId = i32;
pub type UserId = i32;

/// One snapshot of an account's worth on a calendar date.
///
/// Several records may share a date (multiple accounts in a group, or several
/// strategies that ran on the same account that day). The performance engine
/// sums them per date before computing returns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValuationRecord {
    pub account_id: AccountId,
    pub value_date: NaiveDate,
    pub value: Decimal,
    pub strategy_id: Option<StrategyId>,
}

/// A cash flow booked against an account (deposit, withdrawal, transfer).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub account_id: AccountId,
    pub transaction_datetime: NaiveDateTime,
    pub value: Decimal,
    /// Movement between accounts of the same fund.
    pub internal: bool,
    /// Flow shared between several investors.
    pub shared: bool,
    /// Investor-driven flow that must be removed from the organic return.
    pub include_in_performance: bool,
}

impl TransactionRecord {
    /// A transaction adjusts the daily return only when it is an investor flow:
    /// not internal, not shared, and explicitly included.
    pub fn counts_toward_performance(&self) -> bool {
        !self.internal && !self.shared && self.include_in_performance
    }

    pub fn transaction_date(&self) -> NaiveDate {
        self.transaction_datetime.date()
    }
}

/// One row of a computed performance series. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyAggregate {
    pub value_date: NaiveDate,
    /// Sum of every valuation recorded on `value_date`.
    pub value: Decimal,
    /// The previous date's `value`; equal to `value` on the first date.
    pub prior_value: Decimal,
    /// Net qualifying cash flow on `value_date`, zero when there is none.
    pub transaction_value: Decimal,
    pub day_performance: Decimal,
    /// Cumulative product of `day_performance` from the first date.
    pub range_performance: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    /// The identifier the broker uses for this account.
    pub broker_account_id: String,
    pub name: Option<String>,
    pub currency: Option<String>,
    /// IANA timezone name; "today" for a posted value is taken in this zone.
    pub timezone: Option<String>,
    pub executing_strategy_id: Option<StrategyId>,
    pub is_active: bool,
    pub last_trade_update: Option<NaiveDateTime>,
    pub last_transaction_update: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Strategy {
    pub id: StrategyId,
    pub name: String,
    pub description: Option<String>,
    pub start_date: Option<NaiveDate>,
}

/// The rights a user holds on one account.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct AccountLink {
    pub user_id: UserId,
    pub account_id: AccountId,
    pub is_active: bool,
    pub is_admin: bool,
    pub is_owner: bool,
    pub is_read_only: bool,
    pub is_read_write: bool,
}

impl AccountLink {
    pub fn can_read(&self) -> bool {
        self.is_active
    }

    pub fn can_edit(&self) -> bool {
        self.is_active && (self.is_admin || self.is_owner || self.is_read_write)
    }
}

/// The rights a user holds on one strategy.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct StrategyLink {
    pub user_id: UserId,
    pub strategy_id: StrategyId,
    pub is_active: bool,
    pub is_admin: bool,
    pub is_owner: bool,
}

impl StrategyLink {
    pub fn can_use(&self) -> bool {
        self.is_active
    }

    pub fn can_edit(&self) -> bool {
        self.is_active && (self.is_admin || self.is_owner)
    }
}

/// A broker position as reported by the trading bot running on an account.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Position {
    pub id: i32,
    pub account_id: AccountId,
    pub broker_position_id: String,
    pub broker_instrument_identifier: Option<String>,
    pub instrument_name: Option<String>,
    pub status: Option<String>,
    pub expiry_date: Option<NaiveDateTime>,
    pub size: Option<Decimal>,
    pub entry_datetime: Option<NaiveDateTime>,
    pub entry_price: Option<Decimal>,
    pub stop_loss_price: Option<Decimal>,
    pub take_profit_price: Option<Decimal>,
    pub exit_datetime: Option<NaiveDateTime>,
    pub exit_price: Option<Decimal>,
    pub profit: Option<Decimal>,
}

impl Position {
    pub fn is_open(&self) -> bool {
        self.exit_datetime.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn transaction(internal: bool, shared: bool, include: bool) -> TransactionRecord {
        TransactionRecord {
            account_id: 1,
            transaction_datetime: NaiveDate::from_ymd_opt(2024, 1, 2)
                .unwrap()
                .and_hms_opt(15, 30, 0)
                .unwrap(),
            value: dec!(10),
            internal,
            shared,
            include_in_performance: include,
        }
    }

    #[test]
    fn only_included_external_flows_count() {
        assert!(transaction(false, false, true).counts_toward_performance());
        assert!(!transaction(true, false, true).counts_toward_performance());
        assert!(!transaction(false, true, true).counts_toward_performance());
        assert!(!transaction(false, false, false).counts_toward_performance());
        assert!(!transaction(true, true, false).counts_toward_performance());
    }

    #[test]
    fn transaction_date_drops_the_time_of_day() {
        assert_eq!(
            transaction(false, false, true).transaction_date(),
            NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()
        );
    }

    #[test]
    fn account_edit_rights_require_an_active_privileged_link() {
        let mut link = AccountLink {
            user_id: 7,
            account_id: 3,
            is_active: true,
            is_admin: false,
            is_owner: false,
            is_read_only: true,
            is_read_write: false,
        };
        assert!(link.can_read());
        assert!(!link.can_edit());

        link.is_read_write = true;
        assert!(link.can_edit());

        link.is_active = false;
        assert!(!link.can_read());
        assert!(!link.can_edit());
    }

    #[test]
    fn strategy_edit_rights_require_admin_or_owner() {
        let link = StrategyLink {
            user_id: 7,
            strategy_id: 2,
            is_active: true,
            is_admin: false,
            is_owner: false,
        };
        assert!(link.can_use());
        assert!(!link.can_edit());
        assert!(StrategyLink { is_owner: true, ..link }.can_edit());
    }
}
