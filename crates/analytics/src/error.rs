use chrono::NaiveDate;
use core_types::CoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalyticsError {
    #[error("Return is undefined on {date}: capital base (prior value + transactions) is zero")]
    UndefinedReturn { date: NaiveDate },

    #[error("Arithmetic overflow while computing performance on {date}")]
    ArithmeticOverflow { date: NaiveDate },

    #[error(transparent)]
    Record(#[from] CoreError),

    #[error("Failed to fetch transactions: {0}")]
    TransactionFetch(#[source] Box<dyn std::error::Error + Send + Sync>),
}
