pub mod enums;
pub mod error;
pub mod structs;

// Re-export the core types to provide a clean public API.
pub use enums::AccessLevel;
pub use error::{require, CoreError};
pub use structs::{
    Account, AccountId, AccountLink, DailyAggregate, Position, Strategy, StrategyId, StrategyLink,
    TransactionRecord, UserId, ValuationRecord,
};
