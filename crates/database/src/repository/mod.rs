use crate::DbError;
use sqlx::postgres::PgPool;

mod accounts;
mod positions;
mod strategies;
mod transactions;
mod values;

pub use accounts::{AccountChanges, AccountSummary, NewAccount};
pub use positions::PositionUpsert;
pub use transactions::{NewTransaction, StoredTransaction};

/// The `DbRepository` provides a high-level, application-specific interface
/// to the database. It encapsulates all SQL queries and data access logic.
///
/// Queries are grouped by table in the submodules, each adding an `impl` block.
#[derive(Debug, Clone)]
pub struct DbRepository {
    pool: PgPool,
}

impl DbRepository {
    /// Creates a new `DbRepository` with a shared database connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Cheap round trip used by health checks.
    pub async fn ping(&self) -> Result<(), DbError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Maps an empty result from `fetch_one` to `DbError::NotFound`.
pub(crate) fn not_found(e: sqlx::Error) -> DbError {
    if let sqlx::Error::RowNotFound = e {
        DbError::NotFound
    } else {
        e.into()
    }
}
