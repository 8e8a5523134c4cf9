//! # Brokerwatch Database Crate
//!
//! This crate acts as a high-level, application-specific interface to the
//! PostgreSQL database holding accounts, strategies, valuations, transactions
//! and positions.
//!
//! ## Architectural Principles
//!
//! - **Layer 3 Adapter:** This crate is an adapter that encapsulates all database-specific
//!   logic. It provides a clean, abstract API to the rest of the application, hiding
//!   the underlying SQL and database implementation details.
//! - **Typed Boundary:** Nullable columns are read into row structs and converted into
//!   the strict `core-types` records; a row missing a required field is rejected with
//!   `DbError::MalformedRow` instead of being coerced.
//! - **Asynchronous & Pooled:** All operations are asynchronous, and it uses a
//!   connection pool (`PgPool`) for concurrent database access.
//!
//! ## Public API
//!
//! - `connect`: The async function to establish the database connection pool.
//! - `run_migrations`: A utility to apply database migrations, ensuring the schema is up-to-date.
//! - `DbRepository`: The main struct that holds the connection pool and provides all
//!   the high-level data access methods. It also implements `analytics::TransactionFetcher`.
//! - `DbError`: The specific error types that can be returned from this crate.

// Declare the modules that constitute this crate.
pub mod connection;
pub mod error;
pub mod repository;

// Re-export the key components to create a clean, public-facing API.
pub use connection::{connect, connect_lazy, run_migrations};
pub use error::DbError;
pub use repository::{
    AccountChanges, AccountSummary, DbRepository, NewAccount, NewTransaction, PositionUpsert,
    StoredTransaction,
};
