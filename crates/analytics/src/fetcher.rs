use crate::error::AnalyticsError;
use async_trait::async_trait;
use chrono::NaiveDate;
use core_types::{AccountId, TransactionRecord};

/// The storage capability the performance engine consumes.
///
/// Implementations return every persisted transaction of `account_ids` whose
/// datetime falls on a calendar day within `[start_date, end_date]`, both ends
/// inclusive. The engine applies its own qualification filter, so unfiltered
/// rows are expected. Implementations must be safe to share between requests.
#[async_trait]
pub trait TransactionFetcher: Send + Sync {
    async fn fetch_transactions(
        &self,
        account_ids: &[AccountId],
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<TransactionRecord>, AnalyticsError>;
}

/// A fetcher over transactions already held in memory. Used by callers that
/// loaded the rows themselves, and by tests.
#[async_trait]
impl TransactionFetcher for [TransactionRecord] {
    async fn fetch_transactions(
        &self,
        account_ids: &[AccountId],
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<TransactionRecord>, AnalyticsError> {
        Ok(self
            .iter()
            .filter(|t| account_ids.contains(&t.account_id))
            .filter(|t| (start_date..=end_date).contains(&t.transaction_date()))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl TransactionFetcher for Vec<TransactionRecord> {
    async fn fetch_transactions(
        &self,
        account_ids: &[AccountId],
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<TransactionRecord>, AnalyticsError> {
        self.as_slice()
            .fetch_transactions(account_ids, start_date, end_date)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn at(y: i32, m: u32, d: u32, h: u32) -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(h, 0, 0).unwrap()
    }

    fn tx(account_id: AccountId, when: chrono::NaiveDateTime) -> TransactionRecord {
        TransactionRecord {
            account_id,
            transaction_datetime: when,
            value: dec!(1),
            internal: false,
            shared: false,
            include_in_performance: true,
        }
    }

    #[tokio::test]
    async fn in_memory_fetch_includes_the_whole_end_day() {
        let rows = vec![
            tx(1, at(2024, 1, 1, 0)),
            tx(1, at(2024, 1, 3, 23)),
            tx(1, at(2024, 1, 4, 0)),
            tx(2, at(2024, 1, 2, 12)),
        ];
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();

        let fetched = rows.fetch_transactions(&[1], start, end).await.unwrap();

        assert_eq!(fetched.len(), 2);
        assert!(fetched.iter().all(|t| t.account_id == 1));
        assert_eq!(fetched[1].transaction_datetime, at(2024, 1, 3, 23));
    }
}
